//! Node identifier assignment.
//!
//! Makefile names can contain characters Mermaid treats as syntax (`@`, `$`,
//! `%`, `/`, quotes), so each name is drawn under a generated identifier of the
//! form `node_<n>` with the raw name as its label.
//!
//! [`NodeRegistry`] hands out identifiers in first-seen order. Raw names are
//! only ever keys and identifiers only ever come from the registry's counter,
//! so a Makefile target literally called `node_0` cannot collide with a
//! generated identifier.
//!
//! ```rust
//! use monocle::registry::NodeRegistry;
//!
//! let mut registry = NodeRegistry::new();
//! assert_eq!(registry.register("@").as_str(), "node_0");
//! assert_eq!(registry.register("node_0").as_str(), "node_1");
//! assert_eq!(registry.register("@").as_str(), "node_0");
//! ```

use indexmap::IndexMap;
use std::fmt;

const NODE_ID_PREFIX: &str = "node_";

/// A render-safe Mermaid node identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(String);

impl NodeId {
    fn from_index(index: usize) -> Self {
        Self(format!("{NODE_ID_PREFIX}{index}"))
    }

    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Append-only mapping from raw Makefile names to node identifiers.
///
/// A registry lives for one diagram generation and is never shared between
/// runs.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    ids: IndexMap<String, NodeId>,
    next_index: usize,
}

impl NodeRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the identifier for `raw`, assigning one on first sight.
    ///
    /// New names receive the lowest `node_<n>` not already held by another
    /// name. Identifiers are never released and only this counter produces
    /// them, so that is always `node_<next_index>`. Registering the same name
    /// again returns the same identifier and leaves the registry unchanged.
    pub fn register(&mut self, raw: &str) -> NodeId {
        if let Some(id) = self.ids.get(raw) {
            return id.clone();
        }
        let id = NodeId::from_index(self.next_index);
        self.next_index += 1;
        self.ids.insert(raw.to_owned(), id.clone());
        id
    }

    /// Number of registered names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no names have been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Iterate over `(raw name, identifier)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &NodeId)> {
        self.ids.iter().map(|(raw, id)| (raw.as_str(), id))
    }
}
