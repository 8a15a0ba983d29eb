//! Mermaid diagram generator.
//!
//! This module converts tokenized Makefile records into a Mermaid flowchart.
//! Each diagrammable target gets one declaration line styled with the
//! `target` class, followed by one edge per prerequisite:
//!
//! ```text
//! %% Mermaid diagram
//! graph LR
//!   node_0["app"]:::target
//!     node_0["app"] --> node_1["main.o"]
//! ```
//!
//! Names that only ever appear as prerequisites are not declared; they show
//! up as edge endpoints. Output is deterministic for a given input and
//! direction.

use crate::record::Record;
use crate::registry::{NodeId, NodeRegistry};
use crate::sanitize::sanitize_records;
use crate::tokenizer::{MakefileTokenizer, Tokenize, TokenizeError};
use clap::ValueEnum;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use tracing::debug;

/// First line of every non-empty diagram.
pub const DIAGRAM_HEADER: &str = "%% Mermaid diagram";

/// Layout direction of the generated flowchart.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum,
)]
pub enum Direction {
    /// Left to right (`graph LR`).
    #[default]
    #[serde(rename = "LR", alias = "lr")]
    #[value(name = "LR", alias = "lr")]
    LeftRight,
    /// Top to bottom (`graph TB`).
    #[serde(rename = "TB", alias = "tb")]
    #[value(name = "TB", alias = "tb")]
    TopBottom,
}

impl Direction {
    /// Mermaid keyword for the direction.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LeftRight => "LR",
            Self::TopBottom => "TB",
        }
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown [`Direction`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown graph direction '{0}' (expected LR or TB)")]
pub struct ParseDirectionError(String);

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LR" => Ok(Self::LeftRight),
            "TB" => Ok(Self::TopBottom),
            _ => Err(ParseDirectionError(s.to_owned())),
        }
    }
}

/// Generate Mermaid code for `makefile` using the default tokenizer.
///
/// # Errors
///
/// Returns the tokenizer's error unchanged when the text cannot be tokenized.
///
/// # Examples
///
/// ```rust
/// use monocle::mermaid_gen::{Direction, generate};
///
/// let code = generate("app: main.o\n", Direction::LeftRight).expect("generate");
/// assert_eq!(
///     code,
///     "%% Mermaid diagram\ngraph LR\n  node_0[\"app\"]:::target\n    node_0[\"app\"] --> node_1[\"main.o\"]"
/// );
/// assert_eq!(generate("", Direction::LeftRight).expect("generate"), "");
/// ```
pub fn generate(makefile: &str, direction: Direction) -> Result<String, TokenizeError> {
    generate_with(&MakefileTokenizer::default(), makefile, direction)
}

/// Generate Mermaid code for `makefile` using `tokenizer`.
///
/// # Errors
///
/// Returns the tokenizer's error unchanged when the text cannot be tokenized.
pub fn generate_with<T>(
    tokenizer: &T,
    makefile: &str,
    direction: Direction,
) -> Result<String, TokenizeError>
where
    T: Tokenize + ?Sized,
{
    let tokenized = tokenizer.tokenize(makefile)?;
    Ok(generate_from_records(tokenized.records, direction))
}

/// Generate Mermaid code from already tokenized records.
///
/// Variables are ignored, prerequisites are sanitised, and targets whose name
/// starts with `#` or `.` are skipped. Returns an empty string when no target
/// qualifies.
#[must_use]
pub fn generate_from_records(records: Vec<Record>, direction: Direction) -> String {
    let targets = sanitize_records(records)
        .into_iter()
        .filter_map(Record::into_target)
        .filter(|target| is_diagrammable(&target.name));

    let mut registry = NodeRegistry::new();
    let mut lines = Vec::new();
    for target in targets {
        let id = registry.register(&target.name);
        let source = Node::new(&id, &target.name);
        lines.push(format!("  {source}:::target"));
        for dep in &target.deps {
            let dep_id = registry.register(dep);
            lines.push(format!("    {source} --> {}", Node::new(&dep_id, dep)));
        }
    }

    if lines.is_empty() {
        debug!("no diagrammable targets");
        return String::new();
    }
    debug!(nodes = registry.len(), lines = lines.len(), "generated Mermaid code");
    let header = [DIAGRAM_HEADER.to_owned(), format!("graph {direction}")];
    header.into_iter().chain(lines).join("\n")
}

/// Whether a target name should be drawn. Names starting with `#` are comment
/// debris and names starting with `.` are special targets such as `.PHONY`.
fn is_diagrammable(name: &str) -> bool {
    !name.starts_with(['#', '.'])
}

/// Wrapper struct to display a node reference with its label.
struct Node<'a> {
    id: &'a NodeId,
    label: &'a str,
}

impl<'a> Node<'a> {
    const fn new(id: &'a NodeId, label: &'a str) -> Self {
        Self { id, label }
    }
}

impl Display for Node<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}[\"{}\"]", self.id, self.label)
    }
}
