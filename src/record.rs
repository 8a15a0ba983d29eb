//! Tokenized Makefile records.
//!
//! The tokenizer turns Makefile text into an ordered list of [`Record`]
//! values. Inside the crate a record is a tagged enum; at the JSON boundary it
//! keeps the untagged shape used by Makefile tokenizers, where a rule carries
//! a `target` field and an assignment carries a `variable` field.
//!
//! ```rust
//! use monocle::record::Record;
//!
//! let json = r#"[{"target": "all", "deps": ["app"]}, {"variable": "CC", "value": "cc"}]"#;
//! let records: Vec<Record> = serde_json::from_str(json).expect("parse records");
//! assert!(records[0].as_target().is_some());
//! assert!(records[1].as_target().is_none());
//! ```

use serde::{Deserialize, Serialize};

/// A single entry produced by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Record {
    /// A build rule naming one output and its prerequisites.
    Target(TargetRecord),
    /// A variable assignment. Never diagrammed.
    Variable(VariableRecord),
}

impl Record {
    /// Borrow the rule when this record is a target.
    #[must_use]
    pub const fn as_target(&self) -> Option<&TargetRecord> {
        match self {
            Self::Target(target) => Some(target),
            Self::Variable(_) => None,
        }
    }

    /// Consume the record, returning the rule when this record is a target.
    #[must_use]
    pub fn into_target(self) -> Option<TargetRecord> {
        match self {
            Self::Target(target) => Some(target),
            Self::Variable(_) => None,
        }
    }
}

/// A rule such as `app: main.o util.o`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRecord {
    /// Target name exactly as written in the Makefile.
    #[serde(rename = "target")]
    pub name: String,
    /// Prerequisites in source order. Duplicates are preserved.
    #[serde(default)]
    pub deps: Vec<String>,
    /// Recipe lines attached to the rule.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipe: Vec<String>,
    /// Comment lines that preceded the rule.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comment: Vec<String>,
}

impl TargetRecord {
    /// Create a rule with the given name and prerequisites.
    ///
    /// ```rust
    /// use monocle::record::TargetRecord;
    ///
    /// let rule = TargetRecord::new("app", ["main.o", "util.o"]);
    /// assert_eq!(rule.deps, ["main.o", "util.o"]);
    /// ```
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            deps: deps.into_iter().map(Into::into).collect(),
            recipe: Vec::new(),
            comment: Vec::new(),
        }
    }
}

/// An assignment such as `CC := gcc`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableRecord {
    /// Variable name.
    #[serde(rename = "variable")]
    pub name: String,
    /// Unexpanded right-hand side.
    #[serde(default)]
    pub value: String,
    /// Comment lines that preceded the assignment.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comment: Vec<String>,
}

/// Complete tokenizer output for one Makefile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tokenized {
    /// Records in the order they appear in the source.
    pub records: Vec<Record>,
    /// Names listed as prerequisites of `.PHONY`.
    #[serde(rename = "PHONY", default)]
    pub phony: Vec<String>,
    /// Lines the tokenizer could not classify.
    #[serde(default)]
    pub unhandled: Vec<String>,
}
