//! Makefile tokenizer.
//!
//! Splits Makefile text into [`Record`] values: rules become
//! [`TargetRecord`]s and assignments become [`VariableRecord`]s. The
//! tokenizer is deliberately shallow. It joins continuation lines, tracks
//! comments and recipe lines, and records `.PHONY` names, but it neither
//! expands variables nor validates prerequisites.
//!
//! Inline comments on rule lines are not stripped: `b: c # note` yields the
//! prerequisites `c`, `#` and `note`. [`crate::sanitize`] removes that tail
//! before diagramming.
//!
//! A line is split at its first `:` or `=` outside `$(...)` and `${...}`, so
//! `$(OBJ:.c=.o): hdr.h` is a rule for the target `$(OBJ:.c=.o)`.
//!
//! ```rust
//! use monocle::tokenizer::{MakefileTokenizer, Tokenize};
//!
//! let tokenized = MakefileTokenizer::default()
//!     .tokenize("app: main.o \\\n  util.o\n\tcc -o app main.o util.o\n")
//!     .expect("tokenize");
//! let rule = tokenized.records[0].as_target().expect("rule");
//! assert_eq!(rule.deps, ["main.o", "util.o"]);
//! assert_eq!(rule.recipe, ["cc -o app main.o util.o"]);
//! ```

mod error;

pub use error::TokenizeError;

use crate::record::{Record, TargetRecord, Tokenized, VariableRecord};
use miette::NamedSource;
use std::ops::Range;
use tracing::debug;

/// Name used in diagnostics when the caller does not supply one.
pub const DEFAULT_SOURCE_NAME: &str = "Makefile";

/// Converts Makefile text into an ordered list of records.
pub trait Tokenize {
    /// Tokenize `text`.
    ///
    /// # Errors
    ///
    /// Returns a [`TokenizeError`] when the implementation refuses the input.
    fn tokenize(&self, text: &str) -> Result<Tokenized, TokenizeError>;
}

/// Behaviour switches for [`MakefileTokenizer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenizeOptions {
    /// Fail on the first line that cannot be classified instead of
    /// collecting it in [`Tokenized::unhandled`].
    pub strict: bool,
}

/// Line-oriented tokenizer for GNU-style Makefiles.
#[derive(Debug, Clone)]
pub struct MakefileTokenizer {
    options: TokenizeOptions,
    source_name: String,
}

impl Default for MakefileTokenizer {
    fn default() -> Self {
        Self::new(TokenizeOptions::default())
    }
}

impl MakefileTokenizer {
    /// Create a tokenizer with the given options.
    #[must_use]
    pub fn new(options: TokenizeOptions) -> Self {
        Self {
            options,
            source_name: DEFAULT_SOURCE_NAME.to_owned(),
        }
    }

    /// Name the input in diagnostics, typically with its file path or URL.
    #[must_use]
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = name.into();
        self
    }
}

impl Tokenize for MakefileTokenizer {
    fn tokenize(&self, text: &str) -> Result<Tokenized, TokenizeError> {
        let mut state = TokenizerState::default();
        for line in logical_lines(text) {
            match classify(&line.text) {
                LineKind::Blank => state.comment.clear(),
                LineKind::Comment(comment) => state.comment.push(comment.to_owned()),
                LineKind::Recipe(recipe) if state.has_current_rule() => {
                    state.push_recipe(recipe);
                }
                LineKind::Assignment { name, value } => state.push_variable(name, value),
                LineKind::Rule {
                    targets,
                    deps,
                    inline_recipe,
                } => {
                    state.push_rule(&targets, &deps);
                    if let Some(recipe) = inline_recipe {
                        state.push_recipe(recipe);
                    }
                }
                LineKind::Recipe(_) | LineKind::Unhandled => {
                    if self.options.strict {
                        return Err(TokenizeError::UnparsableLine {
                            line: line.number,
                            text: line.text.clone(),
                            src: NamedSource::new(&self.source_name, text.to_owned()),
                            span: line.span.into(),
                        });
                    }
                    state.push_unhandled(line.text.clone());
                }
            }
        }
        let tokenized = state.finish();
        debug!(
            source = %self.source_name,
            records = tokenized.records.len(),
            phony = tokenized.phony.len(),
            unhandled = tokenized.unhandled.len(),
            "tokenized Makefile"
        );
        Ok(tokenized)
    }
}

#[derive(Debug, Default)]
struct TokenizerState {
    tokenized: Tokenized,
    comment: Vec<String>,
    current_rule: Range<usize>,
}

impl TokenizerState {
    fn has_current_rule(&self) -> bool {
        !self.current_rule.is_empty()
    }

    fn push_rule(&mut self, targets: &[&str], deps: &[&str]) {
        let comment = std::mem::take(&mut self.comment);
        let start = self.tokenized.records.len();
        for target in targets {
            if *target == ".PHONY" {
                self.tokenized
                    .phony
                    .extend(deps.iter().map(|dep| (*dep).to_owned()));
                continue;
            }
            self.tokenized.records.push(Record::Target(TargetRecord {
                name: (*target).to_owned(),
                deps: deps.iter().map(|dep| (*dep).to_owned()).collect(),
                recipe: Vec::new(),
                comment: comment.clone(),
            }));
        }
        self.current_rule = start..self.tokenized.records.len();
    }

    fn push_recipe(&mut self, recipe: &str) {
        for index in self.current_rule.clone() {
            if let Some(Record::Target(target)) = self.tokenized.records.get_mut(index) {
                target.recipe.push(recipe.to_owned());
            }
        }
    }

    fn push_variable(&mut self, name: &str, value: &str) {
        self.tokenized.records.push(Record::Variable(VariableRecord {
            name: name.to_owned(),
            value: value.to_owned(),
            comment: std::mem::take(&mut self.comment),
        }));
        self.current_rule = 0..0;
    }

    fn push_unhandled(&mut self, line: String) {
        self.tokenized.unhandled.push(line);
        self.comment.clear();
        self.current_rule = 0..0;
    }

    fn finish(self) -> Tokenized {
        self.tokenized
    }
}

/// A source line after continuation joining.
#[derive(Debug, PartialEq, Eq)]
struct LogicalLine {
    /// 1-based number of the first physical line.
    number: usize,
    /// Byte offset and length of the first physical line.
    span: (usize, usize),
    text: String,
}

fn logical_lines(text: &str) -> Vec<LogicalLine> {
    let mut lines = Vec::new();
    let mut open: Option<LogicalLine> = None;
    let mut offset = 0;
    for (index, raw) in text.split('\n').enumerate() {
        let start = offset;
        offset += raw.len() + 1;
        let physical = raw.strip_suffix('\r').unwrap_or(raw);
        let (body, continued) = physical
            .strip_suffix('\\')
            .map_or((physical, false), |body| (body, true));
        let mut line = match open.take() {
            Some(mut joined) => {
                joined.text.push(' ');
                joined.text.push_str(body.trim_start());
                joined
            }
            None => LogicalLine {
                number: index + 1,
                span: (start, physical.len()),
                text: body.to_owned(),
            },
        };
        if continued {
            let kept = line.text.trim_end().len();
            line.text.truncate(kept);
            open = Some(line);
        } else {
            lines.push(line);
        }
    }
    lines.extend(open);
    lines
}

#[derive(Debug, PartialEq, Eq)]
enum LineKind<'a> {
    Blank,
    Comment(&'a str),
    Recipe(&'a str),
    Assignment {
        name: &'a str,
        value: &'a str,
    },
    Rule {
        targets: Vec<&'a str>,
        deps: Vec<&'a str>,
        inline_recipe: Option<&'a str>,
    },
    Unhandled,
}

fn classify(line: &str) -> LineKind<'_> {
    if line.trim().is_empty() {
        return LineKind::Blank;
    }
    if let Some(recipe) = line.strip_prefix('\t') {
        return LineKind::Recipe(recipe);
    }
    if let Some(comment) = line.trim_start().strip_prefix('#') {
        return LineKind::Comment(comment.strip_prefix(' ').unwrap_or(comment));
    }
    let Some(at) = separator(line) else {
        return LineKind::Unhandled;
    };
    let (head, rest) = line.split_at(at);
    if let Some(value) = rest.strip_prefix('=') {
        let name = head
            .strip_suffix(['?', '+', '!'])
            .unwrap_or(head);
        return assignment(name, value);
    }
    let after_colon = rest.strip_prefix(':').unwrap_or(rest);
    if let Some(value) = after_colon
        .strip_prefix('=')
        .or_else(|| after_colon.strip_prefix(":="))
    {
        return assignment(head, value);
    }
    rule(head, after_colon.strip_prefix(':').unwrap_or(after_colon))
}

/// Byte offset of the first `:` or `=` outside `$(...)` and `${...}`
/// references, so substitution references such as `$(OBJ:.c=.o)` stay whole.
fn separator(line: &str) -> Option<usize> {
    let mut depth = 0_usize;
    let mut prev = None;
    for (at, ch) in line.char_indices() {
        match ch {
            '(' | '{' if depth > 0 || prev == Some('$') => depth += 1,
            ')' | '}' if depth > 0 => depth -= 1,
            ':' | '=' if depth == 0 => return Some(at),
            _ => {}
        }
        prev = Some(ch);
    }
    None
}

fn assignment<'a>(name: &'a str, value: &'a str) -> LineKind<'a> {
    let trimmed = name.trim();
    let variable = ["export ", "override "]
        .iter()
        .find_map(|prefix| trimmed.strip_prefix(prefix))
        .map_or(trimmed, str::trim_start);
    if variable.is_empty() || variable.contains(char::is_whitespace) {
        return LineKind::Unhandled;
    }
    LineKind::Assignment {
        name: variable,
        value: value.trim(),
    }
}

fn rule<'a>(head: &'a str, prerequisites: &'a str) -> LineKind<'a> {
    let targets: Vec<&str> = head.split_whitespace().collect();
    if targets.is_empty() {
        return LineKind::Unhandled;
    }
    let (deps, inline_recipe) = prerequisites
        .split_once(';')
        .map_or((prerequisites, None), |(deps, recipe)| {
            (deps, Some(recipe.trim_start()))
        });
    LineKind::Rule {
        targets,
        deps: deps.split_whitespace().filter(|dep| *dep != "|").collect(),
        inline_recipe,
    }
}
