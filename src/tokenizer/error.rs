//! Error types raised by the Makefile tokenizer.

// Scoped suppression for version-dependent lint false positives from
// miette/thiserror derive macros.
// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// Errors raised while tokenizing Makefile text in strict mode.
#[derive(Debug, Error, Diagnostic)]
pub enum TokenizeError {
    /// A line matched none of the recognised Makefile constructs.
    #[error("could not parse line {line}: {text}")]
    #[diagnostic(
        code(monocle::tokenizer::unparsable_line),
        help("recipe lines must start with a tab; rules need a `:`")
    )]
    UnparsableLine {
        /// 1-based line number where the logical line starts.
        line: usize,
        /// The logical line after continuation joining.
        text: String,
        /// Makefile text the line was taken from.
        #[source_code]
        src: NamedSource<String>,
        /// Location of the line within `src`.
        #[label("not a rule, assignment, recipe or comment")]
        span: SourceSpan,
    },
}

impl TokenizeError {
    /// Line number the error refers to.
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::UnparsableLine { line, .. } => *line,
        }
    }
}
