//! Error types for the runner module.
//!
//! This submodule isolates derive-macro-affected code to scope lint suppressions
//! narrowly.

// FIXME(rust-lang/rust#130021): remove once upstream is fixed.
#![allow(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    unused_assignments
)]

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised during command execution.
#[derive(Debug, Error, Diagnostic)]
pub enum RunnerError {
    /// The input path names a directory rather than a Makefile.
    #[error("{} is a directory, not a Makefile", path.display())]
    #[diagnostic(
        code(monocle::runner::input_is_directory),
        help("pass the Makefile itself, for example {}/Makefile", path.display())
    )]
    InputIsDirectory {
        /// The path that was given.
        path: PathBuf,
    },

    /// The output path has no file name component.
    #[error("output path {} does not name a file", path.display())]
    #[diagnostic(
        code(monocle::runner::output_not_a_file),
        help("use `-` to write the diagram to standard output")
    )]
    OutputNotAFile {
        /// The path that was given.
        path: PathBuf,
    },
}
