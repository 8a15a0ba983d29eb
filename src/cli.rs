//! Command line interface definition using clap.
//!
//! This module defines the [`Cli`] structure and its subcommands. Flags that
//! map onto configuration settings are converted into [`CliOverrides`] so
//! they override file and environment values.

use crate::config::CliOverrides;
use crate::mermaid_gen::Direction;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Turn Makefile target/dependency structure into Mermaid diagrams.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose diagnostic logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Read settings from this file before any discovered configuration.
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute; defaults to `diagram` reading standard input.
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Apply the default command if none was specified.
    #[must_use]
    pub fn with_default_command(mut self) -> Self {
        if self.command.is_none() {
            self.command = Some(Commands::Diagram(DiagramArgs::default()));
        }
        self
    }
}

/// Where to read the Makefile from and how strictly to tokenize it.
#[derive(Debug, Args, PartialEq, Eq, Clone, Default)]
pub struct InputArgs {
    /// Makefile to read. Use `-` or omit to read standard input.
    #[arg(value_name = "FILE", conflicts_with = "url")]
    pub file: Option<PathBuf>,

    /// Fetch the Makefile from a URL.
    ///
    /// GitHub file pages are rewritten to their raw-content address, and
    /// share links carrying a `makefile_url` parameter are unwrapped.
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// Fail on lines that are not rules, assignments, recipes or comments.
    #[arg(long)]
    pub strict: bool,
}

impl InputArgs {
    /// Settings supplied by these flags.
    #[must_use]
    pub fn config_overrides(&self) -> CliOverrides {
        CliOverrides {
            strict: self.strict.then_some(true),
            ..CliOverrides::default()
        }
    }
}

/// Arguments accepted by the `diagram` command.
#[derive(Debug, Args, PartialEq, Eq, Clone, Default)]
pub struct DiagramArgs {
    /// Makefile input selection.
    #[command(flatten)]
    pub input: InputArgs,

    /// Flowchart direction.
    #[arg(short, long, value_enum, ignore_case = true)]
    pub direction: Option<Direction>,

    /// Write the diagram to this path. Use `-` or omit to write to stdout.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

impl DiagramArgs {
    /// Settings supplied by these flags.
    #[must_use]
    pub fn config_overrides(&self) -> CliOverrides {
        CliOverrides {
            direction: self.direction,
            ..self.input.config_overrides()
        }
    }
}

/// Available top-level commands.
#[derive(Debug, Subcommand, PartialEq, Eq, Clone)]
pub enum Commands {
    /// Generate Mermaid code for a Makefile.
    Diagram(DiagramArgs),

    /// Print the tokenized records of a Makefile as JSON.
    Records(InputArgs),

    /// Print the address that `--url` would fetch.
    ResolveUrl {
        /// GitHub page, share link, or plain URL.
        #[arg(value_name = "URL")]
        url: String,
    },
}
