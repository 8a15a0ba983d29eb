//! Application entry point.
//!
//! Parses command-line arguments and delegates execution to [`runner::run`].

use clap::Parser;
use miette::{Diagnostic, GraphicalReportHandler, GraphicalTheme};
use monocle::runner::RunnerError;
use monocle::tokenizer::TokenizeError;
use monocle::{cli::Cli, runner};
use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::fmt;

fn main() -> ExitCode {
    let cli = Cli::parse().with_default_command();
    let max_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::WARN
    };
    fmt()
        .with_max_level(max_level)
        .with_writer(io::stderr)
        .init();
    match runner::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report(&err);
            ExitCode::FAILURE
        }
    }
}

/// Print `err` to stderr, as a rich diagnostic when one is available.
fn report(err: &anyhow::Error) {
    let diagnostic: Option<&dyn Diagnostic> = err
        .downcast_ref::<TokenizeError>()
        .map(|e| e as &dyn Diagnostic)
        .or_else(|| err.downcast_ref::<RunnerError>().map(|e| e as &dyn Diagnostic));
    if let Some(diagnostic) = diagnostic {
        let theme = if io::stderr().is_terminal() {
            GraphicalTheme::unicode()
        } else {
            GraphicalTheme::unicode_nocolor()
        };
        let mut rendered = String::new();
        if GraphicalReportHandler::new_themed(theme)
            .render_report(&mut rendered, diagnostic)
            .is_ok()
            && write!(io::stderr().lock(), "{rendered}").is_ok()
        {
            return;
        }
    }
    tracing::error!(error = %format!("{err:#}"), "monocle failed");
}
