//! CLI execution and command dispatch logic.
//!
//! This module keeps `main` minimal by providing a single entry point that
//! handles command execution: it resolves configuration, loads the Makefile
//! from the selected source, and writes the generated output.

mod error;
mod output;

pub use error::RunnerError;
pub use output::{emit, is_stdio_path, write_file, write_stdout};

use crate::cli::{Cli, Commands, DiagramArgs, InputArgs};
use crate::config::{AppConfig, CliOverrides};
use crate::mermaid_gen;
use crate::record::Tokenized;
use crate::source::{Fetcher, MakefileSource, resolve_url};
use crate::tokenizer::{MakefileTokenizer, Tokenize};
use anyhow::{Context, Result};
use tracing::{debug, info};

/// Execute the parsed [`Cli`] command.
///
/// # Errors
///
/// Returns an error if configuration, loading, tokenizing or writing fails.
/// Tokenizer failures are returned unwrapped so callers can render them as
/// diagnostics.
pub fn run(cli: &Cli) -> Result<()> {
    let command = cli
        .command
        .clone()
        .unwrap_or_else(|| Commands::Diagram(DiagramArgs::default()));
    match command {
        Commands::Diagram(args) => handle_diagram(cli, &args),
        Commands::Records(args) => handle_records(cli, &args),
        Commands::ResolveUrl { url } => handle_resolve_url(&url),
    }
}

/// Generate a diagram and write it to the requested destination.
fn handle_diagram(cli: &Cli, args: &DiagramArgs) -> Result<()> {
    let config = load_config(cli, &args.config_overrides())?;
    let (source, text) = load_makefile(&args.input, &config)?;
    let tokenizer = tokenizer_for(&source, &config);
    let diagram = mermaid_gen::generate_with(&tokenizer, &text, config.direction)?;
    if diagram.is_empty() {
        info!("no diagrammable targets found in {source}");
    }
    emit(args.output.as_deref(), &diagram)
}

/// Print the tokenizer output as pretty JSON.
fn handle_records(cli: &Cli, args: &InputArgs) -> Result<()> {
    let config = load_config(cli, &args.config_overrides())?;
    let (source, text) = load_makefile(args, &config)?;
    let tokenized: Tokenized = tokenizer_for(&source, &config).tokenize(&text)?;
    let json = serde_json::to_string_pretty(&tokenized).context("serialising records")?;
    write_stdout(&json)
}

/// Print the address a `--url` argument resolves to.
fn handle_resolve_url(url: &str) -> Result<()> {
    let resolved = resolve_url(url)?;
    write_stdout(resolved.as_str())
}

fn load_config(cli: &Cli, overrides: &CliOverrides) -> Result<AppConfig> {
    AppConfig::load(cli.config.as_deref(), overrides).context("loading configuration")
}

/// Determine where the Makefile comes from.
///
/// # Errors
///
/// Returns an error when the URL is unusable or the path names a directory.
pub(crate) fn resolve_source(input: &InputArgs) -> Result<MakefileSource> {
    if let Some(url) = &input.url {
        return Ok(MakefileSource::Url(resolve_url(url)?));
    }
    match &input.file {
        Some(path) if !is_stdio_path(path) => {
            if path.is_dir() {
                return Err(RunnerError::InputIsDirectory { path: path.clone() }.into());
            }
            Ok(MakefileSource::File(path.clone()))
        }
        _ => Ok(MakefileSource::Stdin),
    }
}

fn load_makefile(input: &InputArgs, config: &AppConfig) -> Result<(MakefileSource, String)> {
    let source = resolve_source(input)?;
    debug!(%source, "loading Makefile");
    let fetcher = Fetcher::new(config.fetch_settings());
    let text = source
        .load(&fetcher)
        .with_context(|| format!("loading Makefile from {source}"))?;
    Ok((source, text))
}

fn tokenizer_for(source: &MakefileSource, config: &AppConfig) -> MakefileTokenizer {
    MakefileTokenizer::new(config.tokenize_options()).with_source_name(source.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::PathBuf;

    #[rstest]
    #[case(None)]
    #[case(Some("-"))]
    fn missing_or_dash_input_reads_stdin(#[case] file: Option<&str>) {
        let input = InputArgs {
            file: file.map(PathBuf::from),
            ..InputArgs::default()
        };
        assert_eq!(resolve_source(&input).expect("source"), MakefileSource::Stdin);
    }

    #[rstest]
    fn url_input_is_resolved() {
        let input = InputArgs {
            url: Some("https://github.com/user/repo/blob/main/Makefile".into()),
            ..InputArgs::default()
        };
        let MakefileSource::Url(url) = resolve_source(&input).expect("source") else {
            panic!("expected URL source");
        };
        assert_eq!(
            url.as_str(),
            "https://raw.githubusercontent.com/user/repo/main/Makefile"
        );
    }

    #[rstest]
    fn directory_input_is_rejected() {
        let dir = tempfile::tempdir().expect("temp dir");
        let input = InputArgs {
            file: Some(dir.path().to_path_buf()),
            ..InputArgs::default()
        };
        let err = resolve_source(&input).expect_err("directory");
        assert!(matches!(
            err.downcast_ref::<RunnerError>(),
            Some(RunnerError::InputIsDirectory { .. })
        ));
    }

    #[rstest]
    fn file_source_keeps_path() {
        let input = InputArgs {
            file: Some(PathBuf::from("build/Makefile")),
            ..InputArgs::default()
        };
        assert_eq!(
            resolve_source(&input).expect("source"),
            MakefileSource::File(PathBuf::from("build/Makefile"))
        );
    }
}
