//! Output helpers for the runner.
//! Writes generated text to stdout or replaces a file atomically.

use super::RunnerError;
use anyhow::{Context, Result as AnyResult};
use std::fs;
use std::io::{self, Write};
use std::path::Path;
use tempfile::Builder;
use tracing::info;

/// Return `true` when `path` is the CLI sentinel indicating "use stdin/stdout".
#[must_use]
pub fn is_stdio_path(path: &Path) -> bool {
    path.as_os_str() == "-"
}

/// Append the trailing newline expected of text output. Empty text stays
/// empty so an empty diagram produces no output at all.
fn terminated(content: &str) -> String {
    if content.is_empty() || content.ends_with('\n') {
        content.to_owned()
    } else {
        format!("{content}\n")
    }
}

/// Write `content` to `path` via a temporary file in the same directory.
///
/// Readers never observe a partially written file: the temporary file is
/// synced and then renamed over the destination.
///
/// # Errors
///
/// Returns an error if the path has no file name or any I/O step fails.
pub fn write_file(path: &Path, content: &str) -> AnyResult<()> {
    if path.file_name().is_none() {
        return Err(RunnerError::OutputNotAFile {
            path: path.to_path_buf(),
        }
        .into());
    }
    let parent = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent)
        .with_context(|| format!("failed to create parent directory {}", parent.display()))?;

    let mut tmp = Builder::new()
        .prefix(".monocle.")
        .suffix(".tmp")
        .tempfile_in(parent)
        .with_context(|| format!("failed to create temporary file in {}", parent.display()))?;
    {
        let handle = tmp.as_file_mut();
        handle
            .write_all(terminated(content).as_bytes())
            .context("failed to write temporary file")?;
        handle.flush().context("failed to flush temporary file")?;
        handle.sync_all().context("failed to sync temporary file")?;
    }
    tmp.persist(path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    info!("Wrote output to {}", path.display());
    Ok(())
}

/// Write `content` to standard output.
///
/// A closed pipe (for example `monocle Makefile | head -n1`) is not an error.
///
/// # Errors
///
/// Returns an error if writing or flushing fails for any other reason.
pub fn write_stdout(content: &str) -> AnyResult<()> {
    let mut stdout = io::stdout().lock();
    write_all_ignoring_broken_pipe(&mut stdout, terminated(content).as_bytes())
        .context("failed to write to standard output")?;
    flush_ignoring_broken_pipe(&mut stdout).context("failed to flush standard output")?;
    Ok(())
}

/// Route `content` to `output`: stdout when absent or `-`, otherwise a file.
///
/// # Errors
///
/// Propagates failures from [`write_stdout`] and [`write_file`].
pub fn emit(output: Option<&Path>, content: &str) -> AnyResult<()> {
    match output {
        Some(path) if !is_stdio_path(path) => write_file(path, content),
        _ => write_stdout(content),
    }
}

fn is_broken_pipe(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::BrokenPipe
}

fn write_all_ignoring_broken_pipe(writer: &mut impl Write, buf: &[u8]) -> io::Result<()> {
    match writer.write_all(buf) {
        Ok(()) => Ok(()),
        Err(err) if is_broken_pipe(&err) => Ok(()),
        Err(err) => Err(err),
    }
}

fn flush_ignoring_broken_pipe(writer: &mut impl Write) -> io::Result<()> {
    match writer.flush() {
        Ok(()) => Ok(()),
        Err(err) if is_broken_pipe(&err) => Ok(()),
        Err(err) => Err(err),
    }
}
