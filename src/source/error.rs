//! Error types for loading Makefile text.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading Makefile text from a file, stdin, or a URL.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The supplied URL could not be parsed.
    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        /// The rejected input.
        url: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
    /// A share link's `makefile_url` parameter is not an `http`/`https` URL.
    #[error("share link '{url}' has no usable makefile_url value (got '{value}')")]
    InvalidShareLink {
        /// The share link as given.
        url: String,
        /// The parameter value that was rejected.
        value: String,
    },
    /// Only `http` and `https` URLs are fetched.
    #[error("unsupported URL scheme '{scheme}' in '{url}'")]
    UnsupportedScheme {
        /// The rejected URL.
        url: String,
        /// Its scheme.
        scheme: String,
    },
    /// The remote server could not provide the content.
    #[error("no content was available at {url}: {reason}")]
    Unavailable {
        /// URL that was fetched.
        url: String,
        /// Why the fetch failed.
        reason: String,
    },
    /// A local file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Read {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Standard input could not be read.
    #[error("failed to read standard input: {0}")]
    Stdin(#[source] io::Error),
}
