//! Loading Makefile text from files, standard input, or remote URLs.
//!
//! Remote loading understands two URL shapes besides plain links:
//!
//! - GitHub "blob" pages, which are rewritten to the matching
//!   `raw.githubusercontent.com` address by [`normalize_github_url`].
//! - Share links carrying the Makefile address in a `makefile_url` query
//!   parameter, unwrapped by [`makefile_url_from_query`].
//!
//! Fetching uses a blocking `ureq` agent with bounded timeouts and retries.
//! A fetch either returns the full body or fails with
//! [`SourceError::Unavailable`].

mod error;

pub use error::SourceError;

use itertools::Itertools;
use std::borrow::Cow;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::{Url, form_urlencoded};

/// Query parameter that carries a Makefile address in share links.
pub const MAKEFILE_URL_PARAM: &str = "makefile_url";

const GITHUB_HOSTS: [&str; 2] = ["github.com", "www.github.com"];
const GITHUB_RAW_HOST: &str = "raw.githubusercontent.com";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Rewrite a GitHub file page URL to its raw-content URL.
///
/// `http(s)://(www.)github.com/<user>/<repo>/blob/<ref>/<path>` becomes
/// `https://raw.githubusercontent.com/<user>/<repo>/<ref>/<path>`. Any other
/// input is returned unchanged.
///
/// # Examples
///
/// ```rust
/// use monocle::source::normalize_github_url;
///
/// assert_eq!(
///     normalize_github_url("http://www.github.com/user/repo/blob/main/Makefile"),
///     "https://raw.githubusercontent.com/user/repo/main/Makefile"
/// );
/// assert_eq!(normalize_github_url("https://example.com"), "https://example.com");
/// ```
#[must_use]
pub fn normalize_github_url(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| raw_github_url(&parsed))
        .unwrap_or_else(|| url.to_owned())
}

fn raw_github_url(url: &Url) -> Option<String> {
    if !matches!(url.scheme(), "http" | "https") || url.port().is_some() {
        return None;
    }
    if !GITHUB_HOSTS.contains(&url.host_str()?) {
        return None;
    }
    let segments: Vec<&str> = url.path_segments()?.collect();
    let [user, repo, "blob", rest @ ..] = segments.as_slice() else {
        return None;
    };
    // A reference and at least one path segment must follow `blob`.
    if user.is_empty() || repo.is_empty() || rest.len() < 2 || rest.iter().any(|s| s.is_empty())
    {
        return None;
    }
    let mut raw = format!(
        "https://{GITHUB_RAW_HOST}/{user}/{repo}/{}",
        rest.iter().join("/")
    );
    if let Some(query) = url.query() {
        raw.push('?');
        raw.push_str(query);
    }
    if let Some(fragment) = url.fragment() {
        raw.push('#');
        raw.push_str(fragment);
    }
    Some(raw)
}

/// Read the Makefile address from a query string such as
/// `?makefile_url=https://example.com/Makefile`.
///
/// The leading `?` is optional. Returns `None` when the parameter is missing,
/// empty, not an absolute URL, or not `http`/`https`.
///
/// # Examples
///
/// ```rust
/// use monocle::source::makefile_url_from_query;
///
/// let url = makefile_url_from_query("?makefile_url=https://www.example.com?foo=bar");
/// assert_eq!(url.map(String::from).as_deref(), Some("https://www.example.com/?foo=bar"));
/// assert!(makefile_url_from_query("?makefile_url=foo").is_none());
/// ```
#[must_use]
pub fn makefile_url_from_query(query: &str) -> Option<Url> {
    parse_fetchable(&makefile_url_param(query)?)
}

fn makefile_url_param(query: &str) -> Option<Cow<'_, str>> {
    let pairs = query.strip_prefix('?').unwrap_or(query);
    form_urlencoded::parse(pairs.as_bytes())
        .find(|(key, _)| key == MAKEFILE_URL_PARAM)
        .map(|(_, value)| value)
}

fn parse_fetchable(value: &str) -> Option<Url> {
    Url::parse(value).ok().filter(is_fetchable)
}

/// Turn user input into the URL that will be fetched.
///
/// Any URL carrying a `makefile_url` parameter is a share link and is
/// replaced by the parameter's value. GitHub page URLs are then rewritten to
/// raw-content URLs.
///
/// # Errors
///
/// Returns [`SourceError::InvalidUrl`] when the input is not an absolute URL,
/// [`SourceError::InvalidShareLink`] when the `makefile_url` value is not an
/// `http`/`https` URL and [`SourceError::UnsupportedScheme`] for schemes
/// other than `http` and `https`.
pub fn resolve_url(input: &str) -> Result<Url, SourceError> {
    let url = parse_url(input)?;
    let shared = url.query().and_then(makefile_url_param).map(|value| {
        parse_fetchable(&value).ok_or_else(|| SourceError::InvalidShareLink {
            url: input.to_owned(),
            value: value.into_owned(),
        })
    });
    let target = shared.transpose()?.unwrap_or(url);
    let resolved = parse_url(&normalize_github_url(target.as_str()))?;
    if !is_fetchable(&resolved) {
        return Err(SourceError::UnsupportedScheme {
            scheme: resolved.scheme().to_owned(),
            url: resolved.into(),
        });
    }
    if resolved.as_str() != input {
        debug!(input, resolved = %resolved, "resolved Makefile URL");
    }
    Ok(resolved)
}

fn parse_url(input: &str) -> Result<Url, SourceError> {
    Url::parse(input).map_err(|source| SourceError::InvalidUrl {
        url: input.to_owned(),
        source,
    })
}

fn is_fetchable(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}

/// Timeout and retry policy for remote fetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchSettings {
    /// Upper bound on a whole request, including reading the body.
    pub timeout: Duration,
    /// Extra attempts after a failed transport or server error.
    pub retries: u32,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retries: 1,
        }
    }
}

/// Blocking HTTP client for Makefile content.
#[derive(Debug)]
pub struct Fetcher {
    agent: ureq::Agent,
    retries: u32,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new(FetchSettings::default())
    }
}

impl Fetcher {
    /// Build a fetcher using `settings`.
    #[must_use]
    pub fn new(settings: FetchSettings) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT.min(settings.timeout))
            .timeout(settings.timeout)
            .build();
        Self {
            agent,
            retries: settings.retries,
        }
    }

    /// Fetch the body at `url` as text.
    ///
    /// Transport failures and `5xx` responses are retried; other status codes
    /// fail immediately.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Unavailable`] when no attempt produced a body.
    pub fn fetch(&self, url: &Url) -> Result<String, SourceError> {
        let attempts = self.retries.saturating_add(1);
        let mut reason = String::new();
        for attempt in 1..=attempts {
            info!(%url, attempt, "fetching Makefile");
            match self.agent.get(url.as_str()).call() {
                Ok(response) => {
                    return response
                        .into_string()
                        .map_err(|err| unavailable(url, format!("failed to read response: {err}")));
                }
                Err(ureq::Error::Status(code, _)) if code < 500 => {
                    return Err(unavailable(url, format!("server responded with status {code}")));
                }
                Err(ureq::Error::Status(code, _)) => {
                    reason = format!("server responded with status {code}");
                }
                Err(err) => reason = err.to_string(),
            }
            warn!(%url, attempt, attempts, reason = %reason, "fetch attempt failed");
        }
        Err(unavailable(url, reason))
    }
}

fn unavailable(url: &Url, reason: String) -> SourceError {
    SourceError::Unavailable {
        url: url.to_string(),
        reason,
    }
}

/// Where Makefile text comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MakefileSource {
    /// Standard input.
    Stdin,
    /// A local file.
    File(PathBuf),
    /// A remote document.
    Url(Url),
}

impl MakefileSource {
    /// Read the Makefile text.
    ///
    /// # Errors
    ///
    /// Returns a [`SourceError`] when the file, stdin, or URL cannot be read.
    pub fn load(&self, fetcher: &Fetcher) -> Result<String, SourceError> {
        match self {
            Self::Stdin => io::read_to_string(io::stdin()).map_err(SourceError::Stdin),
            Self::File(path) => std::fs::read_to_string(path).map_err(|source| SourceError::Read {
                path: path.clone(),
                source,
            }),
            Self::Url(url) => fetcher.fetch(url),
        }
    }
}

impl fmt::Display for MakefileSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdin => f.write_str("<stdin>"),
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}
