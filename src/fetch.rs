//! Fetch collaborator for registry pages, custom sources, and dumps.
//!
//! Provides a trait-based abstraction so the resolver can be exercised
//! without network access. The production [`HttpFetcher`] speaks HTTP(S)
//! through `ureq` and reads `file://` URLs and bare paths from disk, which
//! lets operators point at an offline copy of the registry dump.

use std::path::Path;
use std::time::Duration;

/// Default network timeout for a single fetch.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Largest response body accepted; the full registry dump is a few MiB.
const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// Raw bytes of a fetched resource and its declared content type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchedResource {
    /// The response body, possibly compressed.
    pub bytes: Vec<u8>,
    /// The `Content-Type` header, when the transport reports one.
    pub content_type: Option<String>,
}

impl FetchedResource {
    /// Build a resource with no declared content type.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: None,
        }
    }

    /// Returns true when the declared content type is HTML.
    #[must_use]
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|value| value.to_ascii_lowercase().contains("html"))
    }
}

/// Trait for fetching a resource by URL.
///
/// # Examples
///
/// ```
/// use macvendor::fetch::HttpFetcher;
///
/// let fetcher = HttpFetcher::default();
/// // Use fetcher.fetch("https://standards-oui.ieee.org/oui/oui.txt") in production
/// ```
#[cfg_attr(test, mockall::automock)]
pub trait Fetcher {
    /// Fetch the resource at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::NotFound`] when the resource does not exist
    /// and [`FetchError::Http`] or [`FetchError::Io`] on transport failure.
    fn fetch(&self, url: &str) -> Result<FetchedResource, FetchError>;
}

impl<T: Fetcher + ?Sized> Fetcher for std::sync::Arc<T> {
    fn fetch(&self, url: &str) -> Result<FetchedResource, FetchError> {
        (**self).fetch(url)
    }
}

/// Errors arising from fetch operations.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// HTTP request failed.
    #[error("fetch failed for {url}: {reason}")]
    Http {
        /// The URL that was requested.
        url: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The requested resource was not found (HTTP 404).
    #[error("resource not found: {url}")]
    NotFound {
        /// The URL that returned 404.
        url: String,
    },

    /// I/O error reading a local source.
    #[error("I/O error reading {path}: {source}")]
    Io {
        /// The local path that was read.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Fetcher backed by a `ureq` agent and the local filesystem.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Create a fetcher whose requests give up after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            agent: http_agent(timeout),
        }
    }

    fn fetch_http(&self, url: &str) -> Result<FetchedResource, FetchError> {
        let response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| map_ureq_error(url, &e))?;
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let mut body = response.into_body();
        let bytes = body
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_vec()
            .map_err(|e| FetchError::Http {
                url: url.to_owned(),
                reason: e.to_string(),
            })?;
        Ok(FetchedResource {
            bytes,
            content_type,
        })
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedResource, FetchError> {
        match local_path(url) {
            Some(path) => read_local(path),
            None => self.fetch_http(url),
        }
    }
}

/// Resolve `file://` URLs and scheme-less strings to local paths.
fn local_path(url: &str) -> Option<&Path> {
    if let Some(path) = url.strip_prefix("file://") {
        return Some(Path::new(path));
    }
    if url.contains("://") {
        None
    } else {
        Some(Path::new(url))
    }
}

/// Read a local source, mapping a missing file to [`FetchError::NotFound`].
fn read_local(path: &Path) -> Result<FetchedResource, FetchError> {
    match std::fs::read(path) {
        Ok(bytes) => Ok(FetchedResource::from_bytes(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FetchError::NotFound {
            url: path.display().to_string(),
        }),
        Err(source) => Err(FetchError::Io {
            path: path.display().to_string(),
            source,
        }),
    }
}

/// Build a `ureq` agent with request timeout configuration.
fn http_agent(timeout: Duration) -> ureq::Agent {
    let config = ureq::Agent::config_builder()
        .timeout_global(Some(timeout))
        .build();
    ureq::Agent::new_with_config(config)
}

/// Map a ureq error to a [`FetchError`].
fn map_ureq_error(url: &str, err: &ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(404) => FetchError::NotFound {
            url: url.to_owned(),
        },
        other => FetchError::Http {
            url: url.to_owned(),
            reason: other.to_string(),
        },
    }
}
