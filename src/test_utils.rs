//! Shared test utilities for the resolver and its callers.

use crate::fetch::{FetchError, FetchedResource, Fetcher};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Mutex;

/// A canned response served by [`StubFetcher`].
#[derive(Debug, Clone)]
pub enum StubResponse {
    /// Serve these bytes with an optional content type.
    Body(FetchedResource),
    /// Answer with [`FetchError::NotFound`].
    NotFound,
    /// Answer with [`FetchError::Http`] carrying this reason.
    Transport(String),
}

/// A [`Fetcher`] that serves canned responses per URL and records every
/// request it receives.
///
/// URLs without a registered response answer [`FetchError::NotFound`].
#[derive(Debug, Default)]
pub struct StubFetcher {
    responses: HashMap<String, StubResponse>,
    requests: Mutex<Vec<String>>,
}

impl StubFetcher {
    /// Creates a stub that answers every URL with "not found".
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` as plain text for `url`.
    #[must_use]
    pub fn with_text(self, url: &str, body: &str) -> Self {
        self.with_response(url, StubResponse::Body(FetchedResource::from_bytes(body)))
    }

    /// Serve `body` as an HTML page for `url`.
    #[must_use]
    pub fn with_html(self, url: &str, body: &str) -> Self {
        self.with_response(
            url,
            StubResponse::Body(FetchedResource {
                bytes: body.as_bytes().to_vec(),
                content_type: Some("text/html; charset=UTF-8".to_owned()),
            }),
        )
    }

    /// Serve raw `bytes` for `url`.
    #[must_use]
    pub fn with_bytes(self, url: &str, bytes: Vec<u8>) -> Self {
        self.with_response(url, StubResponse::Body(FetchedResource::from_bytes(bytes)))
    }

    /// Fail requests for `url` at the transport level.
    #[must_use]
    pub fn with_transport_error(self, url: &str, reason: &str) -> Self {
        self.with_response(url, StubResponse::Transport(reason.to_owned()))
    }

    /// Register an arbitrary response for `url`.
    #[must_use]
    pub fn with_response(mut self, url: &str, response: StubResponse) -> Self {
        self.responses.insert(url.to_owned(), response);
        self
    }

    /// Every URL requested so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the request log lock is poisoned.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().expect("request log lock").clone()
    }
}

impl Fetcher for StubFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedResource, FetchError> {
        self.requests
            .lock()
            .expect("request log lock")
            .push(url.to_owned());
        match self.responses.get(url) {
            Some(StubResponse::Body(resource)) => Ok(resource.clone()),
            Some(StubResponse::Transport(reason)) => Err(FetchError::Http {
                url: url.to_owned(),
                reason: reason.clone(),
            }),
            Some(StubResponse::NotFound) | None => Err(FetchError::NotFound {
                url: url.to_owned(),
            }),
        }
    }
}

/// Format a record in the registry's native text layout.
///
/// `lines[0]` is the organization name and the rest are address lines.
/// `key` must be in `XX-XX-XX` form.
#[must_use]
pub fn registry_block(key: &str, lines: &[&str]) -> String {
    let name = lines.first().copied().unwrap_or_default();
    let compact = key.replace('-', "");
    let mut block = format!("{key}   (hex)\t\t{name}\n{compact}     (base 16)\t\t{name}\n");
    for line in lines.iter().skip(1) {
        block.push_str("\t\t\t\t");
        block.push_str(line);
        block.push('\n');
    }
    block
}

/// Wrap a record block in a registry search-result page.
#[must_use]
pub fn search_page(block: &str) -> String {
    let escaped = block.replace('&', "&amp;");
    format!(
        concat!(
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head><title>Search results</title></head>\n",
            "<body>\n<div class=\"results\">\n<pre class=\"record\">\n{}</pre>\n</div>\n",
            "</body>\n</html>\n"
        ),
        escaped
    )
}

/// A registry search-result page with no record in it.
#[must_use]
pub fn empty_search_page() -> String {
    "<!DOCTYPE html>\n<html><body><p>No matching assignments.</p></body></html>\n".to_owned()
}

/// Gzip-compress `bytes`.
///
/// # Panics
///
/// Panics if the in-memory encoder fails.
#[must_use]
pub fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder =
        flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(bytes).expect("gzip write");
    encoder.finish().expect("gzip finish")
}
