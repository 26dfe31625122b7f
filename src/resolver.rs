//! Vendor resolution with ordered source fallback.
//!
//! A lookup consults the cache first, then the operator's custom source
//! when one is configured, then the registry's single-OUI search endpoint.
//! The first source that yields a non-empty record wins and the record is
//! written through to the cache before it is returned.
//!
//! [`Resolver::load_cache`] is the bulk alternative: it fetches the whole
//! registry dump once and fills the cache so later lookups never touch the
//! network. Bulk failures are never fatal; the caller receives
//! [`LoadOutcome::Unavailable`] and can continue with per-lookup fetches.

use crate::cache::{CacheStore, MemoryCache};
use crate::config::SourceConfig;
use crate::decompress::SourceDescriptor;
use crate::error::{LookupError, Result};
use crate::fetch::{FetchError, FetchedResource, Fetcher, HttpFetcher};
use crate::oui::{OuiKey, normalize};
use crate::record::{
    VendorRecord, block_names_oui, extract_oui_from_html, find_record, parse_oui, split_records,
};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::io::Write;
use std::sync::Arc;

/// The outcome of a bulk cache population attempt.
///
/// A failed bulk load leaves the resolver usable in per-lookup mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The dump was fetched and parsed.
    Loaded {
        /// Number of records inserted into the cache.
        count: usize,
        /// Number of malformed record blocks that were skipped.
        skipped: usize,
    },
    /// The dump could not be obtained or decoded.
    Unavailable {
        /// A human-readable explanation of the failure.
        reason: String,
    },
}

/// Internal error type for bulk population.
///
/// Not exported; every variant is reported as
/// [`LoadOutcome::Unavailable`].
#[derive(Debug, thiserror::Error)]
enum LoadError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Decompress(#[from] crate::decompress::DecompressError),
}

/// Resolves MAC addresses to vendor records.
///
/// The cache store and fetcher are injected, so alternate storage backends
/// and offline test doubles plug in without touching resolution logic.
pub struct Resolver {
    config: SourceConfig,
    cache: Arc<dyn CacheStore>,
    fetcher: Box<dyn Fetcher + Send + Sync>,
}

impl Resolver {
    /// Create a resolver from its collaborators.
    pub fn new(
        config: SourceConfig,
        cache: Arc<dyn CacheStore>,
        fetcher: impl Fetcher + Send + Sync + 'static,
    ) -> Self {
        Self {
            config,
            cache,
            fetcher: Box::new(fetcher),
        }
    }

    /// Production resolver: an empty [`MemoryCache`] and an
    /// [`HttpFetcher`] honouring the configured timeout.
    #[must_use]
    pub fn from_config(config: SourceConfig) -> Self {
        let fetcher = HttpFetcher::new(config.timeout());
        Self::new(config, Arc::new(MemoryCache::new()), fetcher)
    }

    /// The injected cache store.
    #[must_use]
    pub fn cache(&self) -> &Arc<dyn CacheStore> {
        &self.cache
    }

    /// Resolve a MAC address to its vendor record.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Format`] for malformed input without touching
    /// the cache or network, [`LookupError::Network`] when a transport
    /// failure prevented an answer, [`LookupError::UnsupportedEncoding`]
    /// when a custom source payload could not be decompressed, and
    /// [`LookupError::NotFound`] when every source answered without data.
    pub fn lookup(&self, mac: &str) -> Result<VendorRecord> {
        let key = normalize(mac)?;
        self.lookup_key(&key)
    }

    /// Resolve an already normalized key. See [`Self::lookup`].
    ///
    /// # Errors
    ///
    /// As for [`Self::lookup`], minus the format check.
    pub fn lookup_key(&self, key: &OuiKey) -> Result<VendorRecord> {
        if let Some(record) = self.cache.get(key) {
            debug!("cache hit for {key}");
            return Ok(record);
        }

        let mut failure = None;

        if self.config.custom_source.is_some() {
            match self.fetch_from_custom(key) {
                Ok(Some(record)) => return Ok(self.write_through(key, record)),
                Ok(None) => debug!("custom source has no record for {key}"),
                Err(e) => {
                    warn!("custom OUI source failed for {key}: {e}");
                    failure = Some(e);
                }
            }
        }

        match self.fetch_from_registry(key) {
            Ok(Some(record)) => return Ok(self.write_through(key, record)),
            Ok(None) => debug!("registry has no record for {key}"),
            Err(e) => {
                warn!("registry lookup failed for {key}: {e}");
                failure = Some(e);
            }
        }

        Err(failure.unwrap_or_else(|| LookupError::NotFound { key: key.clone() }))
    }

    /// Look `key` up in the configured custom source only.
    ///
    /// Returns `Ok(None)` when no custom source is configured or it holds
    /// no record for `key`. The cache is neither read nor written.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Network`] on transport failure and
    /// [`LookupError::UnsupportedEncoding`] when the payload cannot be
    /// decompressed.
    pub fn fetch_from_custom(&self, key: &OuiKey) -> Result<Option<VendorRecord>> {
        let Some(url) = self.config.custom_source.as_deref() else {
            return Ok(None);
        };
        debug!("fetching {key} from custom source {url}");
        let Some(resource) = self.fetch_optional(url)? else {
            return Ok(None);
        };

        let bytes = SourceDescriptor::parse(url).decode(&resource.bytes)?;
        let text = String::from_utf8_lossy(&bytes);
        let block = if resource.is_html() || looks_like_html(&text) {
            extract_oui_from_html(&text, key)
        } else {
            // A source without record headers is a single bare record, and
            // is only trusted when its first line names the key.
            find_record(&text, key).or_else(|| {
                (split_records(&text).is_empty() && block_names_oui(&text, key))
                    .then(|| text.into_owned())
            })
        };
        Ok(non_empty(block.as_deref()))
    }

    /// Look `key` up through the registry's search endpoint only.
    ///
    /// Returns `Ok(None)` when the page carries no record for `key`. The
    /// cache is neither read nor written.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Network`] on transport failure.
    pub fn fetch_from_registry(&self, key: &OuiKey) -> Result<Option<VendorRecord>> {
        let url = self.config.registry_search_url(key);
        debug!("fetching {key} from registry {url}");
        let Some(resource) = self.fetch_optional(&url)? else {
            return Ok(None);
        };
        let html = String::from_utf8_lossy(&resource.bytes);
        let block = extract_oui_from_html(&html, key);
        if block.is_none() {
            debug!("registry page for {key} has no recognizable record");
        }
        Ok(non_empty(block.as_deref()))
    }

    /// Populate the cache from a full registry dump.
    ///
    /// `source` defaults to the configured dump URL. When `dest` is given
    /// the raw, still-compressed bytes are written to it verbatim; a failing
    /// sink is logged and does not stop the load. Malformed record blocks
    /// are skipped and counted; each record is inserted individually so
    /// concurrent lookups are not blocked for the whole load.
    pub fn load_cache(&self, source: Option<&str>, dest: Option<&mut dyn Write>) -> LoadOutcome {
        let url = source.unwrap_or(self.config.dump_url.as_str());
        match self.populate(url, dest) {
            Ok((count, skipped)) => {
                info!("loaded {count} OUI records from {url} ({skipped} skipped)");
                LoadOutcome::Loaded { count, skipped }
            }
            Err(e) => {
                let reason = e.to_string();
                warn!("could not load OUI dump from {url}: {reason}");
                LoadOutcome::Unavailable { reason }
            }
        }
    }

    /// Insert a record directly into the cache.
    pub fn add_to_cache(&self, key: OuiKey, record: VendorRecord) {
        self.cache.put(key, record);
    }

    /// Read a record directly from the cache, without fetching.
    #[must_use]
    pub fn get_from_cache(&self, key: &OuiKey) -> Option<VendorRecord> {
        self.cache.get(key)
    }

    /// Copy of every cached entry.
    #[must_use]
    pub fn cache_snapshot(&self) -> HashMap<OuiKey, VendorRecord> {
        self.cache.snapshot()
    }

    /// Fetch the dump, copy it to the sink, then decode and insert each record.
    fn populate(
        &self,
        url: &str,
        dest: Option<&mut dyn Write>,
    ) -> std::result::Result<(usize, usize), LoadError> {
        info!("fetching OUI dump from {url}");
        let resource = self.fetcher.fetch(url)?;

        let kept = dest.map_or(Ok(()), |sink| {
            sink.write_all(&resource.bytes).and_then(|()| sink.flush())
        });
        if let Err(e) = kept {
            warn!("could not keep raw OUI dump from {url}: {e}");
        }

        let descriptor = SourceDescriptor::parse(url);
        debug!(
            "decoding {} OUI dump from {}",
            descriptor.compression().name(),
            descriptor.url()
        );
        let bytes = descriptor.decode(&resource.bytes)?;
        let text = String::from_utf8_lossy(&bytes);

        let mut count = 0;
        let mut skipped = 0;
        for (key, block) in split_records(&text) {
            let record = parse_oui(&block);
            if record.is_empty() {
                warn!("skipping malformed OUI record for {key}");
                skipped += 1;
                continue;
            }
            self.cache.put(key, record);
            count += 1;
        }
        Ok((count, skipped))
    }

    fn write_through(&self, key: &OuiKey, record: VendorRecord) -> VendorRecord {
        self.cache.put(key.clone(), record.clone());
        record
    }

    /// Fetch `url`, treating "not found" as an absent resource.
    fn fetch_optional(&self, url: &str) -> Result<Option<FetchedResource>> {
        match self.fetcher.fetch(url) {
            Ok(resource) => Ok(Some(resource)),
            Err(FetchError::NotFound { .. }) => Ok(None),
            Err(source) => Err(LookupError::Network { source }),
        }
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("config", &self.config)
            .field("cached", &self.cache.len())
            .finish_non_exhaustive()
    }
}

/// Parse an optional block, mapping an empty record to `None`.
fn non_empty(block: Option<&str>) -> Option<VendorRecord> {
    block.map(parse_oui).filter(|record| !record.is_empty())
}

fn looks_like_html(text: &str) -> bool {
    text.trim_start().starts_with('<')
}

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
