//! MAC address vendor resolution.
//!
//! This crate maps a MAC address to the organization that registered its
//! OUI (the first three bytes) with the IEEE registry. Lookups consult an
//! in-process cache, then an optional operator-supplied source, then the
//! registry's search endpoint. The whole registry dump can also be loaded
//! up front so that later lookups run offline.
//!
//! # Modules
//!
//! - [`cache`] - Thread-safe record cache and JSON snapshots
//! - [`cli`] - Command-line argument definitions
//! - [`config`] - Source URLs from defaults, TOML, and the environment
//! - [`decompress`] - Suffix-driven gzip, bzip2, and zstd decoding
//! - [`error`] - Lookup and front-end error types
//! - [`fetch`] - HTTP and local-file fetch collaborator
//! - [`oui`] - MAC address normalization to OUI keys
//! - [`record`] - Registry record parsing and page extraction
//! - [`resolver`] - Source fallback and bulk cache population
//!
//! # Examples
//!
//! ```
//! use macvendor::oui::normalize;
//!
//! let key = normalize("0:3:93:29:f6:c2")?;
//! assert_eq!(key.as_str(), "00-03-93");
//! # Ok::<(), macvendor::oui::FormatError>(())
//! ```

pub mod cache;
pub mod cli;
pub mod config;
pub mod decompress;
pub mod error;
pub mod fetch;
pub mod oui;
pub mod record;
pub mod resolver;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;

pub use cache::{CacheStore, MemoryCache};
pub use config::SourceConfig;
pub use error::LookupError;
pub use oui::{OuiKey, normalize};
pub use record::{VendorRecord, parse_oui};
pub use resolver::{LoadOutcome, Resolver};
