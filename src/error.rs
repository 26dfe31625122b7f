//! Error types for vendor lookups and the command-line front end.
//!
//! [`LookupError`] is what a single lookup surfaces to its caller. The
//! variants keep "the address is malformed", "a transport failed", "no
//! source has data", and "a payload could not be decompressed" apart so
//! callers can decide whether retrying or switching sources makes sense.

use crate::cache::SnapshotError;
use crate::config::ConfigError;
use crate::decompress::DecompressError;
use crate::fetch::FetchError;
use crate::oui::{FormatError, OuiKey};
use camino::Utf8PathBuf;
use thiserror::Error;

/// Errors that can occur while resolving a single address.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The MAC address is malformed. No cache or network access happened.
    #[error(transparent)]
    Format(#[from] FormatError),

    /// A fetch failed at the transport level. Never cached.
    #[error("network error: {source}")]
    Network {
        /// The underlying fetch failure.
        #[source]
        source: FetchError,
    },

    /// Every attempted source answered without data for the OUI.
    #[error("no vendor data found for {key}")]
    NotFound {
        /// The OUI that was looked up.
        key: OuiKey,
    },

    /// A compressed payload could not be decompressed.
    #[error(transparent)]
    UnsupportedEncoding(#[from] DecompressError),
}

impl LookupError {
    /// Returns true for the terminal "no source has data" outcome.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type alias using [`LookupError`].
pub type Result<T> = std::result::Result<T, LookupError>;

/// Errors that stop the command-line front end before any lookup runs.
#[derive(Debug, Error)]
pub enum CliError {
    /// The configuration file could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The cache snapshot could not be read or written.
    #[error("cache file {path}: {source}")]
    CacheFile {
        /// Path to the snapshot file.
        path: Utf8PathBuf,
        /// The underlying snapshot failure.
        #[source]
        source: SnapshotError,
    },

    /// The raw dump destination could not be created.
    #[error("cannot create dump file {path}: {source}")]
    DumpFile {
        /// Path to the dump destination.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
