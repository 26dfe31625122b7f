//! Transparent decompression of fetched resources.
//!
//! The compression kind is inferred from the filename suffix of the source
//! URL. Unrecognized suffixes mean "no compression" and pass the payload
//! through unchanged; only a recognized suffix with a corrupt payload is an
//! error.

use bzip2::read::BzDecoder;
use flate2::read::MultiGzDecoder;
use std::io::Read;

/// Compression applied to a fetched resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// The payload is used as fetched.
    Plain,
    /// gzip, possibly with multiple members.
    Gzip,
    /// bzip2.
    Bzip2,
    /// Zstandard.
    Zstd,
}

/// Recognized filename suffixes, matched case-insensitively.
const SUFFIXES: &[(&str, Compression)] = &[
    (".gz", Compression::Gzip),
    (".gzip", Compression::Gzip),
    (".bz2", Compression::Bzip2),
    (".bzip2", Compression::Bzip2),
    (".zst", Compression::Zstd),
    (".zstd", Compression::Zstd),
];

impl Compression {
    /// Infer the compression kind from the last path segment of `url`.
    ///
    /// Query strings and fragments are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use macvendor::decompress::Compression;
    ///
    /// assert_eq!(Compression::from_url("https://example.test/oui.txt.gz"), Compression::Gzip);
    /// assert_eq!(Compression::from_url("https://example.test/oui.txt?v=2"), Compression::Plain);
    /// ```
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        let name = file_name(url).to_ascii_lowercase();
        SUFFIXES
            .iter()
            .find(|(suffix, _)| name.ends_with(suffix))
            .map_or(Self::Plain, |(_, kind)| *kind)
    }

    /// Human-readable name used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Gzip => "gzip",
            Self::Bzip2 => "bzip2",
            Self::Zstd => "zstd",
        }
    }

    /// Decode `bytes` according to this compression kind.
    ///
    /// # Errors
    ///
    /// Returns an I/O error when the payload is not valid for the kind.
    pub fn decode(self, bytes: &[u8]) -> std::io::Result<Vec<u8>> {
        match self {
            Self::Plain => Ok(bytes.to_vec()),
            Self::Gzip => read_all(MultiGzDecoder::new(bytes)),
            Self::Bzip2 => read_all(BzDecoder::new(bytes)),
            Self::Zstd => read_all(zstd::Decoder::new(bytes)?),
        }
    }
}

/// Errors arising from decompressing a fetched resource.
#[derive(Debug, thiserror::Error)]
pub enum DecompressError {
    /// A recognized compression suffix carried a payload that could not be
    /// decoded.
    #[error("{kind} payload from {url} could not be decompressed: {source}")]
    Corrupt {
        /// The compression kind inferred from the URL.
        kind: &'static str,
        /// The source URL.
        url: String,
        /// The underlying decoder error.
        #[source]
        source: std::io::Error,
    },
}

/// A source URL paired with the compression inferred from it.
///
/// Built fresh for every fetch and never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    url: String,
    compression: Compression,
}

impl SourceDescriptor {
    /// Describe `url`, inferring its compression from the filename suffix.
    #[must_use]
    pub fn parse(url: &str) -> Self {
        Self {
            url: url.to_owned(),
            compression: Compression::from_url(url),
        }
    }

    /// The source URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The inferred compression kind.
    #[must_use]
    pub const fn compression(&self) -> Compression {
        self.compression
    }

    /// Decompress a payload fetched from this source.
    ///
    /// # Errors
    ///
    /// Returns [`DecompressError::Corrupt`] when the payload does not match
    /// the recognized compression kind.
    pub fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, DecompressError> {
        self.compression
            .decode(bytes)
            .map_err(|source| DecompressError::Corrupt {
                kind: self.compression.name(),
                url: self.url.clone(),
                source,
            })
    }
}

/// Decompress `bytes` fetched from `source_url`.
///
/// # Errors
///
/// Returns [`DecompressError::Corrupt`] when a recognized compression
/// suffix carries an undecodable payload.
///
/// # Examples
///
/// ```
/// use macvendor::decompress::decompress;
///
/// let plain = decompress(b"00-03-93 (hex) Apple", "https://example.test/oui.txt").unwrap();
/// assert_eq!(plain, b"00-03-93 (hex) Apple");
/// assert!(decompress(b"not gzip", "https://example.test/oui.txt.gz").is_err());
/// ```
pub fn decompress(bytes: &[u8], source_url: &str) -> Result<Vec<u8>, DecompressError> {
    SourceDescriptor::parse(source_url).decode(bytes)
}

/// Return the last path segment of a URL or path.
fn file_name(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

fn read_all(mut reader: impl Read) -> std::io::Result<Vec<u8>> {
    let mut decoded = Vec::new();
    reader.read_to_end(&mut decoded)?;
    Ok(decoded)
}
