//! OUI keys and MAC address normalization.
//!
//! An [`OuiKey`] is the canonical `XX-XX-XX` form of the first three bytes
//! of a hardware address. It is the lookup key for both the cache and the
//! registry, and can only be produced by [`normalize`], so every key in
//! circulation satisfies the format invariant.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of bytes retained from a MAC address.
const OUI_BYTES: usize = 3;

/// Maximum number of bytes a MAC address may carry.
const MAX_BYTES: usize = 6;

/// Errors arising from malformed MAC address input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// The input does not contain a single hex digit.
    #[error("MAC address {input:?} contains no hex digits")]
    NoHexDigits {
        /// The rejected input.
        input: String,
    },

    /// The input carries more than six bytes.
    #[error("MAC address {input:?} has more than six bytes")]
    TooManyBytes {
        /// The rejected input.
        input: String,
    },

    /// One of the OUI bytes is not one or two hex digits.
    #[error("MAC address {input:?} has an invalid byte {component:?}")]
    InvalidByte {
        /// The rejected input.
        input: String,
        /// The offending byte component.
        component: String,
    },

    /// The input has no separators and cannot be split into whole bytes.
    #[error("MAC address {input:?} cannot be split into bytes")]
    Ambiguous {
        /// The rejected input.
        input: String,
    },
}

/// The canonical first three bytes of a MAC address, e.g. `00-0D-93`.
///
/// # Examples
///
/// ```
/// use macvendor::oui::OuiKey;
///
/// let key: OuiKey = "0:d:93".parse().unwrap();
/// assert_eq!(key.as_str(), "00-0D-93");
/// assert_eq!(key.compact(), "000D93");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OuiKey(String);

impl OuiKey {
    /// Return the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Return the key without separators, as the registry's base-16
    /// notation writes it (`000D93`).
    #[must_use]
    pub fn compact(&self) -> String {
        self.0.replace('-', "")
    }
}

impl fmt::Display for OuiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for OuiKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for OuiKey {
    type Err = FormatError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        normalize(value)
    }
}

impl TryFrom<&str> for OuiKey {
    type Error = FormatError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        normalize(value)
    }
}

impl TryFrom<String> for OuiKey {
    type Error = FormatError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        normalize(&value)
    }
}

impl From<OuiKey> for String {
    fn from(key: OuiKey) -> Self {
        key.0
    }
}

/// Normalize a MAC address into its [`OuiKey`].
///
/// Colon and hyphen separators are interchangeable, single-digit bytes are
/// zero-padded, empty components count as zero bytes, and everything past
/// the third byte is ignored. Input without separators is accepted when it
/// is an even-length run of hex digits.
///
/// # Errors
///
/// Returns a [`FormatError`] when the input has no hex digits, more than
/// six bytes, a malformed OUI byte, or cannot be split into bytes.
///
/// # Examples
///
/// ```
/// use macvendor::oui::normalize;
///
/// let key = normalize("00:0d:93:29:f6:c2").unwrap();
/// assert_eq!(key.as_str(), "00-0D-93");
/// assert_eq!(normalize(":d:93").unwrap(), key);
/// ```
pub fn normalize(input: &str) -> Result<OuiKey, FormatError> {
    let trimmed = input.trim();
    let components = split_components(input, trimmed)?;
    if components.len() > MAX_BYTES {
        return Err(FormatError::TooManyBytes {
            input: input.to_owned(),
        });
    }

    let retained: Vec<&str> = components
        .iter()
        .map(String::as_str)
        .take(OUI_BYTES)
        .collect();
    if !retained
        .iter()
        .any(|component| component.chars().any(|c| c.is_ascii_hexdigit()))
    {
        return Err(FormatError::NoHexDigits {
            input: input.to_owned(),
        });
    }

    let mut bytes = Vec::with_capacity(OUI_BYTES);
    for component in retained {
        bytes.push(normalize_byte(input, component)?);
    }
    while bytes.len() < OUI_BYTES {
        bytes.push("00".to_owned());
    }
    Ok(OuiKey(bytes.join("-")))
}

/// Split the trimmed input into byte components.
fn split_components(input: &str, trimmed: &str) -> Result<Vec<String>, FormatError> {
    if trimmed.contains([':', '-']) {
        return Ok(trimmed.split([':', '-']).map(str::to_owned).collect());
    }
    if trimmed.is_empty() {
        return Err(FormatError::NoHexDigits {
            input: input.to_owned(),
        });
    }
    if !trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(FormatError::InvalidByte {
            input: input.to_owned(),
            component: trimmed.to_owned(),
        });
    }
    if trimmed.len() % 2 != 0 {
        return Err(FormatError::Ambiguous {
            input: input.to_owned(),
        });
    }
    Ok(trimmed
        .as_bytes()
        .chunks(2)
        .map(|pair| pair.iter().copied().map(char::from).collect())
        .collect())
}

/// Validate one byte component and render it as two uppercase digits.
fn normalize_byte(input: &str, component: &str) -> Result<String, FormatError> {
    if component.len() > 2 || !component.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(FormatError::InvalidByte {
            input: input.to_owned(),
            component: component.to_owned(),
        });
    }
    Ok(format!("{:0>2}", component.to_ascii_uppercase()))
}
