//! Source URL configuration.
//!
//! `SourceConfig` names the registry search endpoint, the full registry
//! dump, and an optional operator-supplied OUI source. Values start from
//! built-in defaults, can be loaded from a TOML file, and are then
//! overridden by environment variables. Blank environment values are
//! treated as absent so a templated environment such as
//! `MACVENDOR_OUI_SOURCE=""` falls back cleanly to the defaults.

use crate::oui::OuiKey;
use camino::{Utf8Path, Utf8PathBuf};
use serde::Deserialize;
use std::time::Duration;

/// Environment variable overriding [`SourceConfig::registry_url`].
pub const REGISTRY_URL_ENV: &str = "MACVENDOR_REGISTRY_URL";

/// Environment variable overriding [`SourceConfig::dump_url`].
pub const DUMP_URL_ENV: &str = "MACVENDOR_DUMP_URL";

/// Environment variable setting [`SourceConfig::custom_source`].
pub const CUSTOM_SOURCE_ENV: &str = "MACVENDOR_OUI_SOURCE";

/// Registry single-OUI search endpoint; the `XX-XX-XX` key is appended.
pub const DEFAULT_REGISTRY_URL: &str = "https://services13.ieee.org/RST/standards-ra-web/rest/assignments/download/?registry=MA-L&format=html&text=";

/// Full registry dump in its native text layout.
pub const DEFAULT_DUMP_URL: &str = "https://standards-oui.ieee.org/oui/oui.txt";

/// Errors arising from loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read config file {path}: {source}")]
    Read {
        /// Path to the configuration file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`SourceConfig`].
    #[error("invalid config file {path}: {source}")]
    Parse {
        /// Path (or label) of the configuration source.
        path: Utf8PathBuf,
        /// The underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
}

/// Where vendor data is fetched from.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    /// Base of the registry single-OUI search endpoint. The normalized key
    /// is appended verbatim.
    pub registry_url: String,
    /// Location of the full registry dump used for bulk cache population.
    pub dump_url: String,
    /// Operator-supplied OUI source consulted before the registry. May be
    /// a dump (optionally compressed), a search page, or a single record.
    pub custom_source: Option<String>,
    /// Network timeout for a single fetch, in seconds.
    #[serde(default = "SourceConfig::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl SourceConfig {
    const fn default_timeout_secs() -> u64 {
        30
    }

    /// Built-in defaults overridden by the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::default().with_env_lookup(|name| std::env::var(name).ok())
    }

    /// Apply environment overrides read through `lookup`.
    ///
    /// This indirection lets tests simulate the environment without
    /// touching process state.
    ///
    /// # Examples
    ///
    /// ```
    /// use macvendor::config::{SourceConfig, CUSTOM_SOURCE_ENV};
    ///
    /// let config = SourceConfig::default().with_env_lookup(|name| {
    ///     (name == CUSTOM_SOURCE_ENV).then(|| "/srv/oui.txt.gz".to_owned())
    /// });
    /// assert_eq!(config.custom_source.as_deref(), Some("/srv/oui.txt.gz"));
    /// ```
    #[must_use]
    pub fn with_env_lookup<F>(self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| non_blank(lookup(name));
        Self {
            registry_url: read(REGISTRY_URL_ENV).unwrap_or(self.registry_url),
            dump_url: read(DUMP_URL_ENV).unwrap_or(self.dump_url),
            custom_source: read(CUSTOM_SOURCE_ENV).or(self.custom_source),
            timeout_secs: self.timeout_secs,
        }
    }

    /// Parse a TOML document; `label` names it in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or unknown keys.
    pub fn from_toml_str(raw: &str, label: &Utf8Path) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: label.to_owned(),
            source,
        })
    }

    /// Load a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read and
    /// [`ConfigError::Parse`] when it is invalid.
    pub fn from_file(path: &Utf8Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&raw, path)
    }

    /// URL of the registry search page for `key`.
    #[must_use]
    pub fn registry_search_url(&self, key: &OuiKey) -> String {
        format!("{}{key}", self.registry_url)
    }

    /// The configured fetch timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            registry_url: DEFAULT_REGISTRY_URL.to_owned(),
            dump_url: DEFAULT_DUMP_URL.to_owned(),
            custom_source: None,
            timeout_secs: Self::default_timeout_secs(),
        }
    }
}

/// Trim a value and treat whitespace-only strings as absent.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_owned())
        .filter(|trimmed| !trimmed.is_empty())
}
