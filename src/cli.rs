//! CLI argument definitions for the `macvendor` binary.
//!
//! Kept apart from the entrypoint so argument parsing and the mapping onto
//! [`SourceConfig`] can be tested without running lookups.

use crate::config::SourceConfig;
use camino::Utf8PathBuf;
use clap::Parser;
use log::LevelFilter;

/// Resolve MAC addresses to the vendor that registered their OUI block.
#[derive(Parser, Debug, Default)]
#[command(name = "macvendor")]
#[command(version, about)]
#[command(long_about = concat!(
    "Resolve MAC addresses to the vendor that registered their OUI block.\n\n",
    "Each address is reduced to its first three bytes and looked up in an ",
    "in-process cache, then in an optional custom source, then through the ",
    "IEEE registry search endpoint. Use --load-cache to fetch the full ",
    "registry dump once and answer every lookup from memory.",
))]
#[command(after_help = concat!(
    "ENVIRONMENT:\n",
    "  MACVENDOR_REGISTRY_URL   Registry search endpoint (key is appended)\n",
    "  MACVENDOR_DUMP_URL       Full registry dump used by --load-cache\n",
    "  MACVENDOR_OUI_SOURCE     Custom OUI source consulted before the registry\n\n",
    "EXAMPLES:\n",
    "  Look up a single address:\n",
    "    $ macvendor 00:03:93:29:f6:c2\n\n",
    "  Load the registry dump first, keeping a compressed copy:\n",
    "    $ macvendor --load-cache --dump-url https://mirror.example/oui.txt.gz \\\n",
    "        --save-dump oui.txt.gz 00:03:93 00:0d:93\n\n",
    "  Persist the cache between runs:\n",
    "    $ macvendor --cache-file ~/.cache/macvendor.json 00-03-93",
))]
pub struct Cli {
    /// MAC addresses or OUI prefixes to resolve.
    #[arg(required = true, value_name = "MAC")]
    pub addresses: Vec<String>,

    /// Custom OUI source consulted before the registry (URL or path).
    #[arg(short, long, value_name = "URL")]
    pub source: Option<String>,

    /// Override the registry search endpoint.
    #[arg(long, value_name = "URL")]
    pub registry: Option<String>,

    /// Load the full registry dump into the cache before resolving.
    #[arg(long)]
    pub load_cache: bool,

    /// Override the registry dump location used by --load-cache.
    #[arg(long, value_name = "URL")]
    pub dump_url: Option<String>,

    /// Write the raw dump bytes to this file while loading.
    #[arg(long, value_name = "PATH", requires = "load_cache")]
    pub save_dump: Option<Utf8PathBuf>,

    /// Restore the cache from this JSON file and save it on exit.
    #[arg(long, value_name = "PATH")]
    pub cache_file: Option<Utf8PathBuf>,

    /// Read source configuration from a TOML file.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Network timeout in seconds for each fetch.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Increase log verbosity (repeatable: -v, -vv).
    #[arg(
        short,
        long = "verbose",
        action = clap::ArgAction::Count,
        conflicts_with = "quiet"
    )]
    pub verbosity: u8,

    /// Only report errors.
    #[arg(short, long, conflicts_with = "verbosity")]
    pub quiet: bool,
}

impl Cli {
    /// Layer command-line overrides on top of `config`.
    #[must_use]
    pub fn apply_to(&self, config: SourceConfig) -> SourceConfig {
        SourceConfig {
            registry_url: self.registry.clone().unwrap_or(config.registry_url),
            dump_url: self.dump_url.clone().unwrap_or(config.dump_url),
            custom_source: self.source.clone().or(config.custom_source),
            timeout_secs: self.timeout.unwrap_or(config.timeout_secs),
        }
    }

    /// Log level implied by `-q` and `-v`.
    #[must_use]
    pub const fn log_filter(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbosity {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
