//! `macvendor` CLI entrypoint.
//!
//! Resolves each address given on the command line and prints the vendor
//! record beneath it. Optionally restores and saves a JSON cache snapshot
//! and bulk-loads the registry dump before resolving.

use camino::Utf8Path;
use clap::Parser;
use log::{LevelFilter, debug};
use macvendor::cache::{load_snapshot, save_snapshot};
use macvendor::cli::Cli;
use macvendor::config::SourceConfig;
use macvendor::error::CliError;
use macvendor::resolver::{LoadOutcome, Resolver};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_filter());

    let mut stdout = std::io::stdout().lock();
    let mut stderr = std::io::stderr();
    let run_result = resolve_config(&cli, |name| std::env::var(name).ok()).and_then(|config| {
        let resolver = Resolver::from_config(config);
        run(&cli, &resolver, &mut stdout, &mut stderr)
    });
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn init_logging(filter: LevelFilter) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(filter.as_str().to_ascii_lowercase()),
    )
    .format_timestamp(None)
    .init();
}

/// Layer configuration: defaults, then `--config`, then the environment
/// read through `env`, then command-line flags.
fn resolve_config<F>(cli: &Cli, env: F) -> Result<SourceConfig, CliError>
where
    F: Fn(&str) -> Option<String>,
{
    let base = match cli.config.as_deref() {
        Some(path) => SourceConfig::from_file(path)?,
        None => SourceConfig::default(),
    };
    Ok(cli.apply_to(base.with_env_lookup(env)))
}

/// Resolve every requested address.
///
/// Returns `Ok(false)` when at least one lookup failed; those failures are
/// reported on `stderr` and do not stop the remaining lookups.
fn run(
    cli: &Cli,
    resolver: &Resolver,
    stdout: &mut dyn Write,
    stderr: &mut dyn Write,
) -> Result<bool, CliError> {
    if let Some(path) = cli.cache_file.as_deref() {
        restore_cache(resolver, path)?;
    }

    if cli.load_cache {
        bulk_load(cli, resolver, stderr)?;
    }

    let mut all_resolved = true;
    for address in &cli.addresses {
        match resolver.lookup(address) {
            Ok(record) => {
                write_line(stdout, address);
                for line in record.lines() {
                    write_line(stdout, format!("    {line}"));
                }
            }
            Err(err) => {
                write_line(stderr, format!("{address}: {err}"));
                all_resolved = false;
            }
        }
    }

    if let Some(path) = cli.cache_file.as_deref() {
        persist_cache(resolver, path)?;
    }

    Ok(all_resolved)
}

fn bulk_load(cli: &Cli, resolver: &Resolver, stderr: &mut dyn Write) -> Result<(), CliError> {
    let mut dump_file = match cli.save_dump.as_deref() {
        Some(path) => Some(BufWriter::new(File::create(path).map_err(|source| {
            CliError::DumpFile {
                path: path.to_owned(),
                source,
            }
        })?)),
        None => None,
    };
    let sink = dump_file.as_mut().map(|file| file as &mut dyn Write);

    match resolver.load_cache(None, sink) {
        LoadOutcome::Loaded { count, skipped } => {
            if !cli.quiet {
                write_line(
                    stderr,
                    format!("Loaded {count} vendor records ({skipped} skipped)."),
                );
            }
        }
        LoadOutcome::Unavailable { reason } => {
            write_line(
                stderr,
                format!("Registry dump unavailable, resolving per address: {reason}"),
            );
        }
    }
    Ok(())
}

/// Restore a snapshot written by a previous run. A missing file is not an
/// error.
fn restore_cache(resolver: &Resolver, path: &Utf8Path) -> Result<(), CliError> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            debug!("no cache snapshot at {path}");
            return Ok(());
        }
        Err(err) => return Err(cache_file_error(path, err.into())),
    };
    let count = load_snapshot(&**resolver.cache(), &mut BufReader::new(file))
        .map_err(|source| cache_file_error(path, source))?;
    debug!("restored {count} cached records from {path}");
    Ok(())
}

fn persist_cache(resolver: &Resolver, path: &Utf8Path) -> Result<(), CliError> {
    let file = File::create(path).map_err(|err| cache_file_error(path, err.into()))?;
    let mut writer = BufWriter::new(file);
    let count = save_snapshot(&**resolver.cache(), &mut writer)
        .and_then(|count| writer.flush().map(|()| count).map_err(Into::into))
        .map_err(|source| cache_file_error(path, source))?;
    debug!("saved {count} cached records to {path}");
    Ok(())
}

fn cache_file_error(path: &Utf8Path, source: macvendor::cache::SnapshotError) -> CliError {
    CliError::CacheFile {
        path: path.to_owned(),
        source,
    }
}

/// Exit code 0 when every lookup resolved, 1 when any failed, 2 when the
/// run could not start or finish its bookkeeping.
fn exit_code_for_run_result(result: Result<bool, CliError>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(true) => 0,
        Ok(false) => 1,
        Err(err) => {
            write_line(stderr, format!("error: {err}"));
            2
        }
    }
}

fn write_line(out: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(out, "{message}").is_err() {
        // Best-effort output; ignore write failures.
    }
}
