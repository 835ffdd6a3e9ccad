//! dirscan: list the largest files under a directory.
//!
//! Options are layered: command line over environment (an env file overrides
//! the process environment) over a JSON config file over built-in defaults.
//! The scan tolerates unreadable entries and reports the count, total size
//! and the top-N largest entries as a text report or JSON.

mod cli;
mod config;
mod display;
mod entry;
mod env;
mod error;
mod progress;
mod report;
mod scanner;

use anyhow::{Context, Result};
use cli::Args;
use config::{Resolved, Sources};
use display::Display;
use entry::aggregate;
use error::ConfigError;
use progress::Progress;
use report::Report;
use scanner::Scanner;
use std::process::ExitCode;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{Registry, fmt, reload};

/// Exit code for invalid user input or configuration values.
const EXIT_INPUT_ERROR: u8 = 2;

type LevelHandle = reload::Handle<LevelFilter, Registry>;

fn main() -> ExitCode {
    let args = Args::parse_args();
    let log_level = init_logging(args.verbose);

    match run(&args, &log_level) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            exit_code(&err)
        }
    }
}

fn exit_code(err: &anyhow::Error) -> ExitCode {
    let input_error = err.chain().any(|cause| {
        cause
            .downcast_ref::<ConfigError>()
            .is_some_and(ConfigError::is_input_error)
    });
    if input_error {
        ExitCode::from(EXIT_INPUT_ERROR)
    } else {
        ExitCode::FAILURE
    }
}

fn level(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::INFO
    } else {
        LevelFilter::WARN
    }
}

/// Logs go to stderr. The level starts from the command line and is
/// adjusted once the effective configuration is known.
fn init_logging(verbose: bool) -> LevelHandle {
    let (filter, handle) = reload::Layer::new(level(verbose));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
    handle
}

fn log_sources(sources: &Sources) {
    if let Some(path) = &sources.env_file {
        tracing::info!("env file loaded: {}", path.display());
    }
    if !sources.malformed_env_lines.is_empty() {
        tracing::warn!(
            "env file: ignored malformed lines {:?}",
            sources.malformed_env_lines
        );
    }
    if let Some(path) = &sources.config_file {
        if sources.config_found {
            tracing::info!("config loaded: {}", path.display());
        } else {
            tracing::info!("config file not found, skipping: {}", path.display());
        }
    }
}

fn run(args: &Args, log_level: &LevelHandle) -> Result<()> {
    let Resolved { config, sources } =
        config::load(args.layer(), &args.locators(), env::process_vars())?;

    if let Err(err) = log_level.modify(|filter| *filter = level(config.verbose)) {
        tracing::warn!("cannot change log level: {err}");
    }
    log_sources(&sources);

    tracing::info!(
        "scan start: root={} mode={} min_size={} top={}",
        config.root.display(),
        config.mode,
        config.min_size,
        config.top
    );

    let mut skipped = 0u64;
    let mut progress = Progress::new(!config.json && !config.verbose);
    let entries = Scanner::new()
        .with_mode(config.mode)
        .with_min_size(config.min_size)
        .scan(&config.root, |path, reason| {
            skipped += 1;
            tracing::info!("[skip] {}: {reason}", path.display());
        })
        .with_context(|| format!("Failed to scan '{}'", config.root.display()))?;

    let stats = aggregate(entries.inspect(|entry| progress.observe(entry)), config.top)
        .with_context(|| format!("Failed to scan '{}'", config.root.display()))?;
    progress.finish(&stats);

    tracing::info!(
        "scan done: count={} total_bytes={} skipped={}",
        stats.count,
        stats.total_bytes,
        skipped
    );

    if config.wants_payload() {
        let report = Report::new(
            &config.root,
            config.mode,
            config.min_size,
            config.top,
            &stats,
            config.relative,
        );

        if config.json {
            println!("{}", report.to_json()?);
        }
        if let Some(out) = &config.out {
            report.write_to(out)?;
        }
        if let Some(url) = &config.post {
            report.post(url, config.timeout)?;
        }
    }

    if !config.json {
        Display::new()
            .with_human(config.human)
            .with_relative(config.relative)
            .print_results(&stats, &config, skipped);
    }

    Ok(())
}
