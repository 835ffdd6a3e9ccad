//! Command-line argument parsing using clap derive macros.
//!
//! Nothing here carries a default value: an option the user did not type
//! stays `None` so lower configuration layers can fill it.

use crate::config::{Layer, Locators};
use crate::scanner::ScanMode;
use clap::Parser;
use std::path::PathBuf;

/// List the largest files under a directory.
///
/// Options may also come from DIRSCAN_* environment variables (an --env-file
/// overrides the process environment) or a JSON config file. Command line
/// beats environment, environment beats config file.
#[derive(Parser, Debug)]
#[command(name = "dirscan")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Directory to scan [default: .]
    #[arg(value_name = "DIRECTORY")]
    pub directory: Option<PathBuf>,

    /// Which entries to count [default: file]
    #[arg(long, value_enum)]
    pub mode: Option<ScanMode>,

    /// Number of largest entries to list, 0 disables the list [default: 10]
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub top: Option<i64>,

    /// Only count entries of at least this many bytes [default: 0]
    #[arg(long, value_name = "BYTES", allow_negative_numbers = true)]
    pub min_size: Option<i64>,

    /// Print paths relative to the scanned directory
    #[arg(long)]
    pub relative: bool,

    /// Print sizes in human-readable units
    #[arg(long)]
    pub human: bool,

    /// Log scan details to stderr
    #[arg(long)]
    pub verbose: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// POST the JSON result to this URL
    #[arg(long, value_name = "URL")]
    pub post: Option<String>,

    /// Timeout for --post in seconds [default: 10.0]
    #[arg(long, value_name = "SECONDS", allow_negative_numbers = true)]
    pub timeout: Option<f64>,

    /// JSON config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write the JSON result to this file
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// Load KEY=VALUE pairs that override the process environment
    #[arg(long, value_name = "PATH")]
    pub env_file: Option<PathBuf>,
}

impl Args {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Options the user set explicitly. Flags only count when present.
    pub fn layer(&self) -> Layer {
        Layer {
            directory: self.directory.clone(),
            mode: self.mode,
            top: self.top,
            min_size: self.min_size,
            relative: self.relative.then_some(true),
            human: self.human.then_some(true),
            verbose: self.verbose.then_some(true),
            json: self.json.then_some(true),
            post: self.post.clone(),
            timeout: self.timeout,
            out: self.out.clone(),
        }
    }

    pub fn locators(&self) -> Locators {
        Locators {
            config: self.config.clone(),
            env_file: self.env_file.clone(),
        }
    }
}
