//! Human-readable report.

use crate::config::EffectiveConfig;
use crate::entry::{Entry, Stats};
use crate::report::format_path;
use humansize::{BINARY, format_size};
use owo_colors::OwoColorize;
use std::path::Path;

/// Display configuration
pub struct Display {
    /// Render sizes with binary units instead of raw bytes
    pub human: bool,
    /// Print paths relative to the root
    pub relative: bool,
    /// Maximum path width before truncation
    pub max_path_width: usize,
}

impl Default for Display {
    fn default() -> Self {
        Self {
            human: false,
            relative: false,
            max_path_width: 60,
        }
    }
}

impl Display {
    /// Create a new Display with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_human(mut self, human: bool) -> Self {
        self.human = human;
        self
    }

    pub fn with_relative(mut self, relative: bool) -> Self {
        self.relative = relative;
        self
    }

    fn size(&self, bytes: u64) -> String {
        if self.human {
            format_size(bytes, BINARY)
        } else {
            bytes.to_string()
        }
    }

    /// Print the scan results to stdout
    pub fn print_results(&self, stats: &Stats, config: &EffectiveConfig, skipped: u64) {
        let root = config.root.as_path();

        println!();
        println!("{}", "═".repeat(70).dimmed());
        println!("{}", format!(" Disk Usage Report: {}", root.display()).bold());
        println!("{}", "═".repeat(70).dimmed());
        println!();

        println!("  {} {}", "Mode:      ".dimmed(), config.mode.cyan());
        println!("  {} {}", "Min size:  ".dimmed(), self.size(config.min_size));
        println!("  {} {}", "Relative:  ".dimmed(), config.relative);
        println!("  {} {}", "Count:     ".dimmed(), stats.count.to_string().cyan());
        println!(
            "  {} {}",
            "Total size:".dimmed(),
            self.size(stats.total_bytes).green().bold()
        );

        if skipped > 0 {
            println!(
                "  {} {} (permission denied or inaccessible)",
                "Skipped:   ".dimmed(),
                skipped.to_string().red()
            );
        }

        println!();

        if config.top == 0 {
            println!("{}", "═".repeat(70).dimmed());
            return;
        }

        println!("{}", "─".repeat(70).dimmed());
        println!("{}", format!(" Top {} by size:", config.top).bold());
        println!("{}", "─".repeat(70).dimmed());
        println!();

        println!("  {:>12}  {}", "SIZE".dimmed().bold(), "PATH".dimmed().bold());
        println!("  {:>12}  {}", "────".dimmed(), "────".dimmed());

        if stats.top.is_empty() {
            println!("  {}", "No entries found.".dimmed());
        } else {
            for entry in &stats.top {
                self.print_entry(entry, root);
            }
        }

        println!();
        println!("{}", "═".repeat(70).dimmed());
    }

    /// Print a single entry
    fn print_entry(&self, entry: &Entry, root: &Path) {
        let path = format_path(&entry.path, root, self.relative);
        println!(
            "  {:>12}  {}",
            self.size(entry.size).green(),
            self.truncate_path(&path)
        );
    }

    /// Truncate a path if it's too long
    fn truncate_path(&self, path: &str) -> String {
        let chars: Vec<char> = path.chars().collect();
        if chars.len() <= self.max_path_width {
            path.to_string()
        } else {
            let start = chars.len() - self.max_path_width + 3;
            format!("...{}", chars[start..].iter().collect::<String>())
        }
    }
}
