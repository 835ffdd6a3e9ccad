//! Scan progress spinner on stderr.

use crate::entry::{Entry, Stats};
use humansize::{BINARY, format_size};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

/// Spinner that follows the entry stream. Draws nothing when disabled or
/// when stderr is not a terminal.
pub struct Progress {
    pb: ProgressBar,
    start_time: Instant,
    last_update: Instant,
    entries: u64,
    bytes: u64,
}

impl Progress {
    pub fn new(enabled: bool) -> Self {
        let pb = if enabled {
            ProgressBar::new_spinner()
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting scan...");

        let now = Instant::now();
        Self {
            pb,
            start_time: now,
            last_update: now,
            entries: 0,
            bytes: 0,
        }
    }

    /// Count an entry and refresh the message, throttled to avoid flicker.
    pub fn observe(&mut self, entry: &Entry) {
        self.entries += 1;
        self.bytes = self.bytes.saturating_add(entry.size);

        if self.last_update.elapsed() >= Duration::from_millis(50) {
            self.last_update = Instant::now();
            self.pb.set_message(format!(
                "Scanning: {} | {} entries | {}",
                truncate_str(&entry.path.display().to_string(), 30),
                format_number(self.entries),
                format_size(self.bytes, BINARY)
            ));
        }
    }

    pub fn finish(&self, stats: &Stats) {
        self.pb.finish_with_message(format!(
            "Done! {} entries ({}) in {}",
            format_number(stats.count),
            format_size(stats.total_bytes, BINARY),
            format_duration(self.start_time.elapsed())
        ));
    }
}

/// Format a number with thousand separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Keep the tail of a string, prefixed with an ellipsis when cut
fn truncate_str(s: &str, max_len: usize) -> String {
    let count = s.chars().count();
    if count <= max_len {
        s.to_string()
    } else {
        let tail: String = s.chars().skip(count - max_len.saturating_sub(3)).collect();
        format!("...{tail}")
    }
}

/// Format a duration in human-readable form
fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs >= 60 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}.{:02}s", secs, millis / 10)
    } else {
        format!("{}ms", millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("short", 10), "short");
        assert_eq!(truncate_str("this is a long string", 10), "... string");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.50s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
    }

    #[test]
    fn test_hidden_progress_counts() {
        let mut progress = Progress::new(false);
        progress.observe(&Entry::new(PathBuf::from("a"), 10));
        progress.observe(&Entry::new(PathBuf::from("b"), 20));
        assert_eq!(progress.entries, 2);
        assert_eq!(progress.bytes, 30);
        progress.finish(&Stats::default());
    }
}
