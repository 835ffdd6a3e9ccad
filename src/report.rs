//! JSON payload and its destinations: stdout, `--out` file and `--post` URL.

use crate::entry::Stats;
use crate::scanner::ScanMode;
use anyhow::{Context, Result, bail};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Render `path` for output, relative to `root` when asked and possible.
pub fn format_path(path: &Path, root: &Path, relative: bool) -> String {
    if relative {
        if let Ok(rel) = path.strip_prefix(root) {
            return rel.display().to_string();
        }
    }
    path.display().to_string()
}

/// One item of the `top` list.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct TopItem {
    pub path: String,
    pub size_bytes: u64,
}

/// Serializable scan result.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Report {
    pub directory: String,
    pub mode: ScanMode,
    pub min_size: u64,
    pub count: u64,
    pub total_bytes: u64,
    pub top_n: usize,
    pub top: Vec<TopItem>,
}

impl Report {
    pub fn new(
        root: &Path,
        mode: ScanMode,
        min_size: u64,
        top_n: usize,
        stats: &Stats,
        relative: bool,
    ) -> Self {
        Self {
            directory: root.display().to_string(),
            mode,
            min_size,
            count: stats.count,
            total_bytes: stats.total_bytes,
            top_n,
            top: stats
                .top
                .iter()
                .map(|entry| TopItem {
                    path: format_path(&entry.path, root, relative),
                    size_bytes: entry.size,
                })
                .collect(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize report")
    }

    /// Write the pretty JSON payload followed by a newline.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        let mut json = self.to_json()?;
        json.push('\n');
        fs::write(path, json)
            .with_context(|| format!("Failed to write report to '{}'", path.display()))?;
        tracing::info!("payload written to {}", path.display());
        Ok(())
    }

    /// POST the payload as JSON. HTTP error statuses count as failures.
    pub fn post(&self, url: &str, timeout: Duration) -> Result<()> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        let response = client
            .post(url)
            .json(self)
            .send()
            .with_context(|| format!("HTTP POST to {url} failed"))?;

        let status = response.status();
        tracing::info!("POST {url} -> {}", status.as_u16());
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            tracing::warn!("response body (truncated): {snippet}");
            bail!("HTTP POST to {url} returned {status}");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::Entry;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn stats(root: &Path) -> Stats {
        Stats {
            count: 3,
            total_bytes: 600,
            top: vec![
                Entry::new(root.join("c.bin"), 300),
                Entry::new(root.join("sub").join("b.bin"), 200),
            ],
        }
    }

    #[test]
    fn test_format_path_absolute_is_unchanged() {
        let path = Path::new("/data/sub/file.txt");
        assert_eq!(format_path(path, Path::new("/data"), false), "/data/sub/file.txt");
        assert_eq!(format_path(path, Path::new("/other"), false), "/data/sub/file.txt");
    }

    #[test]
    fn test_format_path_relative() {
        let root = PathBuf::from("/data");
        let path = root.join("sub").join("file.txt");
        assert_eq!(
            format_path(&path, &root, true),
            Path::new("sub").join("file.txt").display().to_string()
        );
    }

    #[test]
    fn test_format_path_relative_outside_root_falls_back() {
        let path = Path::new("/elsewhere/file.txt");
        assert_eq!(format_path(path, Path::new("/data"), true), "/elsewhere/file.txt");
    }

    #[test]
    fn test_report_json_shape() {
        let root = PathBuf::from("/data");
        let report = Report::new(&root, ScanMode::File, 150, 2, &stats(&root), true);
        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(value["directory"], "/data");
        assert_eq!(value["mode"], "file");
        assert_eq!(value["min_size"], 150);
        assert_eq!(value["count"], 3);
        assert_eq!(value["total_bytes"], 600);
        assert_eq!(value["top_n"], 2);
        assert_eq!(value["top"][0]["path"], "c.bin");
        assert_eq!(value["top"][0]["size_bytes"], 300);
        assert_eq!(value["top"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("report.json");
        let report = Report::new(dir.path(), ScanMode::All, 0, 10, &stats(dir.path()), false);

        report.write_to(&out).unwrap();

        let text = fs::read_to_string(&out).unwrap();
        assert!(text.ends_with("}\n"));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["mode"], "all");
        assert_eq!(value["top"][1]["size_bytes"], 200);
    }

    #[test]
    fn test_write_to_missing_dir_fails() {
        let dir = tempdir().unwrap();
        let report = Report::new(dir.path(), ScanMode::File, 0, 10, &Stats::default(), false);
        assert!(report.write_to(&dir.path().join("no/such/report.json")).is_err());
    }
}
