//! Environment layer: `.env` file parsing and the merged environment snapshot.

use crate::error::ConfigError;
use crate::scanner::ScanMode;
use clap::ValueEnum;
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::path::{Path, PathBuf};

/// Parsed `KEY=VALUE` file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnvFile {
    pub vars: HashMap<String, String>,
    /// 1-based numbers of lines that were not `KEY=VALUE`
    pub malformed: Vec<usize>,
}

impl EnvFile {
    /// Read and parse an env file. Malformed lines are skipped, an
    /// unreadable file is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::EnvFileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&text))
    }

    pub fn parse(text: &str) -> Self {
        let mut file = Self::default();
        for (idx, row) in text.lines().enumerate() {
            let line = row.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let line = line
                .strip_prefix("export ")
                .map_or(line, str::trim_start);
            let Some((key, value)) = line.split_once('=') else {
                file.malformed.push(idx + 1);
                continue;
            };
            let key = key.trim();
            if key.is_empty() {
                file.malformed.push(idx + 1);
                continue;
            }
            file.vars.insert(key.to_string(), unquote(value.trim()).to_string());
        }
        file
    }
}

/// Strip one pair of matching surrounding quotes.
fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Immutable view of the environment with the env file laid over the
/// process environment.
#[derive(Debug, Default, Clone)]
pub struct EnvSnapshot {
    file: HashMap<String, String>,
    os: HashMap<String, OsString>,
}

impl EnvSnapshot {
    pub fn new<I>(os: I, file: HashMap<String, String>) -> Self
    where
        I: IntoIterator<Item = (String, OsString)>,
    {
        Self {
            file,
            os: os.into_iter().collect(),
        }
    }

    /// The env-file value wins over the process environment. Empty values
    /// count as unset and fall through.
    pub fn get(&self, key: &str) -> Option<&OsStr> {
        let file = self.file.get(key).map(OsStr::new);
        let os = self.os.get(key).map(OsString::as_os_str);
        [file, os].into_iter().flatten().find(|value| !value.is_empty())
    }

    /// Look up `key` and parse it into the option's type.
    pub fn parse<T: EnvValue>(&self, key: &'static str) -> Result<Option<T>, ConfigError> {
        self.get(key)
            .map(|raw| {
                T::parse_os(raw).map_err(|reason| ConfigError::InvalidValue {
                    key,
                    value: raw.to_string_lossy().into_owned(),
                    reason,
                })
            })
            .transpose()
    }
}

/// The current process environment. Values are kept as OS strings so that
/// non-UTF-8 paths survive; variables whose name is not UTF-8 can never be
/// one of ours and are left out.
pub fn process_vars() -> impl Iterator<Item = (String, OsString)> {
    std::env::vars_os().filter_map(|(key, value)| Some((key.into_string().ok()?, value)))
}

/// Types an environment string can be parsed into.
pub trait EnvValue: Sized {
    fn parse_env(raw: &str) -> Result<Self, String>;

    /// Parse a raw OS value. Only types that can hold arbitrary OS strings
    /// accept non-UTF-8 input.
    fn parse_os(raw: &OsStr) -> Result<Self, String> {
        raw.to_str()
            .ok_or_else(|| "not valid UTF-8".to_string())
            .and_then(Self::parse_env)
    }
}

impl EnvValue for i64 {
    fn parse_env(raw: &str) -> Result<Self, String> {
        raw.trim().parse().map_err(|e| format!("expected an integer: {e}"))
    }
}

impl EnvValue for f64 {
    fn parse_env(raw: &str) -> Result<Self, String> {
        raw.trim().parse().map_err(|e| format!("expected a number: {e}"))
    }
}

impl EnvValue for bool {
    fn parse_env(raw: &str) -> Result<Self, String> {
        parse_bool(raw).ok_or_else(|| "expected one of 1/0, true/false, yes/no, y/n, on/off".into())
    }
}

impl EnvValue for String {
    fn parse_env(raw: &str) -> Result<Self, String> {
        Ok(raw.to_string())
    }
}

impl EnvValue for PathBuf {
    fn parse_env(raw: &str) -> Result<Self, String> {
        Ok(PathBuf::from(raw))
    }

    fn parse_os(raw: &OsStr) -> Result<Self, String> {
        Ok(PathBuf::from(raw))
    }
}

impl EnvValue for ScanMode {
    fn parse_env(raw: &str) -> Result<Self, String> {
        ScanMode::from_str(raw.trim(), true)
    }
}

/// Case-insensitive boolean tokens.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}
