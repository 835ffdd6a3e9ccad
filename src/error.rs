//! Error types for configuration resolution and scanning.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failures while building the effective configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read env file '{}': {source}", path.display())]
    EnvFileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("cannot read config file '{}': {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed config file '{}': {source}", path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {key}: '{value}' ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{option} must be 0 or greater, got {value}")]
    Negative { option: &'static str, value: i64 },

    #[error("--timeout must be a positive number of seconds, got {0}")]
    InvalidTimeout(f64),

    #[error("directory does not exist: {}", .0.display())]
    MissingRoot(PathBuf),

    #[error("not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
}

impl ConfigError {
    /// Whether the user supplied an invalid value, as opposed to a broken
    /// or unreadable configuration source.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidValue { .. }
                | Self::Negative { .. }
                | Self::InvalidTimeout(_)
                | Self::MissingRoot(_)
                | Self::NotADirectory(_)
        )
    }
}

/// Failures that abort a scan. Per-entry failures never end up here.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("cannot access '{}': {source}", path.display())]
    RootAccess {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("'{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("total size overflows u64 after {count} entries")]
    TotalOverflow { count: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_error_classification() {
        assert!(ConfigError::Negative { option: "--top", value: -1 }.is_input_error());
        assert!(ConfigError::MissingRoot(PathBuf::from("/nope")).is_input_error());

        let parse = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ConfigError::ConfigParse {
            path: PathBuf::from("config.json"),
            source: parse,
        };
        assert!(!err.is_input_error());
        assert!(err.to_string().starts_with("malformed config file 'config.json'"));
    }
}
