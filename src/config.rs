//! Configuration layers and their resolution.
//!
//! Each source (command line, environment, JSON config file) produces a
//! [`Layer`] in which every option is optional. Layers are folded in
//! precedence order and whatever is still unset takes the built-in
//! default from [`Settings::default`].

use crate::env::{EnvFile, EnvSnapshot};
use crate::error::ConfigError;
use crate::scanner::ScanMode;
use serde::Deserialize;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Variable naming the config file when `--config` is not given.
pub const CONFIG_ENV_KEY: &str = "DIRSCAN_CONFIG";

macro_rules! layered_options {
    ($($(#[$doc:meta])* $name:ident: $ty:ty = $default:expr, env $key:literal;)*) => {
        /// One configuration source. `None` means the source has no opinion.
        #[derive(Debug, Clone, Default, PartialEq, Deserialize)]
        #[serde(default)]
        pub struct Layer {
            $($(#[$doc])* pub $name: Option<$ty>,)*
        }

        impl Layer {
            /// Keep every option this layer sets, take the rest from `lower`.
            pub fn or(self, lower: Layer) -> Layer {
                Layer {
                    $($name: self.$name.or(lower.$name),)*
                }
            }

            /// Read every option from its `DIRSCAN_*` variable.
            pub fn from_env(env: &EnvSnapshot) -> Result<Layer, ConfigError> {
                Ok(Layer {
                    $($name: env.parse($key)?,)*
                })
            }
        }

        /// Fully populated option values, not yet validated.
        #[derive(Debug, Clone, PartialEq)]
        pub struct Settings {
            $($(#[$doc])* pub $name: $ty,)*
        }

        impl Default for Settings {
            fn default() -> Self {
                Self {
                    $($name: $default,)*
                }
            }
        }

        impl Settings {
            /// Replace every option `layer` sets.
            pub fn overlay(self, layer: Layer) -> Self {
                Self {
                    $($name: layer.$name.unwrap_or(self.$name),)*
                }
            }
        }
    };
}

layered_options! {
    /// Directory to scan
    directory: PathBuf = PathBuf::from("."), env "DIRSCAN_DIRECTORY";
    /// Which node types are counted
    mode: ScanMode = ScanMode::File, env "DIRSCAN_MODE";
    /// Number of largest entries to list
    top: i64 = 10, env "DIRSCAN_TOP";
    /// Minimum entry size in bytes
    min_size: i64 = 0, env "DIRSCAN_MIN_SIZE";
    /// Print paths relative to the root
    relative: bool = false, env "DIRSCAN_RELATIVE";
    /// Human-readable sizes
    human: bool = false, env "DIRSCAN_HUMAN";
    /// Log progress details to stderr
    verbose: bool = false, env "DIRSCAN_VERBOSE";
    /// Print the JSON payload instead of the report
    json: bool = false, env "DIRSCAN_JSON";
    /// URL to POST the payload to, empty to disable
    post: String = String::new(), env "DIRSCAN_POST";
    /// HTTP timeout in seconds
    timeout: f64 = 10.0, env "DIRSCAN_TIMEOUT";
    /// File to write the payload to, empty to disable
    out: PathBuf = PathBuf::new(), env "DIRSCAN_OUT";
}

/// Fold layers, earlier ones taking precedence.
pub fn merge<I>(layers: I) -> Layer
where
    I: IntoIterator<Item = Layer>,
{
    layers.into_iter().fold(Layer::default(), Layer::or)
}

/// CLI over environment over config file over `defaults`, then validated.
pub fn resolve(
    cli: Layer,
    env: Layer,
    file: Layer,
    defaults: Settings,
) -> Result<EffectiveConfig, ConfigError> {
    defaults.overlay(merge([cli, env, file])).validate()
}

/// Validated configuration for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveConfig {
    /// Canonical scan root
    pub root: PathBuf,
    pub mode: ScanMode,
    pub top: usize,
    pub min_size: u64,
    pub relative: bool,
    pub human: bool,
    pub verbose: bool,
    pub json: bool,
    pub post: Option<String>,
    pub timeout: Duration,
    pub out: Option<PathBuf>,
}

impl EffectiveConfig {
    /// Whether any output needs the JSON payload.
    pub fn wants_payload(&self) -> bool {
        self.json || self.post.is_some() || self.out.is_some()
    }
}

impl Settings {
    /// Reject invalid values. Nothing is defaulted here.
    pub fn validate(self) -> Result<EffectiveConfig, ConfigError> {
        let root = resolve_root(&self.directory)?;

        if self.top < 0 {
            return Err(ConfigError::Negative {
                option: "--top",
                value: self.top,
            });
        }
        if self.min_size < 0 {
            return Err(ConfigError::Negative {
                option: "--min-size",
                value: self.min_size,
            });
        }
        let timeout = match Duration::try_from_secs_f64(self.timeout) {
            Ok(timeout) if !timeout.is_zero() => timeout,
            _ => return Err(ConfigError::InvalidTimeout(self.timeout)),
        };

        Ok(EffectiveConfig {
            root,
            mode: self.mode,
            top: usize::try_from(self.top).unwrap_or(usize::MAX),
            min_size: self.min_size.unsigned_abs(),
            relative: self.relative,
            human: self.human,
            verbose: self.verbose,
            json: self.json,
            post: Some(self.post).filter(|url| !url.is_empty()),
            timeout,
            out: Some(self.out).filter(|path| !path.as_os_str().is_empty()),
        })
    }
}

fn resolve_root(directory: &Path) -> Result<PathBuf, ConfigError> {
    let root = directory
        .canonicalize()
        .map_err(|_| ConfigError::MissingRoot(directory.to_path_buf()))?;
    if !root.is_dir() {
        return Err(ConfigError::NotADirectory(root));
    }
    Ok(root)
}

/// Load a JSON config file. A missing file yields `None`.
pub fn load_config_file(path: &Path) -> Result<Option<Layer>, ConfigError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(ConfigError::ConfigRead {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|source| ConfigError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
}

/// Command-line options that locate the other layers.
#[derive(Debug, Clone, Default)]
pub struct Locators {
    pub config: Option<PathBuf>,
    pub env_file: Option<PathBuf>,
}

/// Where the environment and file layers were read from.
#[derive(Debug, Clone, Default)]
pub struct Sources {
    pub env_file: Option<PathBuf>,
    /// Line numbers skipped in the env file
    pub malformed_env_lines: Vec<usize>,
    pub config_file: Option<PathBuf>,
    /// False when `config_file` was named but does not exist
    pub config_found: bool,
}

/// Effective configuration plus the sources it was built from.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub config: EffectiveConfig,
    pub sources: Sources,
}

/// Build every layer and resolve them.
///
/// `os_env` is the process environment; the env file named by the
/// locators is laid over it before any option is read.
pub fn load<I>(cli: Layer, locators: &Locators, os_env: I) -> Result<Resolved, ConfigError>
where
    I: IntoIterator<Item = (String, OsString)>,
{
    let env_file = match &locators.env_file {
        Some(path) => EnvFile::load(path)?,
        None => EnvFile::default(),
    };
    let malformed_env_lines = env_file.malformed;
    let env = EnvSnapshot::new(os_env, env_file.vars);

    let config_file = match &locators.config {
        Some(path) => Some(path.clone()),
        None => env.parse::<PathBuf>(CONFIG_ENV_KEY)?,
    };
    let file_layer = match &config_file {
        Some(path) => load_config_file(path)?,
        None => None,
    };
    let config_found = file_layer.is_some();

    let config = resolve(
        cli,
        Layer::from_env(&env)?,
        file_layer.unwrap_or_default(),
        Settings::default(),
    )?;

    Ok(Resolved {
        config,
        sources: Sources {
            env_file: locators.env_file.clone(),
            malformed_env_lines,
            config_file,
            config_found,
        },
    })
}
