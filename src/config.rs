//! Application configuration management.
//!
//! Settings are layered with figment, later layers overriding earlier ones:
//!
//! 1. Built-in defaults
//! 2. TOML configuration file (`--config`, else the platform config directory)
//! 3. Environment variables prefixed with `CODEDUPE_` (e.g. `CODEDUPE_THREADS=8`)
//! 4. CLI flags
//!
//! # Example
//!
//! ```toml
//! threads = 8
//! batch_size = 4096
//! single_threaded_threshold = 600000
//! line_ending = "crlf"
//! mmap = true
//! validate = false
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::cli::{LineEndingArg, ScanArgs};
use crate::detect::scan::{
    DEFAULT_BATCH_SIZE, DEFAULT_SINGLE_THREADED_THRESHOLD, DEFAULT_THREADS,
};
use crate::detect::{RecordLayout, ScanConfig};
use crate::input::RecordFileOptions;

/// Prefix for configuration environment variables.
pub const ENV_PREFIX: &str = "CODEDUPE_";

/// Errors that can occur while loading or rendering configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested configuration file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// A layer held an invalid value.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// The configuration could not be rendered as TOML.
    #[error("Failed to render configuration: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Worker threads for the parallel scan path.
    pub threads: usize,
    /// Records claimed per batch.
    pub batch_size: usize,
    /// Record count up to which the scan stays single-threaded.
    pub single_threaded_threshold: usize,
    /// Line ending of record files.
    pub line_ending: LineEndingArg,
    /// Memory-map record files.
    pub mmap: bool,
    /// Reject malformed codes before scanning.
    pub validate: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threads: DEFAULT_THREADS,
            batch_size: DEFAULT_BATCH_SIZE,
            single_threaded_threshold: DEFAULT_SINGLE_THREADED_THRESHOLD,
            line_ending: LineEndingArg::Auto,
            mmap: true,
            validate: false,
        }
    }
}

impl Config {
    /// Load defaults, the config file, and the environment.
    ///
    /// A missing default config file is not an error; a missing file passed
    /// explicitly is.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is missing or any layer is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            if !path.is_file() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
        }
        let config: Self = Self::figment(path).extract().map_err(Box::new)?;
        log::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// The layered figment behind [`load`](Self::load).
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(file) = path.map(Path::to_path_buf).or_else(Self::default_path) {
            figment = figment.merge(Toml::file(file));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Platform-specific default config file location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "codedupe", "codedupe")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Apply CLI flags on top of the loaded layers.
    pub fn apply_overrides(&mut self, args: &ScanArgs) {
        if let Some(threads) = args.threads {
            self.threads = threads;
        }
        if let Some(batch_size) = args.batch_size {
            self.batch_size = batch_size;
        }
        if let Some(threshold) = args.threshold {
            self.single_threaded_threshold = threshold;
        }
        if let Some(line_ending) = args.line_ending {
            self.line_ending = line_ending;
        }
        if args.no_mmap {
            self.mmap = false;
        }
    }

    /// Engine parameters for a file with the given layout.
    #[must_use]
    pub fn scan_config(&self, layout: RecordLayout) -> ScanConfig {
        ScanConfig::default()
            .with_threads(self.threads)
            .with_batch_size(self.batch_size)
            .with_single_threaded_threshold(self.single_threaded_threshold)
            .with_layout(layout)
    }

    /// How to open record files.
    #[must_use]
    pub fn file_options(&self) -> RecordFileOptions {
        RecordFileOptions {
            line_ending: self.line_ending.to_line_ending(),
            mmap: self.mmap,
        }
    }

    /// Render as TOML.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Render`] if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
