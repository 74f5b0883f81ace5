//! Clinic configuration
//!
//! Loaded from a JSON file (default `./clinicdb.json`):
//!
//! ```json
//! {
//!   "data_dir": "./clinic-data",
//!   "flush_policy": "per_operation",
//!   "log_level": "info"
//! }
//! ```
//!
//! Only `data_dir` is required.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::Severity;

/// Config file used when none is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "./clinicdb.json";

/// When index snapshots are written
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlushPolicy {
    /// After every successful insert, update, or delete
    #[default]
    PerOperation,
    /// Only when the clinic is closed
    OnClose,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Clinic configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClinicConfig {
    /// Directory holding data files and the `index/` snapshot directory
    pub data_dir: String,

    #[serde(default)]
    pub flush_policy: FlushPolicy,

    /// One of `trace`, `info`, `warn`, `error`
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl ClinicConfig {
    /// Configuration with defaults for everything but the data directory
    pub fn new(data_dir: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            flush_policy: FlushPolicy::default(),
            log_level: default_log_level(),
        }
    }

    pub fn with_flush_policy(mut self, policy: FlushPolicy) -> Self {
        self.flush_policy = policy;
        self
    }

    /// Reads and validates a config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: ClinicConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the config as pretty JSON.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(ConfigError::Invalid("data_dir must not be empty".into()));
        }
        self.log_severity()?;
        Ok(())
    }

    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    /// Minimum log severity named by `log_level`
    pub fn log_severity(&self) -> ConfigResult<Severity> {
        Severity::from_level_name(&self.log_level).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "Invalid log_level: '{}'. Expected trace, info, warn, or error.",
                self.log_level
            ))
        })
    }
}
