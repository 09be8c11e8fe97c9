//! Runtime and view settings, loadable from a JSON file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure to load a [`TrackerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        /// File that was read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file was not valid config JSON.
    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Record store runtime settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Bound of the command queue in front of the store runtime.
    pub command_queue_bound: usize,
    /// Events buffered per table before slow subscribers lag.
    pub change_feed_capacity: usize,
    /// SQLite database file; `None` keeps everything in memory.
    pub database_path: Option<PathBuf>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: 256,
            change_feed_capacity: 1024,
            database_path: None,
        }
    }
}

/// Check-in/check-out screen settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewConfig {
    /// Operator label recorded when staff leave the name blank.
    pub default_operator: String,
    /// How many entries the recent check-outs list shows.
    pub recent_check_outs_limit: usize,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            default_operator: "Staff".to_string(),
            recent_check_outs_limit: 5,
        }
    }
}

impl ViewConfig {
    /// `name` trimmed, or the default operator label when blank.
    pub fn operator_or_default(&self, name: &str) -> String {
        let name = name.trim();
        if name.is_empty() {
            self.default_operator.clone()
        } else {
            name.to_string()
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Record store settings.
    pub store: StoreConfig,
    /// View settings.
    pub view: ViewConfig,
}

impl TrackerConfig {
    /// Parses a JSON document; missing keys keep their defaults.
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Reads and parses a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }
}
