//! Configuration for the Seedbed journaling core
//!
//! The core needs very little: where the database file lives and how often the
//! rollover watcher checks for a date change. Values come from an optional TOML
//! file, environment variables, or platform defaults, in that order of
//! precedence for the caller to compose.

use crate::error::{JournalError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the database path
pub const DB_PATH_ENV: &str = "SEEDBED_DB_PATH";

/// Default period of the rollover watcher, in seconds
pub const DEFAULT_ROLLOVER_CHECK_SECS: u64 = 60;

/// Runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JournalConfig {
    /// Path to the database file
    pub db_path: PathBuf,

    /// Seconds between periodic rollover checks
    pub rollover_check_secs: u64,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            rollover_check_secs: DEFAULT_ROLLOVER_CHECK_SECS,
        }
    }
}

impl JournalConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&raw).map_err(|e| {
            JournalError::Config(format!(
                "failed to parse {}: {}",
                path.as_ref().display(),
                e
            ))
        })
    }

    /// Build a config from the environment, falling back to defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(path) = std::env::var(DB_PATH_ENV) {
            if !path.is_empty() {
                config.db_path = PathBuf::from(path);
            }
        }
        config
    }

    /// Override the database path
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = path.into();
        self
    }
}

/// Default database location under the platform data directory
fn default_db_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("seedbed")
        .join("seedbed.db")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = JournalConfig::default();
        assert_eq!(config.rollover_check_secs, DEFAULT_ROLLOVER_CHECK_SECS);
        assert!(config.db_path.ends_with("seedbed.db"));
    }

    #[test]
    fn test_config_from_toml() {
        let config: JournalConfig =
            toml::from_str("db_path = \"/tmp/j.db\"\nrollover_check_secs = 5\n").unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/j.db"));
        assert_eq!(config.rollover_check_secs, 5);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: JournalConfig = toml::from_str("db_path = \"/tmp/j.db\"\n").unwrap();
        assert_eq!(config.rollover_check_secs, DEFAULT_ROLLOVER_CHECK_SECS);
    }
}
