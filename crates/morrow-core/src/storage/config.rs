//! TOML-based application configuration.
//!
//! Holds the tunable aggregation policy (risk thresholds, rolling
//! window, tier cadence). Stored at `~/.config/morrow/config.toml`;
//! a missing file yields defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::brief::aggregator::AggregatorPolicy;
use crate::error::ConfigError;

use super::data_dir;

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/morrow/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub aggregator: AggregatorPolicy,
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        data_dir()
            .map(|dir| dir.join("config.toml"))
            .map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from("~/.config/morrow"),
                message: e.to_string(),
            })
    }

    /// Load from disk, falling back to defaults when no file exists.
    ///
    /// # Errors
    /// `ConfigError` when the file exists but cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &PathBuf) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(e.to_string()))
    }

    /// Save to disk.
    ///
    /// # Errors
    /// `ConfigError` when serialization or the write fails.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &PathBuf) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(path, text).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })
    }
}
