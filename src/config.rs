//! Runtime configuration
//!
//! Loaded from an optional JSON file, then overridden by environment
//! variables:
//!
//! - `REWARDS_LEDGER_SHARDS`: number of ledger shards
//! - `REWARDS_LEDGER_LOG_LEVEL`: default log filter when `RUST_LOG` is unset
//! - `REWARDS_LEDGER_LOG_FORMAT`: `pretty` or `json`

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_SHARDS: &str = "REWARDS_LEDGER_SHARDS";
pub const ENV_LOG_LEVEL: &str = "REWARDS_LEDGER_LOG_LEVEL";
pub const ENV_LOG_FORMAT: &str = "REWARDS_LEDGER_LOG_FORMAT";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
}

/// Ledger configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Number of independent ledger shards
    #[serde(default = "default_num_shards")]
    pub num_shards: usize,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

fn default_num_shards() -> usize {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            num_shards: default_num_shards(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LedgerConfig {
    /// Parse a JSON config document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    /// Load the optional file, then apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup such as the process environment
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_SHARDS) {
            self.num_shards = value
                .trim()
                .parse()
                .map_err(|_| invalid(ENV_SHARDS, &value))?;
        }

        if let Some(value) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = value;
        }

        if let Some(value) = lookup(ENV_LOG_FORMAT) {
            self.logging.format = match value.trim().to_ascii_lowercase().as_str() {
                "pretty" => LogFormat::Pretty,
                "json" => LogFormat::Json,
                _ => return Err(invalid(ENV_LOG_FORMAT, &value)),
            };
        }

        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.num_shards == 0 {
            return Err(invalid("num_shards", "0"));
        }
        Ok(())
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}
