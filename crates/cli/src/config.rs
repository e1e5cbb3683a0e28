//! Configuration file
//!
//! Optional TOML file. Looked up at `--config <path>` when given, otherwise
//! at `$XDG_CONFIG_HOME/inwatch/config.toml`; built-in defaults apply when
//! neither exists.

use anyhow::{Context, Result};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::level_filters::LevelFilter;
use watcher::{DEFAULT_BUFFER_SIZE, MIN_BUFFER_SIZE};

/// Largest accepted read buffer
pub const MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Read buffer size in bytes (default: 4096)
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Printed in place of the path for unknown watch descriptors
    #[serde(default = "default_unknown_path")]
    pub unknown_path: String,

    /// strftime format for event timestamps
    #[serde(default = "default_time_format")]
    pub time_format: String,

    /// Print timestamps in UTC instead of local time
    #[serde(default)]
    pub utc: bool,

    /// Colorize event kinds
    #[serde(default)]
    pub color: bool,

    /// Log level (off, error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            unknown_path: default_unknown_path(),
            time_format: default_time_format(),
            utc: false,
            color: false,
            log_level: default_log_level(),
        }
    }
}

fn default_buffer_size() -> usize {
    DEFAULT_BUFFER_SIZE
}

fn default_unknown_path() -> String {
    "<unknown>".to_string()
}

fn default_time_format() -> String {
    "%Y-%m-%d %H:%M:%S".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Config {
    /// Load from `explicit`, else from the default location, else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match config_file_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Parse and validate a config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_BUFFER_SIZE..=MAX_BUFFER_SIZE).contains(&self.buffer_size) {
            anyhow::bail!(
                "buffer_size must be between {} and {} (got {})",
                MIN_BUFFER_SIZE,
                MAX_BUFFER_SIZE,
                self.buffer_size
            );
        }

        if StrftimeItems::new(&self.time_format).any(|item| matches!(item, Item::Error)) {
            anyhow::bail!("time_format is not a valid strftime format: {:?}", self.time_format);
        }

        self.log_filter()?;
        Ok(())
    }

    /// Parsed `log_level`
    pub fn log_filter(&self) -> Result<LevelFilter> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| anyhow::anyhow!("Unknown log_level: {:?}", self.log_level))
    }
}

/// Default config file location
pub fn config_file_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("inwatch").join("config.toml"))
}
