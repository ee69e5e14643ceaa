//! Configuration management for esdump
//!
//! This module handles loading, parsing, and managing configuration from:
//! - Configuration files (TOML format)
//! - Default values
//!
//! Command-line arguments always take precedence over the config file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, Result};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Connection configuration
    #[serde(default)]
    pub connection: ConnectionConfig,

    /// Export defaults
    #[serde(default)]
    pub export: ExportDefaults,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Connection-related configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Default Elasticsearch host URL
    #[serde(default = "default_host")]
    pub default_host: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

/// Defaults for export runs, overridable per run from the command line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDefaults {
    /// Number of rows written between sink flushes
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Scroll page size (None leaves it to the server default)
    #[serde(default)]
    pub page_size: Option<u32>,

    /// Scroll keep-alive duration, in Elasticsearch time-unit syntax
    #[serde(default = "default_scroll")]
    pub scroll: String,

    /// Column delimiter for the output file
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// Enable timestamps in logs
    #[serde(default = "default_log_timestamps")]
    pub timestamps: bool,
}

/// Log level options
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

// Default value functions
fn default_host() -> String {
    "http://127.0.0.1:9200".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_batch_size() -> usize {
    500
}

fn default_scroll() -> String {
    "5m".to_string()
}

fn default_delimiter() -> char {
    ';'
}

fn default_log_level() -> LogLevel {
    LogLevel::Info
}

fn default_log_timestamps() -> bool {
    true
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            default_host: default_host(),
            timeout: default_timeout(),
        }
    }
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            page_size: None,
            scroll: default_scroll(),
            delimiter: default_delimiter(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            timestamps: default_log_timestamps(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file (TOML format)
    ///
    /// # Returns
    /// * `Result<Config>` - Loaded configuration or error
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path.display().to_string()))?;
        let config: Config =
            toml::from_str(&text).map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, preferring an explicit path over the default one.
    ///
    /// A missing default file is not an error; it yields `Config::default()`.
    /// An explicitly given path that cannot be read is an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::from_file(path),
            None => {
                let default = Self::default_path();
                if default.exists() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".esdump")
            .join("config.toml")
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.connection.default_host.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "connection.default_host".to_string(),
                value: String::new(),
            }
            .into());
        }
        if self.export.batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "export.batch_size".to_string(),
                value: "0".to_string(),
            }
            .into());
        }
        if self.export.scroll.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "export.scroll".to_string(),
                value: String::new(),
            }
            .into());
        }
        Ok(())
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.connection.timeout)
    }
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}
