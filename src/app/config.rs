use super::initialization::InitializationError;
use crate::source::DEFAULT_HISTORY_CAPACITY;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("File error: {0}")]
    FileError(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Level filter for the bridge's own tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl FilterLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterLevel::Error => "error",
            FilterLevel::Warn => "warn",
            FilterLevel::Info => "info",
            FilterLevel::Debug => "debug",
            FilterLevel::Trace => "trace",
        }
    }
}

impl FromStr for FilterLevel {
    type Err = InitializationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(FilterLevel::Error),
            "warn" | "warning" => Ok(FilterLevel::Warn),
            "info" => Ok(FilterLevel::Info),
            "debug" => Ok(FilterLevel::Debug),
            "trace" => Ok(FilterLevel::Trace),
            _ => Err(InitializationError::InvalidLogLevel {
                input: s.to_string(),
                valid_levels: ["error", "warn", "info", "debug", "trace"]
                    .iter()
                    .map(|l| l.to_string())
                    .collect(),
            }),
        }
    }
}

impl From<FilterLevel> for tracing::Level {
    fn from(level: FilterLevel) -> Self {
        match level {
            FilterLevel::Error => tracing::Level::ERROR,
            FilterLevel::Warn => tracing::Level::WARN,
            FilterLevel::Info => tracing::Level::INFO,
            FilterLevel::Debug => tracing::Level::DEBUG,
            FilterLevel::Trace => tracing::Level::TRACE,
        }
    }
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable single-line output
    #[default]
    Compact,
    /// One JSON object per line
    Json,
}

#[derive(Parser, Debug, Clone, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// Default level of the backend subscriber
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: FilterLevel,

    /// Output format (compact or json)
    #[arg(long, env = "LOG_FORMAT", default_value = "compact")]
    pub log_format: LogFormat,

    /// Extra per-logger filter directives, e.g. `org.example.web=warn`.
    /// Malformed directives are skipped and unknown levels fall back to `info`.
    #[arg(long = "log-directive", env = "LOG_DIRECTIVES", value_delimiter = ',')]
    pub log_directives: Vec<String>,

    /// Number of entries each log source keeps for replay
    #[arg(long, env = "HISTORY_CAPACITY", default_value_t = DEFAULT_HISTORY_CAPACITY)]
    pub history_capacity: usize,

    /// Framework start level when the bridge comes up
    #[arg(long, env = "INITIAL_START_LEVEL", default_value = "1")]
    pub initial_start_level: i32,

    /// Start level the framework advances to after startup
    #[arg(long, env = "TARGET_START_LEVEL", default_value = "20")]
    pub target_start_level: i32,

    /// Configuration file path (optional)
    #[arg(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: FilterLevel::Info,
            log_format: LogFormat::Compact,
            log_directives: Vec::new(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            initial_start_level: 1,
            target_start_level: 20,
            config_file: None,
        }
    }
}

impl Config {
    pub fn from_args_and_env<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = Config::try_parse_from(args)
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;

        // A config file replaces the command line values
        if let Some(path) = &config.config_file {
            let mut from_file = Self::from_file(path)?;
            from_file.config_file = Some(path.clone());
            return Ok(from_file);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_capacity == 0 {
            return Err(ConfigError::InvalidConfig(
                "History capacity must be greater than 0".to_string(),
            ));
        }

        if self.initial_start_level < 0 {
            return Err(ConfigError::InvalidConfig(format!(
                "Initial start level must not be negative: {}",
                self.initial_start_level
            )));
        }

        if self.target_start_level < self.initial_start_level {
            return Err(ConfigError::InvalidConfig(format!(
                "Target start level ({}) must be at least the initial start level ({})",
                self.target_start_level, self.initial_start_level
            )));
        }

        Ok(())
    }
}
