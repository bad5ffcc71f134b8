//! Configuration loading: TOML file with environment variable overrides.
//!
//! Looks for `cmdhub.toml` in the working directory, or the file named by
//! `CMDHUB_CONFIG`. Every section has a sensible default so the file is
//! optional. Environment variables take precedence over file values.

use std::time::Duration;

use serde::Deserialize;
use tracing_subscriber::EnvFilter;

use cmdhub_adapter_command_line::{BinarySensorConfig, CommandLineConfig};
use cmdhub_app::scheduler::{DEFAULT_SCAN_INTERVAL, MAX_SCAN_INTERVAL};

const DEFAULT_PATH: &str = "cmdhub.toml";
const LEGACY_PLATFORM: &str = "command_line";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Polling settings.
    pub scheduler: SchedulerConfig,
    /// The command-line integration.
    pub command_line: CommandLineConfig,
    /// Legacy platform entries, one table per sensor with a `platform` key.
    pub binary_sensor: Vec<toml::Table>,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between two updates of the same entity.
    pub scan_interval_secs: u64,
}

impl Config {
    /// Load configuration from `cmdhub.toml` (or `$CMDHUB_CONFIG`) if present,
    /// then apply environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or is
    /// malformed, or if the resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("CMDHUB_CONFIG").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(val) = var("CMDHUB_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Some(val) = var("CMDHUB_SCAN_INTERVAL")
            && let Ok(secs) = val.parse()
        {
            self.scheduler.scan_interval_secs = secs;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.scan_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "scan_interval_secs must be non-zero".to_string(),
            ));
        }
        if self.scan_interval() > MAX_SCAN_INTERVAL {
            return Err(ConfigError::Validation(format!(
                "scan_interval_secs must be at most {}",
                MAX_SCAN_INTERVAL.as_secs()
            )));
        }
        self.log_filter()?;
        self.legacy_sensors()?;
        Ok(())
    }

    /// Parse the logging filter directive.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::LogFilter`] when the directive is malformed.
    pub fn log_filter(&self) -> Result<EnvFilter, ConfigError> {
        EnvFilter::try_new(&self.logging.filter).map_err(ConfigError::LogFilter)
    }

    #[must_use]
    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler.scan_interval_secs)
    }

    /// Sensors declared as `[[binary_sensor]]` with `platform = "command_line"`.
    ///
    /// Entries for any other platform are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when a `command_line` entry is not a
    /// valid sensor configuration.
    pub fn legacy_sensors(&self) -> Result<Vec<BinarySensorConfig>, ConfigError> {
        let mut sensors = Vec::new();
        for entry in &self.binary_sensor {
            let platform = entry.get("platform").and_then(toml::Value::as_str);
            if platform != Some(LEGACY_PLATFORM) {
                tracing::debug!(?platform, "ignoring binary_sensor entry for another platform");
                continue;
            }

            let mut table = entry.clone();
            table.remove("platform");
            let sensor = toml::Value::Table(table)
                .try_into()
                .map_err(ConfigError::Parse)?;
            sensors.push(sensor);
        }
        Ok(sensors)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "cmdhubd=info,cmdhub=info".to_string(),
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            scan_interval_secs: DEFAULT_SCAN_INTERVAL.as_secs(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Malformed logging filter directive.
    #[error("invalid log filter")]
    LogFilter(#[source] tracing_subscriber::filter::ParseError),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
