//! Command-line integration configuration.

use std::num::NonZeroU64;
use std::time::Duration;

use serde::Deserialize;

use cmdhub_domain::binary_sensor::BinarySensorDeviceClass;
use cmdhub_domain::error::ValidationError;

use crate::error::CommandLineError;

pub const DEFAULT_NAME: &str = "Binary Command Sensor";
pub const DEFAULT_PAYLOAD_ON: &str = "ON";
pub const DEFAULT_PAYLOAD_OFF: &str = "OFF";
/// Seconds a command may run before it is killed.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Where a sensor's configuration came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// The `[command_line]` section.
    Integration,
    /// A `[[binary_sensor]]` entry with `platform = "command_line"`.
    /// Still accepted, but deprecated.
    LegacyPlatform,
}

/// The `[command_line]` configuration section.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CommandLineConfig {
    pub binary_sensor: Vec<BinarySensorConfig>,
}

/// One command-backed binary sensor.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BinarySensorConfig {
    /// Shell command whose output decides the state.
    pub command: String,
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_payload_on")]
    pub payload_on: String,
    #[serde(default = "default_payload_off")]
    pub payload_off: String,
    #[serde(default)]
    pub device_class: Option<BinarySensorDeviceClass>,
    /// Jinja template applied to the output before comparison.
    #[serde(default)]
    pub value_template: Option<String>,
    /// Timeout in seconds.
    #[serde(default = "default_timeout")]
    pub command_timeout: NonZeroU64,
    #[serde(default)]
    pub unique_id: Option<String>,
}

fn default_name() -> String {
    DEFAULT_NAME.to_string()
}

fn default_payload_on() -> String {
    DEFAULT_PAYLOAD_ON.to_string()
}

fn default_payload_off() -> String {
    DEFAULT_PAYLOAD_OFF.to_string()
}

fn default_timeout() -> NonZeroU64 {
    NonZeroU64::new(DEFAULT_TIMEOUT_SECS).unwrap_or(NonZeroU64::MIN)
}

impl BinarySensorConfig {
    /// A configuration for `command` with every optional field defaulted.
    #[must_use]
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            name: default_name(),
            payload_on: default_payload_on(),
            payload_off: default_payload_off(),
            device_class: None,
            value_template: None,
            command_timeout: default_timeout(),
            unique_id: None,
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout.get())
    }

    /// Check what serde cannot: non-empty command and name.
    ///
    /// The value template is checked when the sensor compiles it.
    ///
    /// # Errors
    ///
    /// Returns [`CommandLineError::Invalid`].
    pub fn validate(&self) -> Result<(), CommandLineError> {
        if self.command.trim().is_empty() {
            return Err(CommandLineError::Invalid(ValidationError::EmptyCommand));
        }
        if self.name.trim().is_empty() {
            return Err(CommandLineError::Invalid(ValidationError::EmptyName));
        }
        Ok(())
    }
}
