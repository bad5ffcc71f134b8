//! # cmdhub-adapter-command-line
//!
//! Command-line integration: binary sensors whose state is derived from the
//! output of a shell command run on every scheduler tick.
//!
//! ## How a sensor is evaluated
//!
//! | Step | What happens |
//! |------|--------------|
//! | run | `sh -c <command>` with `command_timeout`, stdout trimmed |
//! | transform | optional `value_template` sees `value` / `value_json` |
//! | compare | `payload_on` → `on`, `payload_off` → `off`, else `unknown` |
//!
//! A failed or timed-out command yields `unknown`. A template that fails to
//! render is reported to the host, which marks the entity `unavailable`.
//!
//! ## Dependency rule
//!
//! Depends on `cmdhub-app` (port traits, templates) and `cmdhub-domain` only.

pub mod binary_sensor;
pub mod config;
pub mod data;
pub mod error;
pub mod runner;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use cmdhub_app::ports::{Integration, IntegrationContext};
use cmdhub_domain::error::HubError;
use cmdhub_domain::issue::{Issue, IssueSeverity};

pub use binary_sensor::CommandBinarySensor;
pub use config::{BinarySensorConfig, CommandLineConfig, ConfigSource};
pub use error::CommandLineError;
pub use runner::{CommandRunner, ShellCommandRunner};

/// Integration name, also the domain of the issues it raises.
pub const DOMAIN: &str = "command_line";

/// Id of the issue raised when sensors are configured through the legacy
/// `[[binary_sensor]]` platform path.
pub const DEPRECATED_PLATFORM_ISSUE_ID: &str = "deprecated_yaml_binary_sensor";

/// Integration that turns shell commands into binary sensors.
pub struct CommandLineIntegration<R = ShellCommandRunner> {
    runner: Arc<R>,
    sensors: Vec<(BinarySensorConfig, ConfigSource)>,
}

impl Default for CommandLineIntegration {
    fn default() -> Self {
        Self::with_runner(ShellCommandRunner)
    }
}

impl CommandLineIntegration {
    /// Build the integration from the `[command_line]` section plus any
    /// sensors found under the legacy platform path.
    #[must_use]
    pub fn from_config(config: CommandLineConfig, legacy: Vec<BinarySensorConfig>) -> Self {
        let mut integration = Self::default();
        for sensor in config.binary_sensor {
            integration.add_sensor(sensor, ConfigSource::Integration);
        }
        for sensor in legacy {
            integration.add_sensor(sensor, ConfigSource::LegacyPlatform);
        }
        integration
    }
}

impl<R: CommandRunner> CommandLineIntegration<R> {
    /// An integration without sensors that runs commands through `runner`.
    #[must_use]
    pub fn with_runner(runner: R) -> Self {
        Self {
            runner: Arc::new(runner),
            sensors: Vec::new(),
        }
    }

    pub fn add_sensor(&mut self, config: BinarySensorConfig, source: ConfigSource) {
        self.sensors.push((config, source));
    }

    #[must_use]
    pub fn with_sensor(mut self, config: BinarySensorConfig, source: ConfigSource) -> Self {
        self.add_sensor(config, source);
        self
    }

    #[must_use]
    pub fn sensor_count(&self) -> usize {
        self.sensors.len()
    }

    fn has_legacy_sensors(&self) -> bool {
        self.sensors
            .iter()
            .any(|(_, source)| *source == ConfigSource::LegacyPlatform)
    }
}

fn deprecated_platform_issue() -> Issue {
    Issue::new(
        DOMAIN,
        DEPRECATED_PLATFORM_ISSUE_ID,
        IssueSeverity::Warning,
        "deprecated_platform_yaml",
    )
    .breaks_in_version("2023.8.0")
    .placeholder("platform", cmdhub_domain::binary_sensor::DOMAIN)
}

impl<R: CommandRunner> Integration for CommandLineIntegration<R> {
    fn name(&self) -> &'static str {
        DOMAIN
    }

    /// Add one entity per configured sensor, each updated once before it is
    /// registered.
    ///
    /// A sensor that cannot be built or registered is logged and skipped so
    /// the others still come up.
    async fn setup(&mut self, ctx: &impl IntegrationContext) -> Result<(), HubError> {
        if self.has_legacy_sensors() {
            tracing::warn!(
                "configuring command_line binary sensors under [[binary_sensor]] is deprecated, \
                 move them to [[command_line.binary_sensor]]"
            );
            ctx.create_issue(deprecated_platform_issue()).await?;
        }

        let mut added = 0_usize;
        for (config, source) in &self.sensors {
            let name = config.name.clone();
            let runner = Arc::clone(&self.runner);
            let sensor = match CommandBinarySensor::from_config(config.clone(), runner) {
                Ok(sensor) => sensor,
                Err(err) => {
                    tracing::error!(
                        sensor = %name,
                        ?source,
                        error = %err,
                        "invalid binary sensor configuration"
                    );
                    continue;
                }
            };
            match ctx.add_entity(sensor, true).await {
                Ok(entity) => {
                    tracing::info!(
                        entity_id = %entity.entity_id,
                        state = %entity.state,
                        "binary sensor added"
                    );
                    added += 1;
                }
                Err(err) => {
                    tracing::error!(sensor = %name, error = %err, "failed to add binary sensor");
                }
            }
        }

        tracing::info!(
            added,
            configured = self.sensors.len(),
            "command_line integration set up"
        );
        Ok(())
    }

    async fn teardown(&mut self) -> Result<(), HubError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use cmdhub_app::ports::PolledEntity;
    use cmdhub_domain::entity::{Entity, EntityState};

    use crate::testing::{FakeRunner, ok_all};

    /// Records what setup hands to the host.
    #[derive(Default)]
    struct RecordingContext {
        entities: Mutex<Vec<Entity>>,
        issues: Mutex<Vec<Issue>>,
        reject_unique_id: Option<&'static str>,
    }

    impl IntegrationContext for RecordingContext {
        async fn add_entity<E: PolledEntity>(
            &self,
            mut entity: E,
            update_before_add: bool,
        ) -> Result<Entity, HubError> {
            if update_before_add {
                entity.update().await?;
            }
            let snapshot = entity.describe()?;
            if let Some(rejected) = self.reject_unique_id
                && snapshot.unique_id.as_deref() == Some(rejected)
            {
                return Err(HubError::Validation(
                    cmdhub_domain::error::ValidationError::DuplicateUniqueId(rejected.to_string()),
                ));
            }
            self.entities.lock().unwrap().push(snapshot.clone());
            Ok(snapshot)
        }

        async fn create_issue(&self, issue: Issue) -> Result<(), HubError> {
            self.issues.lock().unwrap().push(issue);
            Ok(())
        }
    }

    fn integration(outputs: &[&str]) -> CommandLineIntegration<FakeRunner> {
        CommandLineIntegration::with_runner(FakeRunner::scripted(ok_all(outputs)))
    }

    fn named(command: &str, name: &str) -> BinarySensorConfig {
        let mut config = BinarySensorConfig::new(command);
        config.name = name.to_string();
        config
    }

    #[tokio::test]
    async fn should_return_command_line_as_name() {
        let integration = CommandLineIntegration::default();
        assert_eq!(integration.name(), "command_line");
    }

    #[tokio::test]
    async fn should_add_every_sensor_with_first_update_applied() {
        let mut integration = integration(&["ON", "OFF"])
            .with_sensor(named("a", "First"), ConfigSource::Integration)
            .with_sensor(named("b", "Second"), ConfigSource::Integration);
        let ctx = RecordingContext::default();

        integration.setup(&ctx).await.unwrap();

        let entities = ctx.entities.lock().unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].entity_id, "binary_sensor.first");
        assert_eq!(entities[0].state, EntityState::On);
        assert_eq!(entities[1].entity_id, "binary_sensor.second");
        assert_eq!(entities[1].state, EntityState::Off);
        assert!(ctx.issues.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_raise_deprecation_issue_once_for_legacy_sensors() {
        let mut integration = integration(&["ON", "ON"])
            .with_sensor(named("a", "First"), ConfigSource::LegacyPlatform)
            .with_sensor(named("b", "Second"), ConfigSource::LegacyPlatform);
        let ctx = RecordingContext::default();

        integration.setup(&ctx).await.unwrap();

        let issues = ctx.issues.lock().unwrap();
        assert_eq!(issues.len(), 1);
        let issue = &issues[0];
        assert_eq!(issue.domain, "command_line");
        assert_eq!(issue.issue_id, "deprecated_yaml_binary_sensor");
        assert_eq!(issue.severity, IssueSeverity::Warning);
        assert_eq!(issue.breaks_in_version.as_deref(), Some("2023.8.0"));
        assert!(!issue.is_fixable);
        assert_eq!(issue.translation_key, "deprecated_platform_yaml");
        assert_eq!(
            issue.translation_placeholders.get("platform").map(String::as_str),
            Some("binary_sensor")
        );
        assert_eq!(ctx.entities.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn should_skip_invalid_sensor_and_keep_the_rest() {
        let mut bad = named("a", "Bad");
        bad.value_template = Some("{{ value ".to_string());
        let mut integration = integration(&["ON"])
            .with_sensor(bad, ConfigSource::Integration)
            .with_sensor(named("b", "Good"), ConfigSource::Integration);
        let ctx = RecordingContext::default();

        integration.setup(&ctx).await.unwrap();

        let entities = ctx.entities.lock().unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].friendly_name, "Good");
    }

    #[tokio::test]
    async fn should_continue_when_host_rejects_a_sensor() {
        let mut dup = named("a", "Dup");
        dup.unique_id = Some("taken".to_string());
        let mut integration = integration(&["ON", "OFF"])
            .with_sensor(dup, ConfigSource::Integration)
            .with_sensor(named("b", "Other"), ConfigSource::Integration);
        let ctx = RecordingContext {
            reject_unique_id: Some("taken"),
            ..RecordingContext::default()
        };

        integration.setup(&ctx).await.unwrap();

        assert_eq!(ctx.entities.lock().unwrap().len(), 1);
    }

    #[test]
    fn should_tag_sensors_with_their_source() {
        let config = CommandLineConfig {
            binary_sensor: vec![BinarySensorConfig::new("a")],
        };
        let integration =
            CommandLineIntegration::from_config(config, vec![BinarySensorConfig::new("b")]);

        assert_eq!(integration.sensor_count(), 2);
        assert!(integration.has_legacy_sensors());
        assert!(!CommandLineIntegration::default().has_legacy_sensors());
    }

    #[tokio::test]
    async fn should_teardown_successfully() {
        let mut integration = CommandLineIntegration::default();
        assert!(integration.teardown().await.is_ok());
    }
}
