//! Binary sensor whose state comes from a command's output.

use std::sync::Arc;

use cmdhub_app::ports::PolledEntity;
use cmdhub_app::template::ValueTemplate;
use cmdhub_domain::binary_sensor::{self, BinarySensorDeviceClass};
use cmdhub_domain::entity::{AttributeValue, Entity, EntityState, generate_entity_id};
use cmdhub_domain::error::HubError;

use crate::config::BinarySensorConfig;
use crate::data::CommandSensorData;
use crate::error::CommandLineError;
use crate::runner::CommandRunner;

/// A binary sensor re-evaluated from scratch on every update.
///
/// The state is `on` when the (optionally templated) output equals
/// `payload_on`, `off` when it equals `payload_off` and `unknown` otherwise,
/// including when the command failed. The on-payload is checked first.
pub struct CommandBinarySensor<R> {
    data: CommandSensorData<R>,
    name: String,
    device_class: Option<BinarySensorDeviceClass>,
    payload_on: String,
    payload_off: String,
    value_template: Option<ValueTemplate>,
    unique_id: Option<String>,
    is_on: Option<bool>,
}

impl<R: CommandRunner> CommandBinarySensor<R> {
    /// Build a sensor from its configuration, compiling the value template.
    ///
    /// # Errors
    ///
    /// Returns an error when the configuration is invalid or the template
    /// does not parse.
    pub fn from_config(
        config: BinarySensorConfig,
        runner: Arc<R>,
    ) -> Result<Self, CommandLineError> {
        config.validate()?;
        let timeout = config.timeout();
        let value_template = config
            .value_template
            .map(ValueTemplate::new)
            .transpose()
            .map_err(CommandLineError::Template)?;

        Ok(Self {
            data: CommandSensorData::new(runner, config.command, timeout),
            name: config.name,
            device_class: config.device_class,
            payload_on: config.payload_on,
            payload_off: config.payload_off,
            value_template,
            unique_id: config.unique_id,
            is_on: None,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn device_class(&self) -> Option<BinarySensorDeviceClass> {
        self.device_class
    }

    #[must_use]
    pub fn unique_id(&self) -> Option<&str> {
        self.unique_id.as_deref()
    }

    /// `None` until the output first matches a payload.
    #[must_use]
    pub fn is_on(&self) -> Option<bool> {
        self.is_on
    }

    fn evaluate(&self, value: Option<&str>) -> Result<Option<bool>, HubError> {
        let Some(value) = value else {
            return Ok(None);
        };

        let rendered;
        let value = match &self.value_template {
            Some(template) => {
                rendered = template.render_with_possible_json_value(value)?;
                rendered.as_str()
            }
            None => value,
        };

        if value == self.payload_on {
            Ok(Some(true))
        } else if value == self.payload_off {
            Ok(Some(false))
        } else {
            tracing::debug!(sensor = %self.name, value, "output matches neither payload");
            Ok(None)
        }
    }
}

impl<R: CommandRunner> PolledEntity for CommandBinarySensor<R> {
    fn describe(&self) -> Result<Entity, HubError> {
        let mut builder = Entity::builder()
            .entity_id(generate_entity_id(binary_sensor::DOMAIN, &self.name))
            .friendly_name(self.name.as_str())
            .unique_id(self.unique_id.clone())
            .state(self.state());
        if let Some(device_class) = self.device_class {
            builder =
                builder.attribute("device_class", AttributeValue::from(device_class.as_str()));
        }
        builder.build()
    }

    fn state(&self) -> EntityState {
        EntityState::from_is_on(self.is_on)
    }

    async fn update(&mut self) -> Result<(), HubError> {
        self.data.refresh().await;
        self.is_on = self.evaluate(self.data.value())?;
        Ok(())
    }
}
