//! Entity: the central state-holding concept in cmdhub.
//!
//! An entity represents a single observable aspect of the outside world
//! (e.g. "is the NAS reachable", as reported by a shell command).

mod attribute_value;
mod state;

pub use attribute_value::AttributeValue;
pub use state::EntityState;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{HubError, ValidationError};
use crate::id::EntityId;
use crate::time::{Timestamp, now};

/// Registered snapshot of an entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    /// Human-readable identifier of the form `domain.object_id`
    /// (e.g. `binary_sensor.nas_online`).
    pub entity_id: String,
    /// Stable identifier supplied by configuration, if any.
    pub unique_id: Option<String>,
    pub friendly_name: String,
    pub state: EntityState,
    pub attributes: HashMap<String, AttributeValue>,
    pub last_changed: Timestamp,
    pub last_updated: Timestamp,
}

impl Entity {
    /// Create a builder for constructing an [`Entity`].
    #[must_use]
    pub fn builder() -> EntityBuilder {
        EntityBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] when `friendly_name` is empty or
    /// `entity_id` is not of the form `domain.object_id`.
    pub fn validate(&self) -> Result<(), HubError> {
        if self.friendly_name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if split_entity_id(&self.entity_id).is_none() {
            return Err(ValidationError::InvalidEntityId(self.entity_id.clone()).into());
        }
        Ok(())
    }

    /// Look up an attribute by key.
    #[must_use]
    pub fn get_attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Record a new state at `ts`.
    ///
    /// `last_updated` always moves; `last_changed` only moves when the state
    /// differs from the previous one. Returns whether the state changed.
    pub fn update_state(&mut self, new_state: EntityState, ts: Timestamp) -> bool {
        self.last_updated = ts;
        if self.state == new_state {
            return false;
        }
        self.state = new_state;
        self.last_changed = ts;
        true
    }
}

/// Step-by-step builder for [`Entity`].
#[derive(Debug, Default)]
pub struct EntityBuilder {
    id: Option<EntityId>,
    entity_id: Option<String>,
    unique_id: Option<String>,
    friendly_name: Option<String>,
    state: Option<EntityState>,
    attributes: HashMap<String, AttributeValue>,
}

impl EntityBuilder {
    #[must_use]
    pub fn id(mut self, id: EntityId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    #[must_use]
    pub fn unique_id(mut self, unique_id: Option<String>) -> Self {
        self.unique_id = unique_id;
        self
    }

    #[must_use]
    pub fn friendly_name(mut self, name: impl Into<String>) -> Self {
        self.friendly_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn state(mut self, state: EntityState) -> Self {
        self.state = Some(state);
        self
    }

    #[must_use]
    pub fn attribute(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Consume the builder, validate, and return an [`Entity`].
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if the name is missing or the
    /// entity id is malformed.
    pub fn build(self) -> Result<Entity, HubError> {
        let ts = now();
        let entity = Entity {
            id: self.id.unwrap_or_default(),
            entity_id: self.entity_id.unwrap_or_default(),
            unique_id: self.unique_id,
            friendly_name: self.friendly_name.unwrap_or_default(),
            state: self.state.unwrap_or_default(),
            attributes: self.attributes,
            last_changed: ts,
            last_updated: ts,
        };
        entity.validate()?;
        Ok(entity)
    }
}

/// Split `domain.object_id`, rejecting empty halves.
fn split_entity_id(entity_id: &str) -> Option<(&str, &str)> {
    let (domain, object_id) = entity_id.split_once('.')?;
    if domain.is_empty() || object_id.is_empty() || object_id.contains('.') {
        return None;
    }
    Some((domain, object_id))
}

/// Turn a free-form name into an `object_id`.
///
/// Lowercases, collapses every run of non-alphanumeric characters into a
/// single `_` and strips leading/trailing underscores. An empty result
/// becomes `"unnamed"`.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_sep = false;
    for ch in name.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(ch);
        } else {
            pending_sep = true;
        }
    }
    if slug.is_empty() {
        return "unnamed".to_string();
    }
    slug
}

/// Build `domain.<slug of name>`.
#[must_use]
pub fn generate_entity_id(domain: &str, name: &str) -> String {
    format!("{domain}.{}", slugify(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity() -> Entity {
        Entity::builder()
            .entity_id("binary_sensor.front_door")
            .friendly_name("Front door")
            .build()
            .unwrap()
    }

    #[test]
    fn should_build_entity_with_unknown_default_state() {
        let entity = entity();
        assert_eq!(entity.state, EntityState::Unknown);
        assert_eq!(entity.last_changed, entity.last_updated);
    }

    #[test]
    fn should_reject_empty_friendly_name() {
        let result = Entity::builder().entity_id("binary_sensor.x").build();
        assert!(matches!(
            result,
            Err(HubError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_reject_malformed_entity_id() {
        for bad in ["", "binary_sensor", "binary_sensor.", ".door", "a.b.c"] {
            let result = Entity::builder()
                .entity_id(bad)
                .friendly_name("Door")
                .build();
            assert!(
                matches!(
                    result,
                    Err(HubError::Validation(ValidationError::InvalidEntityId(_)))
                ),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn should_store_attributes() {
        let entity = Entity::builder()
            .entity_id("binary_sensor.link")
            .friendly_name("Link")
            .attribute("device_class", AttributeValue::from("connectivity"))
            .build()
            .unwrap();
        assert_eq!(
            entity.get_attribute("device_class"),
            Some(&AttributeValue::from("connectivity"))
        );
    }

    #[test]
    fn should_move_last_changed_only_on_change() {
        let mut entity = entity();
        let created = entity.last_changed;

        let t1 = created + chrono::Duration::seconds(60);
        assert!(!entity.update_state(EntityState::Unknown, t1));
        assert_eq!(entity.last_changed, created);
        assert_eq!(entity.last_updated, t1);

        let t2 = t1 + chrono::Duration::seconds(60);
        assert!(entity.update_state(EntityState::On, t2));
        assert_eq!(entity.last_changed, t2);
        assert_eq!(entity.state, EntityState::On);
    }

    #[test]
    fn should_slugify_names() {
        assert_eq!(slugify("Binary Command Sensor"), "binary_command_sensor");
        assert_eq!(slugify("  NAS -- online? "), "nas_online");
        assert_eq!(slugify("Küche"), "küche");
        assert_eq!(slugify("!!!"), "unnamed");
    }

    #[test]
    fn should_generate_entity_id_from_name() {
        assert_eq!(
            generate_entity_id("binary_sensor", "Ethernet link"),
            "binary_sensor.ethernet_link"
        );
    }
}
