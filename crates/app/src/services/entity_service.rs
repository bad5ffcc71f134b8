//! Entity service: registration and state management.

use cmdhub_domain::entity::{Entity, EntityState};
use cmdhub_domain::error::{HubError, NotFoundError, ValidationError};
use cmdhub_domain::event::{Event, EventType};
use cmdhub_domain::id::EntityId;
use cmdhub_domain::time::now;

use crate::ports::{EntityRepository, EventPublisher};

/// Application service for entity registration and state updates.
///
/// Every registration publishes [`EventType::EntityCreated`]; state updates
/// publish [`EventType::StateChanged`] only when the state actually changes.
pub struct EntityService<R, P> {
    repo: R,
    publisher: P,
}

impl<R: EntityRepository, P: EventPublisher> EntityService<R, P> {
    /// Create a new service backed by the given repository and publisher.
    pub fn new(repo: R, publisher: P) -> Self {
        Self { repo, publisher }
    }

    /// Register a new entity.
    ///
    /// When `entity_id` is already taken, `_2`, `_3`, … is appended until it
    /// is free.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if invariants fail or the entity's
    /// `unique_id` is already registered, or a storage error from the
    /// repository.
    #[tracing::instrument(skip(self, entity), fields(entity_id = %entity.entity_id))]
    pub async fn register(&self, mut entity: Entity) -> Result<Entity, HubError> {
        entity.validate()?;

        if let Some(unique_id) = entity.unique_id.as_deref()
            && self.repo.find_by_unique_id(unique_id).await?.is_some()
        {
            return Err(ValidationError::DuplicateUniqueId(unique_id.to_string()).into());
        }

        entity.entity_id = self.free_entity_id(&entity.entity_id).await?;
        let ts = now();
        entity.last_changed = ts;
        entity.last_updated = ts;

        let entity = self.repo.create(entity).await?;
        tracing::info!(entity_id = %entity.entity_id, state = %entity.state, "entity registered");
        self.publisher
            .publish(Event::new(
                EventType::EntityCreated,
                Some(entity.id),
                serde_json::json!({
                    "entity_id": entity.entity_id,
                    "state": entity.state.to_string(),
                }),
            ))
            .await?;
        Ok(entity)
    }

    async fn free_entity_id(&self, wanted: &str) -> Result<String, HubError> {
        if self.repo.find_by_entity_id(wanted).await?.is_none() {
            return Ok(wanted.to_string());
        }
        let mut suffix = 2_u32;
        loop {
            let candidate = format!("{wanted}_{suffix}");
            if self.repo.find_by_entity_id(&candidate).await?.is_none() {
                return Ok(candidate);
            }
            suffix += 1;
        }
    }

    /// Look up an entity by id.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] when no entity with `id` exists,
    /// or a storage error from the repository.
    pub async fn get_entity(&self, id: EntityId) -> Result<Entity, HubError> {
        self.repo.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Entity",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all entities.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_entities(&self) -> Result<Vec<Entity>, HubError> {
        self.repo.get_all().await
    }

    /// Record a freshly polled state.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::NotFound`] if the entity does not exist,
    /// or a storage error from the repository.
    pub async fn update_entity_state(
        &self,
        id: EntityId,
        new_state: EntityState,
    ) -> Result<Entity, HubError> {
        let mut entity = self.get_entity(id).await?;
        let previous = entity.state;
        let changed = entity.update_state(new_state, now());
        let entity = self.repo.update(entity).await?;

        if changed {
            tracing::debug!(
                entity_id = %entity.entity_id,
                from = %previous,
                to = %new_state,
                "state changed"
            );
            self.publisher
                .publish(Event::new(
                    EventType::StateChanged,
                    Some(entity.id),
                    serde_json::json!({
                        "entity_id": entity.entity_id,
                        "from": previous.to_string(),
                        "to": new_state.to_string(),
                    }),
                ))
                .await?;
        }
        Ok(entity)
    }
}
