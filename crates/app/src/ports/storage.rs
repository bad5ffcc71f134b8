//! Storage port: repository trait for registered entities.

use std::future::Future;

use cmdhub_domain::entity::Entity;
use cmdhub_domain::error::HubError;
use cmdhub_domain::id::EntityId;

/// Persistence for [`Entity`] snapshots.
pub trait EntityRepository {
    /// Store a new entity.
    fn create(&self, entity: Entity) -> impl Future<Output = Result<Entity, HubError>> + Send;

    fn get_by_id(
        &self,
        id: EntityId,
    ) -> impl Future<Output = Result<Option<Entity>, HubError>> + Send;

    /// Look up by the human-readable `domain.object_id`.
    fn find_by_entity_id(
        &self,
        entity_id: &str,
    ) -> impl Future<Output = Result<Option<Entity>, HubError>> + Send;

    /// Look up by the configuration-supplied unique id.
    fn find_by_unique_id(
        &self,
        unique_id: &str,
    ) -> impl Future<Output = Result<Option<Entity>, HubError>> + Send;

    fn get_all(&self) -> impl Future<Output = Result<Vec<Entity>, HubError>> + Send;

    /// Replace an existing entity.
    ///
    /// Fails with [`HubError::NotFound`] when no entity with the same id exists.
    fn update(&self, entity: Entity) -> impl Future<Output = Result<Entity, HubError>> + Send;
}
