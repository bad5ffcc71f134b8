//! In-memory [`EntityRepository`]: entities live as long as the process.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use cmdhub_domain::entity::Entity;
use cmdhub_domain::error::{HubError, NotFoundError};
use cmdhub_domain::id::EntityId;

use crate::ports::EntityRepository;

/// Mutex-guarded map of registered entities.
#[derive(Default)]
pub struct InMemoryEntityRepository {
    store: Mutex<HashMap<EntityId, Entity>>,
}

impl InMemoryEntityRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn store(&self) -> MutexGuard<'_, HashMap<EntityId, Entity>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn find(&self, predicate: impl Fn(&Entity) -> bool) -> Option<Entity> {
        self.store().values().find(|entity| predicate(entity)).cloned()
    }
}

impl EntityRepository for InMemoryEntityRepository {
    fn create(&self, entity: Entity) -> impl Future<Output = Result<Entity, HubError>> + Send {
        self.store().insert(entity.id, entity.clone());
        async { Ok(entity) }
    }

    fn get_by_id(
        &self,
        id: EntityId,
    ) -> impl Future<Output = Result<Option<Entity>, HubError>> + Send {
        let result = self.store().get(&id).cloned();
        async { Ok(result) }
    }

    fn find_by_entity_id(
        &self,
        entity_id: &str,
    ) -> impl Future<Output = Result<Option<Entity>, HubError>> + Send {
        let result = self.find(|entity| entity.entity_id == entity_id);
        async { Ok(result) }
    }

    fn find_by_unique_id(
        &self,
        unique_id: &str,
    ) -> impl Future<Output = Result<Option<Entity>, HubError>> + Send {
        let result = self.find(|entity| entity.unique_id.as_deref() == Some(unique_id));
        async { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Entity>, HubError>> + Send {
        let mut result: Vec<Entity> = self.store().values().cloned().collect();
        result.sort_by(|a, b| a.entity_id.cmp(&b.entity_id));
        async { Ok(result) }
    }

    fn update(&self, entity: Entity) -> impl Future<Output = Result<Entity, HubError>> + Send {
        let result = match self.store().get_mut(&entity.id) {
            Some(slot) => {
                *slot = entity.clone();
                Ok(entity)
            }
            None => Err(NotFoundError {
                entity: "Entity",
                id: entity.id.to_string(),
            }
            .into()),
        };
        async { result }
    }
}
