//! Periodic scheduler: drives [`PolledEntity::update`] on a fixed interval.
//!
//! Each entity gets its own background task, so a slow command on one
//! entity never delays another. Within a task, updates run strictly one
//! after the other.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinSet;
use tokio::time::{Instant, MissedTickBehavior};

use cmdhub_domain::entity::EntityState;
use cmdhub_domain::id::EntityId;

use crate::ports::{EntityRepository, EventPublisher, PolledEntity};
use crate::services::entity_service::EntityService;

/// Interval used when the host configuration does not set one.
pub const DEFAULT_SCAN_INTERVAL: Duration = Duration::from_secs(60);

/// Longest accepted interval. Larger values are clamped.
pub const MAX_SCAN_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

const MIN_SCAN_INTERVAL: Duration = Duration::from_millis(1);

/// Run one update and translate the outcome into the state to record.
///
/// A failed update is logged and reported as
/// [`EntityState::Unavailable`]; the next tick starts from scratch.
pub async fn poll_once<E: PolledEntity>(entity: &mut E, entity_id: &str) -> EntityState {
    match entity.update().await {
        Ok(()) => entity.state(),
        Err(err) => {
            tracing::error!(entity_id, error = %err, source = ?std::error::Error::source(&err), "update failed");
            EntityState::Unavailable
        }
    }
}

/// Owner of the per-entity polling tasks.
pub struct Scheduler {
    scan_interval: Duration,
    tasks: Mutex<JoinSet<()>>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(DEFAULT_SCAN_INTERVAL)
    }
}

impl Scheduler {
    /// Intervals outside `1ms..=MAX_SCAN_INTERVAL` are clamped into range.
    #[must_use]
    pub fn new(scan_interval: Duration) -> Self {
        let clamped = scan_interval.clamp(MIN_SCAN_INTERVAL, MAX_SCAN_INTERVAL);
        if clamped != scan_interval {
            tracing::warn!(
                requested_secs = scan_interval.as_secs(),
                used_secs = clamped.as_secs(),
                "scan interval out of range, clamped"
            );
        }
        Self {
            scan_interval: clamped,
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    #[must_use]
    pub fn scan_interval(&self) -> Duration {
        self.scan_interval
    }

    /// Number of polling tasks currently owned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Poll `entity` every scan interval, recording each result in
    /// `entities` under `id`.
    ///
    /// With `poll_immediately` the first update runs right away, otherwise
    /// one full interval after spawning.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<E, R, P>(
        &self,
        id: EntityId,
        entity_id: String,
        mut entity: E,
        entities: Arc<EntityService<R, P>>,
        poll_immediately: bool,
    ) where
        E: PolledEntity,
        R: EntityRepository + Send + Sync + 'static,
        P: EventPublisher + Send + Sync + 'static,
    {
        let interval = self.scan_interval;
        let now = Instant::now();
        let start = if poll_immediately {
            now
        } else {
            now.checked_add(interval).unwrap_or(now)
        };

        let task = async move {
            let mut ticker = tokio::time::interval_at(start, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let state = poll_once(&mut entity, &entity_id).await;
                if let Err(err) = entities.update_entity_state(id, state).await {
                    tracing::warn!(entity_id, error = %err, "failed to record polled state");
                }
            }
        };

        tracing::debug!(interval_secs = interval.as_secs(), "scheduling entity");
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .spawn(task);
    }

    /// Stop every polling task and wait for them to finish.
    pub async fn shutdown(&self) {
        let mut tasks = std::mem::take(
            &mut *self.tasks.lock().unwrap_or_else(PoisonError::into_inner),
        );
        tracing::info!(tasks = tasks.len(), "stopping scheduler");
        tasks.shutdown().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use cmdhub_domain::entity::Entity;
    use cmdhub_domain::error::HubError;

    use crate::event_bus::InProcessEventBus;
    use crate::memory::InMemoryEntityRepository;

    /// Replays a scripted sequence of update outcomes.
    struct Scripted {
        outcomes: VecDeque<Option<EntityState>>,
        state: EntityState,
    }

    impl Scripted {
        fn new(outcomes: impl IntoIterator<Item = Option<EntityState>>) -> Self {
            Self {
                outcomes: outcomes.into_iter().collect(),
                state: EntityState::Unknown,
            }
        }
    }

    impl PolledEntity for Scripted {
        fn describe(&self) -> Result<Entity, HubError> {
            Entity::builder()
                .entity_id("binary_sensor.scripted")
                .friendly_name("Scripted")
                .state(self.state)
                .build()
        }

        fn state(&self) -> EntityState {
            self.state
        }

        async fn update(&mut self) -> Result<(), HubError> {
            match self.outcomes.pop_front().flatten() {
                Some(state) => {
                    self.state = state;
                    Ok(())
                }
                None => Err(HubError::Render(Box::new(std::io::Error::other(
                    "scripted failure",
                )))),
            }
        }
    }

    type Service = EntityService<InMemoryEntityRepository, InProcessEventBus>;

    async fn registered(svc: &Service) -> Entity {
        svc.register(Scripted::new([]).describe().unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn should_mark_unavailable_when_update_fails() {
        let mut entity = Scripted::new([None]);
        let state = poll_once(&mut entity, "binary_sensor.scripted").await;
        assert_eq!(state, EntityState::Unavailable);
    }

    #[tokio::test]
    async fn should_report_entity_state_when_update_succeeds() {
        let mut entity = Scripted::new([Some(EntityState::Off)]);
        let state = poll_once(&mut entity, "binary_sensor.scripted").await;
        assert_eq!(state, EntityState::Off);
    }

    #[tokio::test(start_paused = true)]
    async fn should_poll_every_interval_and_recover_after_failure() {
        let svc = Arc::new(Service::new(
            InMemoryEntityRepository::new(),
            InProcessEventBus::new(16),
        ));
        let entity = registered(&svc).await;
        let scheduler = Scheduler::new(Duration::from_secs(60));

        scheduler.spawn(
            entity.id,
            entity.entity_id.clone(),
            Scripted::new([Some(EntityState::On), None, Some(EntityState::Off)]),
            Arc::clone(&svc),
            true,
        );
        assert_eq!(scheduler.len(), 1);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(svc.get_entity(entity.id).await.unwrap().state, EntityState::On);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(
            svc.get_entity(entity.id).await.unwrap().state,
            EntityState::Unavailable
        );

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(svc.get_entity(entity.id).await.unwrap().state, EntityState::Off);

        scheduler.shutdown().await;
        assert!(scheduler.is_empty());
    }

    #[test]
    fn should_clamp_out_of_range_intervals() {
        assert_eq!(
            Scheduler::new(Duration::from_secs(u64::MAX)).scan_interval(),
            MAX_SCAN_INTERVAL
        );
        assert_eq!(
            Scheduler::new(Duration::ZERO).scan_interval(),
            Duration::from_millis(1)
        );
        assert_eq!(
            Scheduler::new(Duration::from_secs(30)).scan_interval(),
            Duration::from_secs(30)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn should_spawn_delayed_poll_with_huge_interval() {
        let svc = Arc::new(Service::new(
            InMemoryEntityRepository::new(),
            InProcessEventBus::new(16),
        ));
        let entity = registered(&svc).await;
        let scheduler = Scheduler::new(Duration::from_secs(u64::MAX));

        scheduler.spawn(
            entity.id,
            entity.entity_id.clone(),
            Scripted::new([Some(EntityState::On)]),
            Arc::clone(&svc),
            false,
        );
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(scheduler.len(), 1);
        assert_eq!(
            svc.get_entity(entity.id).await.unwrap().state,
            EntityState::Unknown
        );
        scheduler.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn should_wait_one_interval_when_not_polling_immediately() {
        let svc = Arc::new(Service::new(
            InMemoryEntityRepository::new(),
            InProcessEventBus::new(16),
        ));
        let entity = registered(&svc).await;
        let scheduler = Scheduler::new(Duration::from_secs(30));

        scheduler.spawn(
            entity.id,
            entity.entity_id.clone(),
            Scripted::new([Some(EntityState::On)]),
            Arc::clone(&svc),
            false,
        );

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert_eq!(
            svc.get_entity(entity.id).await.unwrap().state,
            EntityState::Unknown
        );

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(svc.get_entity(entity.id).await.unwrap().state, EntityState::On);

        scheduler.shutdown().await;
    }
}
