//! Concrete [`IntegrationContext`] backed by application services.

use std::sync::Arc;

use cmdhub_domain::entity::Entity;
use cmdhub_domain::error::HubError;
use cmdhub_domain::issue::Issue;

use crate::ports::{EntityRepository, EventPublisher, IntegrationContext, PolledEntity};
use crate::scheduler::{Scheduler, poll_once};
use crate::services::entity_service::EntityService;
use crate::services::issue_service::IssueService;

/// [`IntegrationContext`] implementation that delegates to `EntityService`,
/// `IssueService` and the [`Scheduler`].
///
/// Wraps `Arc`-ed services so it is cheaply cloneable and `Send + Sync`.
/// The generic parameters are confined to this struct; integrations see
/// only the [`IntegrationContext`] trait.
pub struct ServiceContext<R, P> {
    entity_service: Arc<EntityService<R, P>>,
    issue_service: Arc<IssueService<P>>,
    scheduler: Arc<Scheduler>,
}

impl<R, P> ServiceContext<R, P> {
    pub fn new(
        entity_service: Arc<EntityService<R, P>>,
        issue_service: Arc<IssueService<P>>,
        scheduler: Arc<Scheduler>,
    ) -> Self {
        Self {
            entity_service,
            issue_service,
            scheduler,
        }
    }
}

impl<R, P> Clone for ServiceContext<R, P> {
    fn clone(&self) -> Self {
        Self {
            entity_service: Arc::clone(&self.entity_service),
            issue_service: Arc::clone(&self.issue_service),
            scheduler: Arc::clone(&self.scheduler),
        }
    }
}

impl<R, P> IntegrationContext for ServiceContext<R, P>
where
    R: EntityRepository + Send + Sync + 'static,
    P: EventPublisher + Send + Sync + 'static,
{
    async fn add_entity<E: PolledEntity>(
        &self,
        mut entity: E,
        update_before_add: bool,
    ) -> Result<Entity, HubError> {
        let mut snapshot = entity.describe()?;
        if update_before_add {
            snapshot.state = poll_once(&mut entity, &snapshot.entity_id).await;
        }

        let registered = self.entity_service.register(snapshot).await?;
        self.scheduler.spawn(
            registered.id,
            registered.entity_id.clone(),
            entity,
            Arc::clone(&self.entity_service),
            false,
        );
        Ok(registered)
    }

    async fn create_issue(&self, issue: Issue) -> Result<(), HubError> {
        self.issue_service.create_issue(issue).await
    }
}
