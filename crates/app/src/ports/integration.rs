//! Integration port: lifecycle of integrations and the entities they poll.
//!
//! An integration bridges an external source (shell commands, …) into the
//! cmdhub system. During setup it hands its entities to the host through an
//! [`IntegrationContext`]; the host then drives every entity's
//! [`PolledEntity::update`] on a fixed interval.

use std::future::Future;

use cmdhub_domain::entity::{Entity, EntityState};
use cmdhub_domain::error::HubError;
use cmdhub_domain::issue::Issue;

/// An entity whose state is refreshed by periodic polling.
///
/// The scheduler owns the value exclusively, so `update` calls for one
/// entity never overlap.
pub trait PolledEntity: Send + 'static {
    /// Registration snapshot: ids, name, attributes and current state.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Validation`] if the entity cannot be described
    /// (e.g. an empty name).
    fn describe(&self) -> Result<Entity, HubError>;

    /// State as of the last successful update.
    fn state(&self) -> EntityState;

    /// Refresh the state from the outside world.
    ///
    /// An `Err` is handled by the host: it is logged and the entity is marked
    /// [`EntityState::Unavailable`] until the next successful update.
    fn update(&mut self) -> impl Future<Output = Result<(), HubError>> + Send;
}

/// Host services offered to integrations during setup.
///
/// This is a **port**; the binary crate provides a concrete implementation
/// backed by `EntityService`, `IssueService` and the `Scheduler`.
pub trait IntegrationContext: Send + Sync {
    /// Register `entity` and start polling it.
    ///
    /// With `update_before_add` the entity is updated once before it is
    /// registered, so it never shows up with a stale initial state.
    fn add_entity<E: PolledEntity>(
        &self,
        entity: E,
        update_before_add: bool,
    ) -> impl Future<Output = Result<Entity, HubError>> + Send;

    /// Raise (or refresh) an advisory issue.
    fn create_issue(&self, issue: Issue) -> impl Future<Output = Result<(), HubError>> + Send;
}

/// A pluggable integration.
///
/// Implementations live in adapter crates (e.g. `adapter_command_line`).
/// The binary crate calls the lifecycle methods in order:
///
/// 1. [`setup`](Self::setup): validate configuration and add entities via `ctx`
/// 2. (the host polls the added entities)
/// 3. [`teardown`](Self::teardown): clean up resources
pub trait Integration {
    /// Unique name identifying this integration (e.g. `"command_line"`).
    fn name(&self) -> &'static str;

    /// Build the integration's entities and hand them to the host.
    fn setup(
        &mut self,
        ctx: &impl IntegrationContext,
    ) -> impl Future<Output = Result<(), HubError>> + Send;

    /// Called on graceful shutdown.
    fn teardown(&mut self) -> impl Future<Output = Result<(), HubError>> + Send;
}
