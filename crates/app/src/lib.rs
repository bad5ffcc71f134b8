//! # cmdhub-app
//!
//! Application layer: use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters implement or call:
//!   - `EntityRepository`: storage for registered entities
//!   - `EventPublisher`: fan-out of domain events
//!   - `Integration` / `IntegrationContext` / `PolledEntity`: the
//!     integration lifecycle and the entity registration sink
//! - Provide the use-case services:
//!   - `EntityService`: register, update state, list, get
//!   - `IssueService`: the repair/deprecation issue registry
//! - Provide **in-process infrastructure** that doesn't need IO: the event
//!   bus, an in-memory entity repository, the periodic [`scheduler`] and the
//!   value [`template`] renderer
//!
//! ## Dependency rule
//! Depends on `cmdhub-domain` only (plus `tokio` for channels/timers and
//! `minijinja` for templates). Never imports adapter crates.

pub mod event_bus;
pub mod memory;
pub mod ports;
pub mod scheduler;
pub mod services;
pub mod template;
