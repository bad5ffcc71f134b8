//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`HubError`]
//! via `#[from]` or an explicit `From` impl when crossing a port boundary.

/// Workspace-wide error returned by ports and services.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// A value template failed to render.
    #[error("template rendering failed")]
    Render(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// An integration-specific failure (process spawn, IO, …).
    #[error("integration error")]
    Integration(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Domain invariant violations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("command must not be empty")]
    EmptyCommand,

    #[error("invalid entity id {0:?}, expected `domain.object_id`")]
    InvalidEntityId(String),

    #[error("unique id {0:?} is already registered")]
    DuplicateUniqueId(String),
}

/// A lookup that found nothing.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}
