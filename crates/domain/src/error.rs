//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`TaskhookError`] via `#[from]` or an explicit `From` impl.

/// Root error type shared by ports and services.
#[derive(Debug, thiserror::Error)]
pub enum TaskhookError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// A domain invariant was violated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("title must not be empty")]
    EmptyTitle,

    #[error("webhook must subscribe to at least one event")]
    NoEvents,

    #[error("invalid webhook url: {0}")]
    InvalidUrl(String),

    #[error("unknown event name: {0}")]
    UnknownEvent(String),

    #[error("unknown task status: {0}")]
    UnknownStatus(String),

    #[error("unknown task priority: {0}")]
    UnknownPriority(String),

    #[error("action {action} requires param {param}")]
    MissingParam { action: String, param: String },

    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

/// A record looked up by id does not exist.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}
