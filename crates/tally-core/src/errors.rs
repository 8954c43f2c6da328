//! Cross-cutting error types for Medal Tally.
//!
//! Domain-specific errors (`DatabaseError`, `AuthError`, `ConfigError`) live in
//! their own crates. They converge in `tally-server`, which maps them to HTTP
//! responses.

use thiserror::Error;

use crate::enums::EventStatus;

/// Errors that can be raised by any tally crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Entity lookup returned no result.
    #[error("Entity not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// A state machine transition was attempted that is not allowed.
    #[error("Invalid state transition: {entity_type} {id} from {from} to {to}")]
    InvalidTransition {
        entity_type: String,
        id: String,
        from: String,
        to: String,
    },

    /// Data failed validation (missing field, bad number, constraint).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoreError {
    /// Shorthand for an illegal event status change.
    #[must_use]
    pub fn event_transition(id: &str, from: EventStatus, to: EventStatus) -> Self {
        Self::InvalidTransition {
            entity_type: "event".into(),
            id: id.to_string(),
            from: from.to_string(),
            to: to.to_string(),
        }
    }
}
