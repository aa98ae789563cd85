//! Domain-level error type shared across crates.

use crate::types::DbId;

/// Domain errors raised by core rules and surfaced through the API layer.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The requested entity does not exist.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: String, id: DbId },

    /// Input failed a domain validation rule.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The operation conflicts with current entity state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The caller is authenticated but not allowed to do this.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// An unexpected internal failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for a [`CoreError::NotFound`] with an owned entity name.
    pub fn not_found(entity: &str, id: DbId) -> Self {
        Self::NotFound {
            entity: entity.to_string(),
            id,
        }
    }
}
