//! Error types for the Canopy resource tree.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CanopyError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    /// The authorization registry refused to register a protected resource.
    #[error("Authorization registry error: {0}")]
    Registry(String),

    /// A structural invariant of the tree would be broken.
    #[error("Integrity error: {message}")]
    Integrity { message: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CanopyError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
        }
    }
}

pub type CanopyResult<T> = Result<T, CanopyError>;
