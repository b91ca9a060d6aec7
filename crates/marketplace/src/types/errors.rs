//! Error types for marketplace operations.

use staybook_database::DatabaseError;
use thiserror::Error;

pub type MarketplaceResult<T> = Result<T, MarketplaceError>;

#[derive(Debug, Error)]
pub enum MarketplaceError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("permission denied: {reason}")]
    PermissionDenied { reason: String },

    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("database error: {0}")]
    Database(#[source] DatabaseError),
}

impl MarketplaceError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn permission_denied(reason: impl Into<String>) -> Self {
        Self::PermissionDenied {
            reason: reason.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }
}

impl From<DatabaseError> for MarketplaceError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(what) => Self::NotFound {
                entity: "record",
                id: what,
            },
            DatabaseError::Duplicate(message) => Self::Conflict { message },
            other => Self::Database(other),
        }
    }
}
