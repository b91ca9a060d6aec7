//! Error types for the database layer

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("database connection error: {0}")]
    Connection(String),

    #[error("database migration error: {0}")]
    Migration(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("duplicate entity: {0}")]
    Duplicate(String),

    #[error("database query error: {0}")]
    Query(#[source] sqlx::Error),
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound("record".to_string()),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DatabaseError::Duplicate(db_err.message().to_string())
            }
            _ => DatabaseError::Query(err),
        }
    }
}

impl DatabaseError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, DatabaseError::Duplicate(_))
    }
}
