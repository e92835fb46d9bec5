//! Error types for GODS persistence

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Not found")]
    NotFound,

    /// A uniqueness constraint rejected the write
    #[error("Already exists: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::Conflict(db_err.message().to_string())
            }
            other => {
                tracing::error!(error = ?other, "Database error");
                StoreError::Database(other.to_string())
            }
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
