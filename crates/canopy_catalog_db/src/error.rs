//! Error types for the catalog store.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid store name: {0}")]
    InvalidStoreName(String),
}

impl DbError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<DbError> for canopy_protocol::CoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound(msg) => canopy_protocol::CoreError::NotFound(msg),
            other => canopy_protocol::CoreError::Internal(other.to_string()),
        }
    }
}
