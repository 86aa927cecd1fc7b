//! Errors for the upload-to-ready ingestion coordinator.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("upload too large: {actual} bytes exceeds limit of {limit} bytes")]
    TooLarge { actual: u64, limit: u64 },

    #[error("upload is empty")]
    Empty,
}

impl From<IngestError> for canopy_protocol::CoreError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::TooLarge { .. } | IngestError::Empty => canopy_protocol::CoreError::InputMalformed(err.to_string()),
            IngestError::Io(_) => canopy_protocol::CoreError::Internal(err.to_string()),
        }
    }
}
