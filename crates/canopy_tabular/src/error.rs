//! Errors for loading and filtering the in-memory table.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TabularError>;

#[derive(Error, Debug)]
pub enum TabularError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("spreadsheet error: {0}")]
    Calamine(#[from] calamine::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("unsupported file extension: {0}")]
    UnsupportedExtension(String),

    #[error("empty file")]
    Empty,

    #[error("unknown filter column: {0}")]
    UnknownColumn(String),
}

impl From<TabularError> for canopy_protocol::CoreError {
    fn from(err: TabularError) -> Self {
        match err {
            TabularError::Empty => canopy_protocol::CoreError::InputMalformed("empty file".into()),
            TabularError::UnsupportedExtension(ext) => {
                canopy_protocol::CoreError::InputMalformed(format!("unsupported extension: {ext}"))
            }
            TabularError::UnknownColumn(col) => {
                canopy_protocol::CoreError::PreconditionFailed(format!("unknown column: {col}"))
            }
            other => canopy_protocol::CoreError::Internal(other.to_string()),
        }
    }
}
