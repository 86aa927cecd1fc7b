//! The error taxonomy shared across C1-C6 (spec §7).
//!
//! Each component surfaces `CoreError` to its immediate caller; an
//! embedding HTTP layer (out of scope for this crate) would map `kind()`
//! to the status codes spec §7 documents.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InputMalformed,
    UpstreamUnavailable,
    NotFound,
    PreconditionFailed,
    RateLimited,
    Timeout,
    Conflict,
    Internal,
}

/// The typed error surfaced at every component boundary.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("malformed input: {0}")]
    InputMalformed(String),

    #[error("upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    #[error("rate limited")]
    RateLimited,

    #[error("operation timed out: {0}")]
    Timeout(String),

    #[error("conflicting concurrent operation: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::InputMalformed(_) => ErrorKind::InputMalformed,
            CoreError::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            CoreError::NotFound(_) => ErrorKind::NotFound,
            CoreError::PreconditionFailed(_) => ErrorKind::PreconditionFailed,
            CoreError::RateLimited => ErrorKind::RateLimited,
            CoreError::Timeout(_) => ErrorKind::Timeout,
            CoreError::Conflict(_) => ErrorKind::Conflict,
            CoreError::Internal(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
