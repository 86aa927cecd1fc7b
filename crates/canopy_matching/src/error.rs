//! Errors for the matching engine.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, MatchError>;

#[derive(Error, Debug)]
pub enum MatchError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("upstream returned status {0}")]
    BadStatus(reqwest::StatusCode),

    #[error("invalid feed JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("feed missing required field: {0}")]
    MissingField(String),

    #[error("malformed data URL: {0}")]
    MalformedDataUrl(String),
}

impl From<MatchError> for canopy_protocol::CoreError {
    fn from(err: MatchError) -> Self {
        match err {
            MatchError::Fetch(_) | MatchError::BadStatus(_) => {
                canopy_protocol::CoreError::UpstreamUnavailable(err.to_string())
            }
            MatchError::InvalidJson(_) | MatchError::MissingField(_) | MatchError::MalformedDataUrl(_) => {
                canopy_protocol::CoreError::InputMalformed(err.to_string())
            }
        }
    }
}
