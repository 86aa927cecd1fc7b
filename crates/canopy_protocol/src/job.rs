//! Background ingestion job lifecycle states (C4).

use serde::{Deserialize, Serialize};

/// The lifecycle of one asynchronous ingestion job, keyed by filename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum JobState {
    Processing,
    Ready,
    Error(String),
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Processing)
    }

    pub fn label(&self) -> &'static str {
        match self {
            JobState::Processing => "processing",
            JobState::Ready => "ready",
            JobState::Error(_) => "error",
        }
    }
}
