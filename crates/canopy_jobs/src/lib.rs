//! The background ingestion job registry (C4).

pub mod registry;

pub use registry::{JobRegistry, JobStatus};
