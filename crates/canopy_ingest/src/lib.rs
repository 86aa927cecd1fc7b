//! Upload-to-ready ingestion coordinator gluing C1/C2/C4 (C6).

pub mod coordinator;
pub mod error;

pub use coordinator::IngestionCoordinator;
pub use error::IngestError;
