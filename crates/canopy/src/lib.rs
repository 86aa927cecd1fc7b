//! Composition root for the Canopy product-catalog core: wires the
//! catalog store (C1), tabular processor (C2), matching engine (C3), job
//! registry (C4), selection state (C5), and ingestion coordinator (C6)
//! behind a single [`AppContext`].
//!
//! This crate stops at the typed envelope boundary; the HTTP routing
//! surface, authentication, and label rendering are out of scope and are
//! expected to be supplied by an embedding application.

pub mod config;
pub mod context;

pub use config::CatalogConfig;
pub use context::AppContext;
