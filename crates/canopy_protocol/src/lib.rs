//! Shared domain types for the Canopy product-catalog core.
//!
//! No I/O lives here: SQLite access is `canopy_catalog_db`, spreadsheet
//! parsing is `canopy_tabular`, HTTP is `canopy_matching`. This crate is
//! the single place that defines what a `Product`, a `Strain`, and a
//! `Lineage` are, and the pure derived-field functions both the catalog
//! store and the tabular processor compute from them.

pub mod defaults;
pub mod derived;
pub mod error;
pub mod job;
pub mod lineage;
pub mod matching;
pub mod product;
pub mod product_type;
pub mod rng;
pub mod selection;
pub mod strain;

pub use error::{CoreError, ErrorKind, Result};
pub use job::JobState;
pub use lineage::Lineage;
pub use matching::{MatchCandidate, MatchFeatures, MatchSource};
pub use product::{Product, WeightUnit};
pub use product_type::ProductType;
pub use selection::{FilterMode, MoveDirection};
pub use strain::Strain;
