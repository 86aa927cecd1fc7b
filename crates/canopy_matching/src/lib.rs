//! The fuzzy matching engine (C3): resolves an external JSON inventory feed
//! against the catalog store and the live in-memory table.

pub mod engine;
pub mod ensemble;
pub mod error;
pub mod feed;
pub mod features;
pub mod soundex;
pub mod text_ratios;
pub mod tfidf;

pub use ensemble::{FeedbackEnsemble, FeedbackExample};
pub use engine::MatchingEngine;
pub use error::MatchError;
pub use feed::InventoryItem;
