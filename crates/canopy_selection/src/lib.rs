//! Per-session selected-tag set with bounded undo history (C5).

pub mod state;

pub use state::{SelectionState, SelectionView};
