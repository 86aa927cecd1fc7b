//! Shared selection-state types (C5); the mutation logic lives in
//! `canopy_selection`, this crate only owns the wire shape.

use serde::{Deserialize, Serialize};

/// Which subset of known product names a client is browsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterMode {
    JsonMatched,
    FullExcel,
}

/// Direction of a move operation between the available and selected lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveDirection {
    ToSelected,
    ToAvailable,
}
