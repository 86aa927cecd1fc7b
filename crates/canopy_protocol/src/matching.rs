//! Types produced by the matching engine (C3) and consumed by selection
//! state (C5).

use serde::{Deserialize, Serialize};

/// Source of a match candidate, surfaced to the caller for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchSource {
    /// Exact case-folded hit against the persistent catalog.
    DatabasePriority,
    /// Ensemble-scored hit against the in-memory tabular dataset.
    TableFuzzy,
}

impl MatchSource {
    pub fn label(self) -> &'static str {
        match self {
            MatchSource::DatabasePriority => "Database Priority",
            MatchSource::TableFuzzy => "Table Fuzzy",
        }
    }
}

/// The twelve features computed per (input, candidate) pair (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchFeatures {
    pub text_similarity: f64,
    pub semantic_similarity: f64,
    pub weight_similarity: f64,
    pub price_similarity: f64,
    pub vendor_similarity: f64,
    pub brand_similarity: f64,
    pub type_similarity: f64,
    pub cannabinoid_similarity: f64,
    pub length_similarity: f64,
    pub token_overlap: f64,
    pub edit_distance: f64,
    pub phonetic_similarity: f64,
}

impl MatchFeatures {
    /// The twelve features in the fixed order used by the linear-combination
    /// and feedback-regression models.
    pub fn as_array(&self) -> [f64; 12] {
        [
            self.text_similarity,
            self.semantic_similarity,
            self.weight_similarity,
            self.price_similarity,
            self.vendor_similarity,
            self.brand_similarity,
            self.type_similarity,
            self.cannabinoid_similarity,
            self.length_similarity,
            self.token_overlap,
            self.edit_distance,
            self.phonetic_similarity,
        ]
    }
}

/// A single ranked candidate produced by `fetch_and_match`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchCandidate {
    pub source_product_name: String,
    pub target_product_name: String,
    pub target_vendor: String,
    pub score: f64,
    pub confidence: f64,
    pub explanation: String,
    pub features: MatchFeatures,
    pub source: MatchSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_array_preserves_order() {
        let features = MatchFeatures {
            text_similarity: 1.0,
            semantic_similarity: 2.0,
            weight_similarity: 3.0,
            price_similarity: 4.0,
            vendor_similarity: 5.0,
            brand_similarity: 6.0,
            type_similarity: 7.0,
            cannabinoid_similarity: 8.0,
            length_similarity: 9.0,
            token_overlap: 10.0,
            edit_distance: 11.0,
            phonetic_similarity: 12.0,
        };
        assert_eq!(features.as_array(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0, 11.0, 12.0]);
    }
}
