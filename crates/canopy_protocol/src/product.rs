//! The `Product` row type: identity, attributes, and the optional-field bag
//! for spreadsheet columns this crate doesn't model by name.

use crate::lineage::Lineage;
use crate::product_type::ProductType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Magnitude + unit as given on a spreadsheet row, before any conventional-
/// weight substitution is applied.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum WeightUnit {
    Grams,
    Ounces,
    Milligrams,
}

impl WeightUnit {
    pub fn parse(raw: &str) -> Option<WeightUnit> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "g" | "gram" | "grams" => Some(WeightUnit::Grams),
            "oz" | "ounce" | "ounces" => Some(WeightUnit::Ounces),
            "mg" | "milligram" | "milligrams" => Some(WeightUnit::Milligrams),
            _ => None,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            WeightUnit::Grams => "g",
            WeightUnit::Ounces => "oz",
            WeightUnit::Milligrams => "mg",
        }
    }

    /// This unit's magnitude expressed in grams, for cross-unit comparisons
    /// (spec §4.3 `weight_similarity`).
    pub fn grams_per_unit(self) -> f64 {
        match self {
            WeightUnit::Grams => 1.0,
            WeightUnit::Ounces => 28.35,
            WeightUnit::Milligrams => 0.001,
        }
    }
}

/// One saleable item, keyed by (product_name, vendor).
///
/// Field list mirrors spec.md §3: the handful of fields every operation in
/// this crate reads or writes are named explicitly; everything else the
/// source spreadsheet carries lives in `extra`, preserved verbatim on
/// upload and round-tripped on export (spec.md §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub product_name: String,
    pub vendor: String,
    pub product_type: ProductType,
    pub lineage: Lineage,
    pub brand: Option<String>,
    pub weight_magnitude: Option<f64>,
    pub weight_unit: Option<WeightUnit>,
    pub price: Option<f64>,
    pub thc_percent: Option<f64>,
    pub cbd_percent: Option<f64>,
    pub thca_percent: Option<f64>,
    pub cbda_percent: Option<f64>,
    pub thc_mg: Option<f64>,
    pub cbd_mg: Option<f64>,
    pub ratio: Option<String>,
    pub doh_compliant: bool,
    pub archived: bool,
    pub accepted_date: Option<chrono::NaiveDate>,
    pub expiration_date: Option<chrono::NaiveDate>,
    pub description: Option<String>,
    pub strain_name: Option<String>,
    /// Source column from the spreadsheet; used by the synthetic-row filter
    /// (spec §4.4) and nowhere else.
    pub source: Option<String>,
    pub match_score: Option<f64>,
    pub match_confidence: Option<f64>,
    /// Every spreadsheet column not named above, keyed by its canonical
    /// (post-alias-resolution) header.
    pub extra: BTreeMap<String, String>,
}

impl Product {
    /// Enforce invariant I-P2: paraphernalia is always lineage PARAPHERNALIA,
    /// regardless of any input. Called on every ingest/upsert path.
    pub fn enforce_paraphernalia_lineage(&mut self) {
        if self.product_type == ProductType::Paraphernalia {
            self.lineage = Lineage::Paraphernalia;
        }
    }

    /// True if this row was produced by matching/AI augmentation rather than
    /// ingested from an authoritative source (spec §4.4 synthetic-row rule).
    pub fn is_synthetic(&self) -> bool {
        if self.match_score.is_some() || self.match_confidence.is_some() {
            return true;
        }
        match &self.source {
            Some(source) => crate::derived::SYNTHETIC_SOURCE_PATTERN.is_match(source),
            None => false,
        }
    }
}
