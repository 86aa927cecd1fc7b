//! The canonical plant-strain record and its sovereign-override lineage rule.

use crate::lineage::Lineage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A canonical strain record, keyed by case-folded `strain_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strain {
    pub strain_name: String,
    /// The learned majority lineage across ingests.
    pub canonical_lineage: Option<Lineage>,
    /// An operator override; once set, takes precedence on every read.
    pub sovereign_lineage: Option<Lineage>,
    pub occurrence_count: u64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub confidence: f64,
}

impl Strain {
    pub fn new(strain_name: impl Into<String>, lineage: Lineage, observed_at: DateTime<Utc>) -> Self {
        Self {
            strain_name: strain_name.into(),
            canonical_lineage: Some(lineage),
            sovereign_lineage: None,
            occurrence_count: 1,
            first_seen: observed_at,
            last_seen: observed_at,
            confidence: 1.0,
        }
    }

    /// Invariant I-S1: sovereign overrides canonical, which overrides MIXED.
    pub fn effective_lineage(&self) -> Lineage {
        self.sovereign_lineage
            .or(self.canonical_lineage)
            .unwrap_or(Lineage::Mixed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sovereign_overrides_canonical() {
        let mut strain = Strain::new("Blue Dream", Lineage::Sativa, Utc::now());
        assert_eq!(strain.effective_lineage(), Lineage::Sativa);
        strain.sovereign_lineage = Some(Lineage::Indica);
        assert_eq!(strain.effective_lineage(), Lineage::Indica);
    }

    #[test]
    fn clearing_sovereign_exposes_canonical_again() {
        let mut strain = Strain::new("Blue Dream", Lineage::Sativa, Utc::now());
        strain.sovereign_lineage = Some(Lineage::Indica);
        strain.sovereign_lineage = None;
        assert_eq!(strain.effective_lineage(), Lineage::Sativa);
    }

    #[test]
    fn no_lineage_at_all_is_mixed() {
        let strain = Strain {
            strain_name: "Unknown".into(),
            canonical_lineage: None,
            sovereign_lineage: None,
            occurrence_count: 0,
            first_seen: Utc::now(),
            last_seen: Utc::now(),
            confidence: 0.0,
        };
        assert_eq!(strain.effective_lineage(), Lineage::Mixed);
    }
}
