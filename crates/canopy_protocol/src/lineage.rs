//! The cannabis plant-lineage sum type and its textual normalization rules.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A categorical label describing cannabis plant genetics.
///
/// All free-text lineage inputs are normalized to one of these variants;
/// an input this crate cannot classify becomes [`Lineage::Mixed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Lineage {
    Sativa,
    Indica,
    Hybrid,
    HybridSativa,
    HybridIndica,
    Cbd,
    CbdBlend,
    Mixed,
    Paraphernalia,
}

impl Lineage {
    /// The canonical on-disk/wire spelling for this lineage.
    pub fn as_str(self) -> &'static str {
        match self {
            Lineage::Sativa => "SATIVA",
            Lineage::Indica => "INDICA",
            Lineage::Hybrid => "HYBRID",
            Lineage::HybridSativa => "HYBRID/SATIVA",
            Lineage::HybridIndica => "HYBRID/INDICA",
            Lineage::Cbd => "CBD",
            Lineage::CbdBlend => "CBD_BLEND",
            Lineage::Mixed => "MIXED",
            Lineage::Paraphernalia => "PARAPHERNALIA",
        }
    }

    /// Normalize free text into a `Lineage`, falling back to `default_for_empty`
    /// when the input is empty/NaN-like rather than unconditionally `Mixed` —
    /// classic product types default empty lineage to `Hybrid` (spec §4.2).
    pub fn normalize(raw: &str, default_for_empty: Lineage) -> Lineage {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
            return default_for_empty;
        }
        let upper = trimmed.to_ascii_uppercase().replace(['-', ' '], "_");
        match upper.as_str() {
            "SATIVA" => Lineage::Sativa,
            "INDICA" => Lineage::Indica,
            "HYBRID" => Lineage::Hybrid,
            "HYBRID_SATIVA" | "SATIVA_HYBRID" => Lineage::HybridSativa,
            "HYBRID_INDICA" | "INDICA_HYBRID" => Lineage::HybridIndica,
            "CBD" => Lineage::Cbd,
            "CBD_BLEND" | "CBDBLEND" => Lineage::CbdBlend,
            "PARAPHERNALIA" => Lineage::Paraphernalia,
            _ => Lineage::Mixed,
        }
    }
}

impl fmt::Display for Lineage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Lineage {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Lineage::normalize(s, Lineage::Mixed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_hybrid_synonyms() {
        assert_eq!(Lineage::normalize("INDICA_HYBRID", Lineage::Mixed), Lineage::HybridIndica);
        assert_eq!(Lineage::normalize("SATIVA_HYBRID", Lineage::Mixed), Lineage::HybridSativa);
        assert_eq!(Lineage::normalize("indica-hybrid", Lineage::Mixed), Lineage::HybridIndica);
    }

    #[test]
    fn empty_falls_back_to_caller_default() {
        assert_eq!(Lineage::normalize("", Lineage::Hybrid), Lineage::Hybrid);
        assert_eq!(Lineage::normalize("NaN", Lineage::Mixed), Lineage::Mixed);
    }

    #[test]
    fn unknown_text_becomes_mixed() {
        assert_eq!(Lineage::normalize("glue sniffer special", Lineage::Hybrid), Lineage::Mixed);
    }

    #[test]
    fn display_matches_wire_spelling() {
        assert_eq!(Lineage::HybridIndica.to_string(), "HYBRID/INDICA");
    }
}
