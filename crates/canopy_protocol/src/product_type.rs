//! The enumerated product-type taxonomy and classic/nonclassic classification.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the fourteen recognized product categories.
///
/// "Classic" types (flower, pre-rolls, concentrates, vape cartridges,
/// rso/co2 tankers) use different weight-rendering and lineage-defaulting
/// rules than "nonclassic" types (edibles, tinctures, topicals, capsules,
/// paraphernalia) — see [`ProductType::is_classic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProductType {
    Flower,
    PreRoll,
    InfusedPreRoll,
    Concentrate,
    SolventlessConcentrate,
    VapeCartridge,
    EdibleSolid,
    EdibleLiquid,
    Tincture,
    Topical,
    Capsule,
    Paraphernalia,
    RsoCo2Tanker,
}

impl ProductType {
    /// Classic types get the plain `<magnitude><unit>` weight rendering and
    /// default to `Hybrid` lineage when unspecified; nonclassic types get
    /// conventional-weight substitution and default to `Mixed`.
    pub fn is_classic(self) -> bool {
        matches!(
            self,
            ProductType::Flower
                | ProductType::PreRoll
                | ProductType::InfusedPreRoll
                | ProductType::Concentrate
                | ProductType::SolventlessConcentrate
                | ProductType::VapeCartridge
                | ProductType::RsoCo2Tanker
        )
    }

    /// Pre-roll variants get joint-ratio parsing and a newline before the
    /// hyphen in `DescAndWeight`.
    pub fn is_pre_roll(self) -> bool {
        matches!(self, ProductType::PreRoll | ProductType::InfusedPreRoll)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProductType::Flower => "flower",
            ProductType::PreRoll => "pre-roll",
            ProductType::InfusedPreRoll => "infused pre-roll",
            ProductType::Concentrate => "concentrate",
            ProductType::SolventlessConcentrate => "solventless concentrate",
            ProductType::VapeCartridge => "vape cartridge",
            ProductType::EdibleSolid => "edible solid",
            ProductType::EdibleLiquid => "edible liquid",
            ProductType::Tincture => "tincture",
            ProductType::Topical => "topical",
            ProductType::Capsule => "capsule",
            ProductType::Paraphernalia => "paraphernalia",
            ProductType::RsoCo2Tanker => "rso/co2 tanker",
        }
    }

    pub fn parse(raw: &str) -> Option<ProductType> {
        let folded = raw.trim().to_ascii_lowercase();
        Some(match folded.as_str() {
            "flower" => ProductType::Flower,
            "pre-roll" | "preroll" | "pre roll" => ProductType::PreRoll,
            "infused pre-roll" | "infused preroll" => ProductType::InfusedPreRoll,
            "concentrate" => ProductType::Concentrate,
            "solventless concentrate" => ProductType::SolventlessConcentrate,
            "vape cartridge" | "cartridge" => ProductType::VapeCartridge,
            "edible solid" => ProductType::EdibleSolid,
            "edible liquid" => ProductType::EdibleLiquid,
            "tincture" => ProductType::Tincture,
            "topical" => ProductType::Topical,
            "capsule" => ProductType::Capsule,
            "paraphernalia" => ProductType::Paraphernalia,
            "rso/co2 tanker" | "rso" | "co2 tanker" => ProductType::RsoCo2Tanker,
            _ => return None,
        })
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_types_are_classified_correctly() {
        assert!(ProductType::Flower.is_classic());
        assert!(ProductType::RsoCo2Tanker.is_classic());
        assert!(!ProductType::EdibleLiquid.is_classic());
        assert!(!ProductType::Paraphernalia.is_classic());
    }

    #[test]
    fn pre_roll_variants_detected() {
        assert!(ProductType::PreRoll.is_pre_roll());
        assert!(ProductType::InfusedPreRoll.is_pre_roll());
        assert!(!ProductType::Flower.is_pre_roll());
    }

    #[test]
    fn parse_is_case_and_spacing_tolerant() {
        assert_eq!(ProductType::parse("Pre-Roll"), Some(ProductType::PreRoll));
        assert_eq!(ProductType::parse("VAPE CARTRIDGE"), Some(ProductType::VapeCartridge));
        assert_eq!(ProductType::parse("not a type"), None);
    }
}
