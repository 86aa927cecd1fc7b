//! Derived fields computed on ingest and on read (spec §3/§4.2).
//!
//! These are pure functions over [`Product`] so the catalog store and the
//! tabular processor compute byte-identical values — there is exactly one
//! place that knows how a label's weight line is rendered.

use crate::product::{Product, WeightUnit};
use crate::product_type::ProductType;
use regex::Regex;
use std::sync::OnceLock;

/// Rows whose `Source` column matches this (case-insensitive) are transient
/// matching artifacts and excluded from persistence (spec §4.4).
pub static SYNTHETIC_SOURCE_PATTERN: LazyRegex = LazyRegex::new(
    r"(?i)JSON Match|AI Match|JSON|AI|Match|Generated",
);

/// A `Regex` built once on first use; avoids a hard dependency on
/// `once_cell`/`std::sync::LazyLock` (not yet stable on this workspace's
/// MSRV) while keeping the call sites ergonomic.
pub struct LazyRegex {
    pattern: &'static str,
    cell: OnceLock<Regex>,
}

impl LazyRegex {
    const fn new(pattern: &'static str) -> Self {
        Self { pattern, cell: OnceLock::new() }
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.get().is_match(haystack)
    }

    pub fn get(&self) -> &Regex {
        self.cell.get_or_init(|| Regex::new(self.pattern).expect("static pattern is valid"))
    }
}

/// Conventional ounce substitution for nonclassic types whose spreadsheet
/// weight was recorded in grams (spec §4.2; table extended per DESIGN.md's
/// Open Question resolution for types spec.md left unspecified).
fn conventional_nonclassic_ounces(product_type: ProductType) -> f64 {
    match product_type {
        ProductType::EdibleLiquid => 2.5,
        ProductType::Tincture => 1.0,
        ProductType::Topical => 1.0,
        ProductType::Capsule => 1.0,
        ProductType::EdibleSolid => 2.5,
        ProductType::Paraphernalia => 1.0,
        // Classic types never reach this branch (see `combined_weight`).
        _ => 1.0,
    }
}

/// Render a magnitude without a trailing `.0` for whole numbers.
fn format_magnitude(magnitude: f64) -> String {
    if magnitude.fract() == 0.0 {
        format!("{}", magnitude as i64)
    } else {
        format!("{magnitude}")
    }
}

/// `CombinedWeight`: magnitude+unit rendered as one string, substituting a
/// conventional ounce weight for nonclassic types recorded in grams.
pub fn combined_weight(product: &Product) -> String {
    let (Some(magnitude), Some(unit)) = (product.weight_magnitude, product.weight_unit) else {
        return String::new();
    };

    if product.product_type.is_classic() {
        return format!("{}{}", format_magnitude(magnitude), unit.suffix());
    }

    if unit == WeightUnit::Grams {
        let oz = conventional_nonclassic_ounces(product.product_type);
        format!("{}{}", format_magnitude(oz), WeightUnit::Ounces.suffix())
    } else {
        format!("{}{}", format_magnitude(magnitude), unit.suffix())
    }
}

/// `DescAndWeight`: "$description$ - $CombinedWeight$"; pre-rolls get the
/// weight on its own line, with the hyphen preceded by a newline and no
/// space before the magnitude (spec §4.2, confirmed by spec §8 scenario 5).
pub fn desc_and_weight(product: &Product) -> String {
    let description = product.description.as_deref().unwrap_or("");
    let weight = combined_weight(product);
    if weight.is_empty() {
        return description.to_string();
    }
    if product.product_type.is_pre_roll() {
        format!("{description}\n-{weight}")
    } else {
        format!("{description} - {weight}")
    }
}

fn joint_ratio_patterns() -> &'static [Regex; 3] {
    static PATTERNS: OnceLock<[Regex; 3]> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            Regex::new(r"(?i)(\d+\.?\d*)g\s*x\s*(\d+)\s*pack").unwrap(),
            Regex::new(r"(?i)(\d+\.?\d*)g\s*x\s*(\d+)").unwrap(),
            Regex::new(r"(?i)(\d+\.?\d*)g\s*$").unwrap(),
        ]
    })
}

/// `JointRatio`: for pre-rolls, parsed from the product name; falls back to
/// the weight field when the name carries no recognizable pattern.
pub fn joint_ratio(product: &Product) -> Option<String> {
    if !product.product_type.is_pre_roll() {
        return None;
    }

    let patterns = joint_ratio_patterns();
    for (index, pattern) in patterns.iter().enumerate() {
        if let Some(captures) = pattern.captures(product.product_name.trim()) {
            let weight: f64 = captures.get(1)?.as_str().parse().ok()?;
            let weight_str = format!("{}g", format_magnitude(weight));
            if index == 2 {
                return Some(weight_str);
            }
            let count: u32 = captures.get(2)?.as_str().parse().ok()?;
            return Some(if count == 1 {
                weight_str
            } else {
                format!("{weight_str} x {count} Pack")
            });
        }
    }

    product.weight_magnitude.map(|magnitude| format!("{}g", format_magnitude(magnitude)))
}

/// `Ratio_or_THC_CBD`: rendered per product-type category, falling back to
/// the three-line placeholder sentinel when nothing is available.
pub fn ratio_or_thc_cbd(product: &Product) -> String {
    if let Some(ratio) = product.ratio.as_deref().filter(|r| !r.trim().is_empty()) {
        return ratio.to_string();
    }

    if product.product_type.is_classic() {
        match (product.thc_percent, product.cbd_percent) {
            (Some(thc), Some(cbd)) => return format!("THC: {thc}% CBD: {cbd}%"),
            (Some(thc), None) => return format!("THC: {thc}%"),
            (None, Some(cbd)) => return format!("CBD: {cbd}%"),
            (None, None) => {}
        }
    } else if let (Some(thc_mg), Some(cbd_mg)) = (product.thc_mg, product.cbd_mg) {
        return format!("{thc_mg}mg THC / {cbd_mg}mg CBD");
    }

    "THC: | BR | C".to_string()
}

/// `Description_Complexity`: a coarse integer classification of how much
/// label real estate a description is expected to need (0 = empty,
/// increasing with word count).
pub fn description_complexity(product: &Product) -> i32 {
    let description = match product.description.as_deref() {
        Some(d) if !d.trim().is_empty() => d,
        _ => return 0,
    };
    let word_count = description.split_whitespace().count();
    match word_count {
        0 => 0,
        1..=3 => 1,
        4..=8 => 2,
        _ => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineage::Lineage;
    use std::collections::BTreeMap;

    fn base_product(product_type: ProductType) -> Product {
        Product {
            product_name: String::new(),
            vendor: "Acme".into(),
            product_type,
            lineage: Lineage::Hybrid,
            brand: None,
            weight_magnitude: None,
            weight_unit: None,
            price: None,
            thc_percent: None,
            cbd_percent: None,
            thca_percent: None,
            cbda_percent: None,
            thc_mg: None,
            cbd_mg: None,
            ratio: None,
            doh_compliant: false,
            archived: false,
            accepted_date: None,
            expiration_date: None,
            description: None,
            strain_name: None,
            source: None,
            match_score: None,
            match_confidence: None,
            extra: BTreeMap::new(),
        }
    }

    #[test]
    fn classic_weight_renders_without_substitution() {
        let mut p = base_product(ProductType::Flower);
        p.weight_magnitude = Some(3.5);
        p.weight_unit = Some(WeightUnit::Grams);
        assert_eq!(combined_weight(&p), "3.5g");
    }

    #[test]
    fn integer_magnitude_has_no_trailing_zero() {
        let mut p = base_product(ProductType::Flower);
        p.weight_magnitude = Some(1.0);
        p.weight_unit = Some(WeightUnit::Grams);
        assert_eq!(combined_weight(&p), "1g");
    }

    #[test]
    fn edible_liquid_substitutes_conventional_ounces() {
        let mut p = base_product(ProductType::EdibleLiquid);
        p.weight_magnitude = Some(75.0);
        p.weight_unit = Some(WeightUnit::Grams);
        assert_eq!(combined_weight(&p), "2.5oz");
    }

    #[test]
    fn tincture_substitutes_one_ounce() {
        let mut p = base_product(ProductType::Tincture);
        p.weight_magnitude = Some(30.0);
        p.weight_unit = Some(WeightUnit::Grams);
        assert_eq!(combined_weight(&p), "1oz");
    }

    #[test]
    fn pre_roll_desc_and_weight_has_leading_newline() {
        let mut p = base_product(ProductType::PreRoll);
        p.product_name = "Strawberry Cough Pre-Roll 0.5g x 2 Pack".into();
        p.description = Some("Strawberry Cough Pre-Roll".into());
        p.weight_magnitude = None;
        assert_eq!(joint_ratio(&p).as_deref(), Some("0.5g x 2 Pack"));
        assert_eq!(desc_and_weight(&p), "Strawberry Cough Pre-Roll\n-0.5g x 2 Pack");
    }

    #[test]
    fn joint_ratio_single_pack_omits_count() {
        let mut p = base_product(ProductType::PreRoll);
        p.product_name = "X 0.5g x 1 Pack".into();
        assert_eq!(joint_ratio(&p).as_deref(), Some("0.5g"));
    }

    #[test]
    fn joint_ratio_falls_back_to_weight_field() {
        let mut p = base_product(ProductType::PreRoll);
        p.product_name = "Plain Name With No Pattern".into();
        p.weight_magnitude = Some(1.0);
        assert_eq!(joint_ratio(&p).as_deref(), Some("1g"));
    }

    #[test]
    fn ratio_defaults_to_sentinel() {
        let p = base_product(ProductType::Flower);
        assert_eq!(ratio_or_thc_cbd(&p), "THC: | BR | C");
    }

    #[test]
    fn synthetic_source_pattern_matches_json_match() {
        assert!(SYNTHETIC_SOURCE_PATTERN.is_match("JSON Match"));
        assert!(SYNTHETIC_SOURCE_PATTERN.is_match("ai match"));
        assert!(!SYNTHETIC_SOURCE_PATTERN.is_match("Manual Entry"));
    }
}
