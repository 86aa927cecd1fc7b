//! Twelve-feature computation per (input item, candidate product) pair
//! (spec §4.3).

use crate::feed::InventoryItem;
use crate::soundex::phonetic_similarity;
use crate::text_ratios::text_similarity;
use crate::tfidf::semantic_similarity;
use canopy_protocol::{MatchFeatures, Product};

pub fn compute_features(item: &InventoryItem, candidate: &Product) -> MatchFeatures {
    MatchFeatures {
        text_similarity: text_similarity(&item.product_name, &candidate.product_name),
        semantic_similarity: semantic_similarity(&item.product_name, &candidate.product_name),
        weight_similarity: weight_similarity(item, candidate),
        price_similarity: 0.5,
        vendor_similarity: fuzzy_fold(&item.vendor, &candidate.vendor),
        brand_similarity: optional_fuzzy(item.brand.as_deref(), candidate.brand.as_deref()),
        type_similarity: type_similarity(item, candidate),
        cannabinoid_similarity: cannabinoid_similarity(item, candidate),
        length_similarity: length_similarity(&item.product_name, &candidate.product_name),
        token_overlap: token_overlap(&item.product_name, &candidate.product_name),
        edit_distance: edit_distance(&item.product_name, &candidate.product_name),
        phonetic_similarity: phonetic_similarity(&item.product_name, &candidate.product_name),
    }
}

fn fuzzy_fold(a: &str, b: &str) -> f64 {
    crate::text_ratios::plain_ratio(&a.to_ascii_lowercase(), &b.to_ascii_lowercase())
}

fn optional_fuzzy(a: Option<&str>, b: Option<&str>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => fuzzy_fold(a, b),
        _ => 0.5,
    }
}

/// min/max ratio with tolerance bands (spec §4.3 `price_similarity`);
/// exposed separately because `InventoryItem` carries no price field —
/// callers with a source price (diagnose endpoint, feedback replay) use
/// this directly instead of going through [`compute_features`].
pub fn price_similarity(source_price: Option<f64>, candidate_price: Option<f64>) -> f64 {
    match (source_price, candidate_price) {
        (Some(a), Some(b)) if a > 0.0 && b > 0.0 => {
            let ratio = a.min(b) / a.max(b);
            if ratio >= 0.8 {
                1.0
            } else if ratio >= 0.6 {
                0.8
            } else {
                ratio
            }
        }
        _ => 0.5,
    }
}

fn weight_similarity(item: &InventoryItem, candidate: &Product) -> f64 {
    let (Some(item_mag), Some(item_unit)) = (item.weight_magnitude, item.weight_unit) else {
        return 0.5;
    };
    let (Some(cand_mag), Some(cand_unit)) = (candidate.weight_magnitude, candidate.weight_unit) else {
        return 0.5;
    };

    let item_grams = item_mag * item_unit.grams_per_unit();
    let cand_grams = cand_mag * cand_unit.grams_per_unit();
    if item_grams <= 0.0 || cand_grams <= 0.0 {
        return 0.5;
    }
    item_grams.min(cand_grams) / item_grams.max(cand_grams)
}

fn type_similarity(item: &InventoryItem, candidate: &Product) -> f64 {
    let Some(inventory_type) = item.inventory_type.as_deref() else {
        return 0.5;
    };
    if inventory_type.eq_ignore_ascii_case(candidate.product_type.as_str()) {
        1.0
    } else {
        fuzzy_fold(inventory_type, candidate.product_type.as_str())
    }
}

fn cannabinoid_similarity(item: &InventoryItem, candidate: &Product) -> f64 {
    let pairs = [
        (item.thc_percent, candidate.thc_percent),
        (item.cbd_percent, candidate.cbd_percent),
        (item.thca_percent, candidate.thca_percent),
        (item.cbda_percent, candidate.cbda_percent),
    ];

    let ratios: Vec<f64> = pairs
        .into_iter()
        .filter_map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) if a > 0.0 && b > 0.0 => Some(a.min(b) / a.max(b)),
            (Some(0.0), Some(0.0)) => Some(1.0),
            _ => None,
        })
        .collect();

    if ratios.is_empty() {
        0.5
    } else {
        ratios.iter().sum::<f64>() / ratios.len() as f64
    }
}

fn length_similarity(a: &str, b: &str) -> f64 {
    let (len_a, len_b) = (a.chars().count(), b.chars().count());
    if len_a == 0 && len_b == 0 {
        return 1.0;
    }
    let max_len = len_a.max(len_b);
    if max_len == 0 {
        return 1.0;
    }
    len_a.min(len_b) as f64 / max_len as f64
}

fn token_overlap(a: &str, b: &str) -> f64 {
    use std::collections::BTreeSet;
    let a_fold = a.to_ascii_lowercase();
    let b_fold = b.to_ascii_lowercase();
    let tokens_a: BTreeSet<&str> = a_fold.split_whitespace().collect();
    let tokens_b: BTreeSet<&str> = b_fold.split_whitespace().collect();
    let union_len = tokens_a.union(&tokens_b).count();
    if union_len == 0 {
        return 1.0;
    }
    tokens_a.intersection(&tokens_b).count() as f64 / union_len as f64
}

fn edit_distance(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (strsim::levenshtein(a, b) as f64 / max_len as f64)
}
