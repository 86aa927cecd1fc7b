//! `fetch_and_match`: the public entry point for C3 (spec §4.3).

use crate::ensemble::{fixed_combination, FeedbackEnsemble};
use crate::error::{MatchError, Result};
use crate::feed::{parse_feed, InventoryItem};
use crate::features::compute_features;
use base64::{engine::general_purpose, Engine as _};
use canopy_catalog_db::CatalogStore;
use canopy_protocol::defaults::{
    DATABASE_PRIORITY_CONFIDENCE, DATABASE_PRIORITY_SCORE, FIXED_MODEL_CONFIDENCE, MATCH_EMISSION_THRESHOLD,
};
use canopy_protocol::{MatchCandidate, MatchFeatures, MatchSource, Product};
use canopy_tabular::TabularProcessor;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{info, warn};

/// The fuzzy matching engine (C3): resolves a JSON inventory feed against
/// the catalog store and the live in-memory table.
pub struct MatchingEngine<'a> {
    catalog: &'a CatalogStore,
    table: &'a TabularProcessor,
    client: reqwest::Client,
    feedback_model: Option<FeedbackEnsemble>,
    store_name: Option<String>,
}

impl<'a> MatchingEngine<'a> {
    pub fn new(catalog: &'a CatalogStore, table: &'a TabularProcessor) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client builder with a fixed timeout cannot fail");
        Self { catalog, table, client, feedback_model: None, store_name: None }
    }

    pub fn with_store(mut self, store_name: Option<String>) -> Self {
        self.store_name = store_name;
        self
    }

    pub fn with_feedback_model(mut self, model: FeedbackEnsemble) -> Self {
        self.feedback_model = Some(model);
        self
    }

    /// Fetch `url`, resolve every item against the catalog (preferred) and
    /// the table (fallback), and return ranked, deduplicated candidates.
    /// An empty result is success, not an error (spec §4.3/§7).
    pub async fn fetch_and_match(&self, url: &str) -> Result<Vec<MatchCandidate>> {
        let body = self.fetch_body(url).await?;
        let items = parse_feed(&body)?;

        let mut by_target: BTreeMap<String, MatchCandidate> = BTreeMap::new();
        let table_rows = self.table.available_tags();

        for item in &items {
            if let Some(candidate) = self.database_priority_match(item).await {
                upsert_best(&mut by_target, candidate);
                continue;
            }

            for candidate_row in self.vendor_isolated_candidates(item, &table_rows) {
                match self.score_table_candidate(item, candidate_row) {
                    Some(candidate) if candidate.score >= MATCH_EMISSION_THRESHOLD => {
                        upsert_best(&mut by_target, candidate);
                    }
                    _ => {}
                }
            }
        }

        let mut results: Vec<MatchCandidate> = by_target.into_values().collect();
        results.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

        info!(items = items.len(), matches = results.len(), url, "fetch_and_match complete");
        Ok(results)
    }

    /// Resolve `url` to a body string. Supports plain `http(s)` fetches via
    /// `reqwest` and `data:` URLs (decoded locally) for test fixtures —
    /// `reqwest` itself rejects the `data:` scheme (spec §4.3 step 1).
    async fn fetch_body(&self, url: &str) -> Result<String> {
        if let Some(payload) = url.strip_prefix("data:") {
            return decode_data_url(payload);
        }

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(MatchError::BadStatus(response.status()));
        }
        Ok(response.text().await?)
    }

    async fn database_priority_match(&self, item: &InventoryItem) -> Option<MatchCandidate> {
        let names = vec![item.product_name.clone()];
        let hits = match self.catalog.get_products_by_names(self.store_name.as_deref(), &names).await {
            Ok(hits) => hits,
            Err(err) => {
                warn!(error = %err, "catalog lookup failed during database-priority match");
                return None;
            }
        };

        let candidate = hits.into_iter().next()?;
        Some(MatchCandidate {
            source_product_name: item.product_name.clone(),
            target_product_name: candidate.product_name.clone(),
            target_vendor: candidate.vendor.clone(),
            score: DATABASE_PRIORITY_SCORE,
            confidence: DATABASE_PRIORITY_CONFIDENCE,
            explanation: "Exact catalog match".to_string(),
            features: MatchFeatures {
                text_similarity: 1.0,
                semantic_similarity: 1.0,
                weight_similarity: 1.0,
                price_similarity: 1.0,
                vendor_similarity: 1.0,
                brand_similarity: 1.0,
                type_similarity: 1.0,
                cannabinoid_similarity: 1.0,
                length_similarity: 1.0,
                token_overlap: 1.0,
                edit_distance: 1.0,
                phonetic_similarity: 1.0,
            },
            source: MatchSource::DatabasePriority,
        })
    }

    /// Vendor isolation (spec §4.3 step 4, P7): only rows whose vendor
    /// case-folds equal to the item's vendor are admissible.
    fn vendor_isolated_candidates<'t>(&self, item: &InventoryItem, rows: &'t [Product]) -> Vec<&'t Product> {
        let vendor_fold = item.vendor.to_ascii_lowercase();
        rows.iter().filter(|row| row.vendor.to_ascii_lowercase() == vendor_fold).collect()
    }

    fn score_table_candidate(&self, item: &InventoryItem, candidate: &Product) -> Option<MatchCandidate> {
        let features = compute_features(item, candidate);

        let (score, confidence) = match &self.feedback_model {
            Some(model) => model.predict(&features),
            None => (fixed_combination(&features), FIXED_MODEL_CONFIDENCE),
        };

        Some(MatchCandidate {
            source_product_name: item.product_name.clone(),
            target_product_name: candidate.product_name.clone(),
            target_vendor: candidate.vendor.clone(),
            score,
            confidence,
            explanation: explain(&features),
            features,
            source: MatchSource::TableFuzzy,
        })
    }
}

/// Decode the part of a `data:` URL after the `data:` prefix:
/// `[<mediatype>][;base64],<data>`. Supports both the base64-encoded form
/// and plain percent-encoded text, per RFC 2397.
fn decode_data_url(rest: &str) -> Result<String> {
    let comma = rest.find(',').ok_or_else(|| MatchError::MalformedDataUrl("missing comma separator".to_string()))?;
    let (meta, payload) = (&rest[..comma], &rest[comma + 1..]);

    if meta.split(';').any(|part| part.eq_ignore_ascii_case("base64")) {
        let bytes = general_purpose::STANDARD
            .decode(payload)
            .map_err(|err| MatchError::MalformedDataUrl(format!("invalid base64: {err}")))?;
        String::from_utf8(bytes).map_err(|err| MatchError::MalformedDataUrl(format!("invalid utf-8: {err}")))
    } else {
        percent_decode(payload)
    }
}

/// Minimal RFC 3986 percent-decoder; `data:` URLs carrying JSON fixtures
/// never rely on `+`-for-space form encoding, so `+` passes through as-is.
fn percent_decode(input: &str) -> Result<String> {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes
                .get(i + 1..i + 3)
                .and_then(|h| std::str::from_utf8(h).ok())
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| MatchError::MalformedDataUrl("invalid percent-encoding".to_string()))?;
            decoded.push(hex);
            i += 3;
        } else {
            decoded.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(decoded).map_err(|err| MatchError::MalformedDataUrl(format!("invalid utf-8: {err}")))
}

/// Keep the higher-scoring candidate per deduplicated target name (spec
/// §4.3 step 5).
fn upsert_best(by_target: &mut BTreeMap<String, MatchCandidate>, candidate: MatchCandidate) {
    let key = candidate.target_product_name.to_ascii_lowercase();
    by_target
        .entry(key)
        .and_modify(|existing| {
            if candidate.score > existing.score {
                *existing = candidate.clone();
            }
        })
        .or_insert(candidate);
}

fn explain(features: &MatchFeatures) -> String {
    let mut reasons = Vec::new();
    if features.vendor_similarity > 0.8 {
        reasons.push("Same vendor/supplier");
    }
    if features.text_similarity > 0.8 {
        reasons.push("Very similar product names");
    }
    if features.brand_similarity > 0.8 {
        reasons.push("Matching brand");
    }
    if features.weight_similarity > 0.8 {
        reasons.push("Comparable weight");
    }
    if features.cannabinoid_similarity > 0.8 {
        reasons.push("Comparable cannabinoid profile");
    }
    if reasons.is_empty() {
        "Weak overall similarity".to_string()
    } else {
        reasons.join("; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_protocol::{Lineage, ProductType, WeightUnit};
    use std::collections::BTreeMap as Map;
    use tempfile::tempdir;

    fn sample_product(name: &str, vendor: &str) -> Product {
        Product {
            product_name: name.into(),
            vendor: vendor.into(),
            product_type: ProductType::Flower,
            lineage: Lineage::Sativa,
            brand: None,
            weight_magnitude: Some(3.5),
            weight_unit: Some(WeightUnit::Grams),
            price: Some(40.0),
            thc_percent: Some(22.0),
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
            extra: Map::new(),
        }
    }

    #[tokio::test]
    async fn vendor_isolation_excludes_other_vendor_rows() {
        let dir = tempdir().unwrap();
        let catalog = CatalogStore::new(dir.path());
        let table = TabularProcessor::new();

        let path = dir.path().join("rows.csv");
        std::fs::write(&path, "Product Name*,Vendor/Supplier*,Product Type*\nBlue Dream 3.5g,Other,flower\n")
            .unwrap();
        table.load(&path).unwrap();

        let engine = MatchingEngine::new(&catalog, &table);
        let item = InventoryItem {
            product_name: "Blue Dream 3.5g".into(),
            vendor: "Acme".into(),
            brand: None,
            inventory_type: None,
            weight_magnitude: Some(3.5),
            weight_unit: Some(WeightUnit::Grams),
            thc_percent: None,
            cbd_percent: None,
            thca_percent: None,
            cbda_percent: None,
        };
        let candidate = engine.vendor_isolated_candidates(&item, &table.available_tags());
        assert!(candidate.is_empty());
    }

    #[tokio::test]
    async fn fetch_and_match_decodes_plain_data_url() {
        let dir = tempdir().unwrap();
        let catalog = CatalogStore::new(dir.path());
        let table = TabularProcessor::new();
        let engine = MatchingEngine::new(&catalog, &table);

        let url = "data:application/json,%5B%5D"; // percent-encoded "[]"
        let results = engine.fetch_and_match(url).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn fetch_and_match_decodes_base64_data_url() {
        use base64::{engine::general_purpose, Engine as _};

        let dir = tempdir().unwrap();
        let catalog = CatalogStore::new(dir.path());
        let table = TabularProcessor::new();
        let engine = MatchingEngine::new(&catalog, &table);

        let encoded = general_purpose::STANDARD.encode("[]");
        let url = format!("data:application/json;base64,{encoded}");
        let results = engine.fetch_and_match(&url).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn database_priority_wins_over_table_fuzzy_scoring() {
        let dir = tempdir().unwrap();
        let catalog = CatalogStore::new(dir.path());
        catalog.add_or_update_product(None, sample_product("Blue Dream 3.5g", "Acme")).await.unwrap();
        let table = TabularProcessor::new();

        let engine = MatchingEngine::new(&catalog, &table);
        let item = InventoryItem {
            product_name: "Blue Dream 3.5g".into(),
            vendor: "Acme".into(),
            brand: None,
            inventory_type: None,
            weight_magnitude: None,
            weight_unit: None,
            thc_percent: None,
            cbd_percent: None,
            thca_percent: None,
            cbda_percent: None,
        };
        let candidate = engine.database_priority_match(&item).await.unwrap();
        assert_eq!(candidate.score, DATABASE_PRIORITY_SCORE);
        assert_eq!(candidate.source, MatchSource::DatabasePriority);
    }
}
