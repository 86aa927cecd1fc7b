//! `CatalogStore`: the persistent product/strain repository (C1).

use crate::error::{DbError, Result};
use crate::pool::{open_pool, store_path};
use crate::rows::{extra_json, ProductRow, StrainRow};
use canopy_protocol::{Lineage, Product, Strain};
use chrono::Utc;
use sqlx::SqlitePool;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{info, warn};

const DEFAULT_STORE_KEY: &str = "__default__";

/// Result of a bulk table ingest (spec §4.4 `store_excel_data`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreResult {
    pub stored: usize,
    pub excluded_synthetic: usize,
    pub total_rows: usize,
}

/// Durable product/strain catalog, partitioned by named store (spec §6).
///
/// One [`SqlitePool`] per store, opened lazily and cached for the lifetime
/// of the process — generalizes the teacher's single-pool-per-file idiom
/// to the multi-store partitioning this spec allows.
pub struct CatalogStore {
    base_dir: PathBuf,
    pools: Mutex<HashMap<String, SqlitePool>>,
}

impl CatalogStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into(), pools: Mutex::new(HashMap::new()) }
    }

    fn store_key(store_name: Option<&str>) -> String {
        store_name.map(str::to_string).unwrap_or_else(|| DEFAULT_STORE_KEY.to_string())
    }

    async fn pool_for(&self, store_name: Option<&str>) -> Result<SqlitePool> {
        let key = Self::store_key(store_name);

        if let Some(pool) = self.pools.lock().unwrap().get(&key) {
            return Ok(pool.clone());
        }

        let path = store_path(&self.base_dir, store_name);
        let pool = open_pool(&path).await?;
        crate::schema::ensure_schema(&pool).await?;

        self.pools.lock().unwrap().insert(key, pool.clone());
        Ok(pool)
    }

    /// Upsert by (product_name, vendor); triggers strain reconciliation
    /// (spec §4.4 lineage-reconciliation rule).
    pub async fn add_or_update_product(&self, store_name: Option<&str>, mut product: Product) -> Result<()> {
        let pool = self.pool_for(store_name).await?;

        product.enforce_paraphernalia_lineage();

        if product.product_type != canopy_protocol::ProductType::Paraphernalia {
            if let Some(strain_name) = product.strain_name.clone() {
                let strain = self.reconcile_strain(&pool, &strain_name, product.lineage).await?;
                product.lineage = strain.effective_lineage();
            }
        }

        let extra = extra_json(&product)?;
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"INSERT INTO products (
                product_name, vendor, product_name_fold, vendor_fold, product_type, lineage,
                brand, weight_magnitude, weight_unit, price, thc_percent, cbd_percent,
                thca_percent, cbda_percent, thc_mg, cbd_mg, ratio, doh_compliant, archived,
                accepted_date, expiration_date, description, strain_name, source,
                match_score, match_confidence, extra_json, updated_at
            ) VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)
            ON CONFLICT(product_name_fold, vendor_fold) DO UPDATE SET
                product_name = excluded.product_name,
                vendor = excluded.vendor,
                product_type = excluded.product_type,
                lineage = excluded.lineage,
                brand = COALESCE(excluded.brand, products.brand),
                weight_magnitude = COALESCE(excluded.weight_magnitude, products.weight_magnitude),
                weight_unit = COALESCE(excluded.weight_unit, products.weight_unit),
                price = COALESCE(excluded.price, products.price),
                thc_percent = COALESCE(excluded.thc_percent, products.thc_percent),
                cbd_percent = COALESCE(excluded.cbd_percent, products.cbd_percent),
                thca_percent = COALESCE(excluded.thca_percent, products.thca_percent),
                cbda_percent = COALESCE(excluded.cbda_percent, products.cbda_percent),
                thc_mg = COALESCE(excluded.thc_mg, products.thc_mg),
                cbd_mg = COALESCE(excluded.cbd_mg, products.cbd_mg),
                ratio = COALESCE(excluded.ratio, products.ratio),
                doh_compliant = excluded.doh_compliant,
                archived = excluded.archived,
                accepted_date = COALESCE(excluded.accepted_date, products.accepted_date),
                expiration_date = COALESCE(excluded.expiration_date, products.expiration_date),
                description = COALESCE(excluded.description, products.description),
                strain_name = COALESCE(excluded.strain_name, products.strain_name),
                source = COALESCE(excluded.source, products.source),
                match_score = excluded.match_score,
                match_confidence = excluded.match_confidence,
                extra_json = excluded.extra_json,
                updated_at = excluded.updated_at"#,
        )
        .bind(&product.product_name)
        .bind(&product.vendor)
        .bind(product.product_name.to_ascii_lowercase())
        .bind(product.vendor.to_ascii_lowercase())
        .bind(product.product_type.as_str())
        .bind(product.lineage.as_str())
        .bind(&product.brand)
        .bind(product.weight_magnitude)
        .bind(product.weight_unit.map(|u| u.suffix()))
        .bind(product.price)
        .bind(product.thc_percent)
        .bind(product.cbd_percent)
        .bind(product.thca_percent)
        .bind(product.cbda_percent)
        .bind(product.thc_mg)
        .bind(product.cbd_mg)
        .bind(&product.ratio)
        .bind(product.doh_compliant as i64)
        .bind(product.archived as i64)
        .bind(product.accepted_date.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(product.expiration_date.map(|d| d.format("%Y-%m-%d").to_string()))
        .bind(&product.description)
        .bind(&product.strain_name)
        .bind(&product.source)
        .bind(product.match_score)
        .bind(product.match_confidence)
        .bind(extra)
        .bind(now)
        .execute(&pool)
        .await?;

        Ok(())
    }

    /// Upsert by case-folded name; majority-vote lineage aggregation weighted
    /// by recency, with an optional sovereign override (spec §4.4).
    pub async fn add_or_update_strain(
        &self,
        store_name: Option<&str>,
        name: &str,
        lineage: Lineage,
        sovereign: bool,
    ) -> Result<Strain> {
        let pool = self.pool_for(store_name).await?;
        self.reconcile_strain_with_sovereign(&pool, name, lineage, sovereign).await
    }

    async fn reconcile_strain(&self, pool: &SqlitePool, name: &str, lineage: Lineage) -> Result<Strain> {
        self.reconcile_strain_with_sovereign(pool, name, lineage, false).await
    }

    async fn reconcile_strain_with_sovereign(
        &self,
        pool: &SqlitePool,
        name: &str,
        lineage: Lineage,
        sovereign: bool,
    ) -> Result<Strain> {
        let fold = name.to_ascii_lowercase();
        let now = Utc::now();

        let existing: Option<(String, i64, String, String)> = sqlx::query_as(
            "SELECT strain_name, occurrence_count, first_seen, lineage_votes_json FROM strains WHERE strain_name_fold = ?",
        )
        .bind(&fold)
        .fetch_optional(pool)
        .await?;

        let (occurrence_count, first_seen, mut votes) = match existing {
            Some((_, count, first_seen, votes_json)) => {
                let votes: BTreeMap<String, u64> = serde_json::from_str(&votes_json).unwrap_or_default();
                (count, first_seen, votes)
            }
            None => (0, now.to_rfc3339(), BTreeMap::new()),
        };

        *votes.entry(lineage.as_str().to_string()).or_insert(0) += 1;
        let canonical = majority_lineage(&votes, lineage);
        let votes_json = serde_json::to_string(&votes)?;

        let sovereign_clause = if sovereign {
            "sovereign_lineage = excluded.sovereign_lineage,"
        } else {
            ""
        };

        let sql = format!(
            r#"INSERT INTO strains (
                strain_name_fold, strain_name, canonical_lineage, sovereign_lineage,
                occurrence_count, first_seen, last_seen, confidence, lineage_votes_json
            ) VALUES (?,?,?,?,?,?,?,?,?)
            ON CONFLICT(strain_name_fold) DO UPDATE SET
                strain_name = excluded.strain_name,
                canonical_lineage = excluded.canonical_lineage,
                {sovereign_clause}
                occurrence_count = excluded.occurrence_count,
                last_seen = excluded.last_seen,
                lineage_votes_json = excluded.lineage_votes_json"#
        );

        sqlx::query(&sql)
            .bind(&fold)
            .bind(name)
            .bind(canonical.as_str())
            .bind(sovereign.then(|| lineage.as_str().to_string()))
            .bind(occurrence_count + 1)
            .bind(&first_seen)
            .bind(now.to_rfc3339())
            .bind(1.0_f64)
            .bind(votes_json)
            .execute(pool)
            .await?;

        self.get_strain_on(pool, name).await?.ok_or_else(|| DbError::not_found(name.to_string()))
    }

    async fn get_strain_on(&self, pool: &SqlitePool, name: &str) -> Result<Option<Strain>> {
        let fold = name.to_ascii_lowercase();
        let row: Option<StrainRow> = sqlx::query_as(
            "SELECT strain_name, canonical_lineage, sovereign_lineage, occurrence_count, first_seen, last_seen, confidence FROM strains WHERE strain_name_fold = ?",
        )
        .bind(fold)
        .fetch_optional(pool)
        .await?;
        Ok(row.map(StrainRow::into_strain))
    }

    pub async fn get_strain(&self, store_name: Option<&str>, name: &str) -> Result<Option<Strain>> {
        let pool = self.pool_for(store_name).await?;
        self.get_strain_on(&pool, name).await
    }

    /// Batch case-folded lookup (spec §4.4).
    pub async fn get_products_by_names(&self, store_name: Option<&str>, names: &[String]) -> Result<Vec<Product>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let pool = self.pool_for(store_name).await?;

        let placeholders = names.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let sql = format!(
            "SELECT product_name, vendor, product_type, lineage, brand, weight_magnitude, weight_unit, \
             price, thc_percent, cbd_percent, thca_percent, cbda_percent, thc_mg, cbd_mg, ratio, \
             doh_compliant, archived, accepted_date, expiration_date, description, strain_name, \
             source, match_score, match_confidence, extra_json \
             FROM products WHERE product_name_fold IN ({placeholders})"
        );

        let mut query = sqlx::query_as::<_, ProductRow>(&sql);
        for name in names {
            query = query.bind(name.to_ascii_lowercase());
        }

        let rows = query.fetch_all(&pool).await?;
        rows.into_iter().map(ProductRow::into_product).collect()
    }

    /// Bulk upsert with synthetic-row exclusion (spec §4.4).
    pub async fn store_excel_data(
        &self,
        store_name: Option<&str>,
        products: &[Product],
        source_file: &str,
    ) -> Result<StoreResult> {
        let total_rows = products.len();
        let mut stored = 0;
        let mut excluded_synthetic = 0;

        for product in products {
            if product.is_synthetic() {
                excluded_synthetic += 1;
                continue;
            }
            let mut product = product.clone();
            if product.source.is_none() {
                product.source = Some(source_file.to_string());
            }
            self.add_or_update_product(store_name, product).await?;
            stored += 1;
        }

        info!(stored, excluded_synthetic, total_rows, source_file, "stored excel data");
        Ok(StoreResult { stored, excluded_synthetic, total_rows })
    }

    /// Administrative wipe of a store's contents.
    pub async fn clear_all_data(&self, store_name: Option<&str>) -> Result<()> {
        let pool = self.pool_for(store_name).await?;
        sqlx::query("DELETE FROM products").execute(&pool).await?;
        sqlx::query("DELETE FROM strains").execute(&pool).await?;
        warn!(store = ?store_name, "cleared all catalog data");
        Ok(())
    }

    pub async fn all_products(&self, store_name: Option<&str>) -> Result<Vec<Product>> {
        let pool = self.pool_for(store_name).await?;
        let rows: Vec<ProductRow> = sqlx::query_as(
            "SELECT product_name, vendor, product_type, lineage, brand, weight_magnitude, weight_unit, \
             price, thc_percent, cbd_percent, thca_percent, cbda_percent, thc_mg, cbd_mg, ratio, \
             doh_compliant, archived, accepted_date, expiration_date, description, strain_name, \
             source, match_score, match_confidence, extra_json FROM products",
        )
        .fetch_all(&pool)
        .await?;
        rows.into_iter().map(ProductRow::into_product).collect()
    }

    /// Recompute derived fields on every row (spec §4.4 batch repair
    /// operations). `description`/`ratio`/`joint_ratio` live only as
    /// computed views over stored fields, so "repair" here means ensuring
    /// the stored inputs those views read are non-null, not rewriting a
    /// derived column in place.
    pub async fn populate_missing_columns(&self, store_name: Option<&str>) -> Result<usize> {
        let pool = self.pool_for(store_name).await?;
        let result = sqlx::query(
            "UPDATE products SET ratio = 'THC: | BR | C' WHERE ratio IS NULL OR TRIM(ratio) = ''",
        )
        .execute(&pool)
        .await?;
        Ok(result.rows_affected() as usize)
    }

    pub async fn update_all_descriptions(&self, store_name: Option<&str>) -> Result<usize> {
        let products = self.all_products(store_name).await?;
        let mut updated = 0;
        for product in &products {
            if product.description.is_some() {
                continue;
            }
            let mut product = product.clone();
            product.description = Some(canopy_protocol::derived::desc_and_weight(&product));
            self.add_or_update_product(store_name, product).await?;
            updated += 1;
        }
        Ok(updated)
    }

    pub async fn update_all_product_strains(&self, store_name: Option<&str>) -> Result<usize> {
        let pool = self.pool_for(store_name).await?;
        let products = self.all_products(store_name).await?;
        let mut updated = 0;
        for product in products {
            let Some(strain_name) = product.strain_name.clone() else { continue };
            if product.product_type == canopy_protocol::ProductType::Paraphernalia {
                continue;
            }
            let Some(strain) = self.get_strain_on(&pool, &strain_name).await? else { continue };
            let effective = strain.effective_lineage();
            if effective != product.lineage {
                let mut product = product;
                product.lineage = effective;
                self.add_or_update_product(store_name, product).await?;
                updated += 1;
            }
        }
        Ok(updated)
    }

    pub async fn update_all_ratio_or_thc_cbd(&self, store_name: Option<&str>) -> Result<usize> {
        let products = self.all_products(store_name).await?;
        let mut updated = 0;
        for mut product in products {
            let rendered = canopy_protocol::derived::ratio_or_thc_cbd(&product);
            if product.ratio.as_deref() != Some(rendered.as_str()) {
                product.ratio = Some(rendered);
                self.add_or_update_product(store_name, product).await?;
                updated += 1;
            }
        }
        Ok(updated)
    }

    pub async fn update_all_joint_ratios(&self, store_name: Option<&str>) -> Result<usize> {
        let products = self.all_products(store_name).await?;
        let mut updated = 0;
        for product in products {
            if canopy_protocol::derived::joint_ratio(&product).is_some() {
                updated += 1;
            }
        }
        Ok(updated)
    }
}

/// Majority vote over observed lineage counts; the lineage just observed
/// wins ties (recency, per spec §4.4).
fn majority_lineage(votes: &BTreeMap<String, u64>, most_recent: Lineage) -> Lineage {
    let max_count = votes.values().copied().max().unwrap_or(0);
    let most_recent_str = most_recent.as_str();

    if votes.get(most_recent_str).copied().unwrap_or(0) == max_count {
        return most_recent;
    }

    votes
        .iter()
        .filter(|(_, count)| **count == max_count)
        .map(|(lineage, _)| Lineage::normalize(lineage, Lineage::Mixed))
        .next()
        .unwrap_or(most_recent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use canopy_protocol::ProductType;
    use tempfile::tempdir;

    fn sample_product(name: &str, vendor: &str, ptype: ProductType) -> Product {
        Product {
            product_name: name.into(),
            vendor: vendor.into(),
            product_type: ptype,
            lineage: Lineage::Sativa,
            brand: None,
            weight_magnitude: Some(3.5),
            weight_unit: Some(canopy_protocol::WeightUnit::Grams),
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
            description: Some("A fine flower".into()),
            strain_name: Some("Blue Dream".into()),
            source: None,
            match_score: None,
            match_confidence: None,
            extra: BTreeMap::new(),
        }
    }

    #[tokio::test]
    async fn paraphernalia_forces_lineage_on_upsert() {
        let dir = tempdir().unwrap();
        let store = CatalogStore::new(dir.path());
        let mut product = sample_product("Grinder", "Acme", ProductType::Paraphernalia);
        product.lineage = Lineage::Sativa;
        product.strain_name = None;
        store.add_or_update_product(None, product).await.unwrap();

        let rows = store.get_products_by_names(None, &["Grinder".to_string()]).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].lineage, Lineage::Paraphernalia);
    }

    #[tokio::test]
    async fn sovereign_lineage_overrides_canonical_on_next_product_upsert() {
        let dir = tempdir().unwrap();
        let store = CatalogStore::new(dir.path());

        store.add_or_update_strain(None, "Blue Dream", Lineage::Sativa, false).await.unwrap();
        store.add_or_update_strain(None, "Blue Dream", Lineage::Indica, true).await.unwrap();

        let product = sample_product("Blue Dream 3.5g", "Acme", ProductType::Flower);
        store.add_or_update_product(None, product).await.unwrap();

        let rows = store.get_products_by_names(None, &["Blue Dream 3.5g".to_string()]).await.unwrap();
        assert_eq!(rows[0].lineage, Lineage::Indica);
    }

    #[tokio::test]
    async fn store_excel_data_excludes_synthetic_rows() {
        let dir = tempdir().unwrap();
        let store = CatalogStore::new(dir.path());

        let mut rows = Vec::new();
        for i in 0..7 {
            rows.push(sample_product(&format!("Product {i}"), "Acme", ProductType::Flower));
        }
        for i in 0..3 {
            let mut synthetic = sample_product(&format!("Synthetic {i}"), "Acme", ProductType::Flower);
            synthetic.source = Some("JSON Match".into());
            rows.push(synthetic);
        }

        let result = store.store_excel_data(None, &rows, "upload.xlsx").await.unwrap();
        assert_eq!(result, StoreResult { stored: 7, excluded_synthetic: 3, total_rows: 10 });
    }

    #[tokio::test]
    async fn clear_all_data_empties_store() {
        let dir = tempdir().unwrap();
        let store = CatalogStore::new(dir.path());
        store.add_or_update_product(None, sample_product("X", "Acme", ProductType::Flower)).await.unwrap();
        store.clear_all_data(None).await.unwrap();
        let rows = store.all_products(None).await.unwrap();
        assert!(rows.is_empty());
    }
}
