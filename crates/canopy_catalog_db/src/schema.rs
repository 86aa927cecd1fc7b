//! Table definitions for a catalog store.
//!
//! All CREATE TABLE statements live here. New installations get the modern
//! snake_case schema directly; `ensure_schema` is idempotent so it is safe
//! to run against an already-populated store on every open.

use crate::error::Result;
use crate::rows::extra_json;
use canopy_protocol::{Lineage, Product, ProductType, WeightUnit};
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use tracing::info;

pub async fn ensure_schema(pool: &SqlitePool) -> Result<()> {
    create_strains_table(pool).await?;
    create_products_table(pool).await?;
    create_indexes(pool).await?;
    migrate_legacy_schema(pool).await?;
    info!("catalog schema verified");
    Ok(())
}

async fn create_strains_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS strains (
            strain_name_fold TEXT PRIMARY KEY,
            strain_name TEXT NOT NULL,
            canonical_lineage TEXT,
            sovereign_lineage TEXT,
            occurrence_count INTEGER NOT NULL DEFAULT 0,
            first_seen TEXT NOT NULL,
            last_seen TEXT NOT NULL,
            confidence REAL NOT NULL DEFAULT 1.0,
            lineage_votes_json TEXT NOT NULL DEFAULT '{}'
        )"#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_products_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"CREATE TABLE IF NOT EXISTS products (
            product_name TEXT NOT NULL,
            vendor TEXT NOT NULL,
            product_name_fold TEXT NOT NULL,
            vendor_fold TEXT NOT NULL,
            product_type TEXT NOT NULL,
            lineage TEXT NOT NULL,
            brand TEXT,
            weight_magnitude REAL,
            weight_unit TEXT,
            price REAL,
            thc_percent REAL,
            cbd_percent REAL,
            thca_percent REAL,
            cbda_percent REAL,
            thc_mg REAL,
            cbd_mg REAL,
            ratio TEXT,
            doh_compliant INTEGER NOT NULL DEFAULT 0,
            archived INTEGER NOT NULL DEFAULT 0,
            accepted_date TEXT,
            expiration_date TEXT,
            description TEXT,
            strain_name TEXT,
            source TEXT,
            match_score REAL,
            match_confidence REAL,
            extra_json TEXT NOT NULL DEFAULT '{}',
            updated_at TEXT NOT NULL,
            PRIMARY KEY (product_name_fold, vendor_fold)
        )"#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<()> {
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_strain ON products(strain_name)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_vendor ON products(vendor_fold)")
        .execute(pool)
        .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_products_archived ON products(archived)")
        .execute(pool)
        .await?;
    Ok(())
}

/// Bring a legacy quoted-column database forward (spec §4.4 schema evolution).
///
/// Legacy installs carry columns named `"Product Name*"`, `"Vendor/Supplier*"`
/// etc. instead of the snake_case layout above. We detect them by inspecting
/// `PRAGMA table_info` and, if found, copy every row we can parse into the
/// modern `products` table (`INSERT OR IGNORE`, so re-running this against an
/// already-migrated store is a no-op). The legacy table itself is left in
/// place untouched; only `products` is authoritative from here on.
async fn migrate_legacy_schema(pool: &SqlitePool) -> Result<()> {
    let legacy_table_exists: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name='product_catalog'")
            .fetch_optional(pool)
            .await?;

    let Some(_) = legacy_table_exists else {
        return Ok(());
    };

    let columns: Vec<(i64, String, String, i64, Option<String>, i64)> =
        sqlx::query_as("PRAGMA table_info(product_catalog)").fetch_all(pool).await?;
    let column_names: HashSet<String> = columns.into_iter().map(|(_, name, ..)| name).collect();

    if !column_names.contains("Product Name*") {
        return Ok(());
    }

    info!("legacy product_catalog schema detected; copying rows into the modern products table");

    let legacy_rows = sqlx::query("SELECT * FROM product_catalog").fetch_all(pool).await?;
    let total = legacy_rows.len();
    let mut copied = 0usize;

    for row in &legacy_rows {
        let Some(product) = legacy_row_to_product(row, &column_names) else {
            continue;
        };
        insert_migrated_product(pool, &product).await?;
        copied += 1;
    }

    info!(copied, total, "legacy product_catalog migration complete");
    Ok(())
}

/// Read one `product_catalog` row through its quoted legacy column names,
/// skipping rows missing either required identity column.
fn legacy_row_to_product(row: &sqlx::sqlite::SqliteRow, columns: &HashSet<String>) -> Option<Product> {
    let text = |name: &str| -> Option<String> {
        if !columns.contains(name) {
            return None;
        }
        row.try_get::<Option<String>, _>(name).ok().flatten().filter(|s| !s.trim().is_empty())
    };
    let number = |name: &str| -> Option<f64> { text(name).and_then(|s| s.trim().parse::<f64>().ok()) };

    let product_name = text("Product Name*")?;
    let vendor = text("Vendor/Supplier*")?;

    let product_type = text("Product Type*").and_then(|raw| ProductType::parse(&raw)).unwrap_or(ProductType::Flower);
    let default_lineage = if product_type.is_classic() { Lineage::Hybrid } else { Lineage::Mixed };
    let lineage = text("Lineage").map(|raw| Lineage::normalize(&raw, default_lineage)).unwrap_or(default_lineage);

    let mut product = Product {
        product_name,
        vendor,
        product_type,
        lineage,
        brand: text("Brand"),
        weight_magnitude: number("Weight*"),
        weight_unit: text("Weight Unit").and_then(|u| WeightUnit::parse(&u)),
        price: number("Price*"),
        thc_percent: number("THC%"),
        cbd_percent: number("CBD%"),
        thca_percent: number("THCA%"),
        cbda_percent: number("CBDA%"),
        thc_mg: number("THC mg"),
        cbd_mg: number("CBD mg"),
        ratio: text("Ratio"),
        doh_compliant: text("DOH Compliant*").map(|v| is_truthy(&v)).unwrap_or(false),
        archived: false,
        accepted_date: None,
        expiration_date: None,
        description: text("Description"),
        strain_name: text("Strain*"),
        source: Some("product_catalog".to_string()),
        match_score: None,
        match_confidence: None,
        extra: Default::default(),
    };
    product.enforce_paraphernalia_lineage();
    Some(product)
}

fn is_truthy(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "y")
}

/// Plain `INSERT OR IGNORE`, bypassing strain reconciliation — this runs once
/// per legacy row at schema-open time, before any store-level lock is held.
async fn insert_migrated_product(pool: &SqlitePool, product: &Product) -> Result<()> {
    let extra = extra_json(product)?;
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"INSERT OR IGNORE INTO products (
            product_name, vendor, product_name_fold, vendor_fold, product_type, lineage,
            brand, weight_magnitude, weight_unit, price, thc_percent, cbd_percent,
            thca_percent, cbda_percent, thc_mg, cbd_mg, ratio, doh_compliant, archived,
            accepted_date, expiration_date, description, strain_name, source,
            match_score, match_confidence, extra_json, updated_at
        ) VALUES (?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?,?)"#,
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
    .execute(pool)
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::open_pool;
    use tempfile::tempdir;

    #[tokio::test]
    async fn legacy_product_catalog_rows_are_copied_into_products() {
        let dir = tempdir().unwrap();
        let pool = open_pool(&dir.path().join("legacy.db")).await.unwrap();

        sqlx::query(
            r#"CREATE TABLE product_catalog (
                "Product Name*" TEXT,
                "Vendor/Supplier*" TEXT,
                "Product Type*" TEXT,
                "Lineage" TEXT
            )"#,
        )
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(r#"INSERT INTO product_catalog VALUES ('Blue Dream', 'Acme', 'flower', 'sativa')"#)
            .execute(&pool)
            .await
            .unwrap();

        ensure_schema(&pool).await.unwrap();

        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products").fetch_one(&pool).await.unwrap();
        assert_eq!(row.0, 1);

        let fold: (String,) =
            sqlx::query_as("SELECT product_name_fold FROM products WHERE vendor_fold = 'acme'").fetch_one(&pool).await.unwrap();
        assert_eq!(fold.0, "blue dream");
    }

    #[tokio::test]
    async fn migration_is_idempotent_on_repeated_open() {
        let dir = tempdir().unwrap();
        let pool = open_pool(&dir.path().join("legacy.db")).await.unwrap();

        sqlx::query(r#"CREATE TABLE product_catalog ("Product Name*" TEXT, "Vendor/Supplier*" TEXT)"#)
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(r#"INSERT INTO product_catalog VALUES ('Widget', 'Acme')"#).execute(&pool).await.unwrap();

        ensure_schema(&pool).await.unwrap();
        ensure_schema(&pool).await.unwrap();

        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products").fetch_one(&pool).await.unwrap();
        assert_eq!(row.0, 1);
    }

    #[tokio::test]
    async fn fresh_database_has_no_legacy_table_and_migration_is_a_noop() {
        let dir = tempdir().unwrap();
        let pool = open_pool(&dir.path().join("fresh.db")).await.unwrap();
        ensure_schema(&pool).await.unwrap();

        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products").fetch_one(&pool).await.unwrap();
        assert_eq!(row.0, 0);
    }
}
