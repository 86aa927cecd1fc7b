//! Per-store connection pools.
//!
//! One SQLite file per named store, discoverable by the filename convention
//! in spec §6: `product_database_<store>.db`, falling back to
//! `product_database.db` for the default (single-tenant) store.

use crate::error::Result;
use canopy_protocol::defaults::{DB_FILENAME_PREFIX, DEFAULT_DB_FILENAME};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

/// Resolve a store name to its on-disk filename.
pub fn db_filename(store_name: Option<&str>) -> String {
    match store_name {
        None => DEFAULT_DB_FILENAME.to_string(),
        Some(name) => format!("{DB_FILENAME_PREFIX}{name}.db"),
    }
}

/// Open (creating if absent) a pooled connection to the store at `path`,
/// applying the same SQLite pragmas the teacher uses for concurrent access.
pub async fn open_pool(path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new().max_connections(5).connect_with(options).await?;

    apply_pragmas(&pool).await?;
    info!(path = %path.display(), "opened catalog store");
    Ok(pool)
}

async fn apply_pragmas(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA journal_mode=WAL").execute(pool).await?;
    sqlx::query("PRAGMA synchronous=NORMAL").execute(pool).await?;
    sqlx::query("PRAGMA foreign_keys=ON").execute(pool).await?;
    Ok(())
}

/// Compose the full path to a named store's database file under `base_dir`.
pub fn store_path(base_dir: &Path, store_name: Option<&str>) -> PathBuf {
    base_dir.join(db_filename(store_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_store_uses_fallback_filename() {
        assert_eq!(db_filename(None), "product_database.db");
    }

    #[test]
    fn named_store_uses_convention() {
        assert_eq!(db_filename(Some("clinic_a")), "product_database_clinic_a.db");
    }
}
