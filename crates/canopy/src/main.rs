//! Thin example binary: loads configuration, initializes logging, and
//! constructs an `AppContext`. Does not stand up an HTTP server — that
//! surface is out of scope (spec §1) and belongs to an embedding
//! application.

use anyhow::Result;
use canopy::{AppContext, CatalogConfig};
use canopy_logging::{init_logging, LogConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    init_logging(LogConfig { app_name: "canopy", verbose: std::env::var("CANOPY_VERBOSE").is_ok() })?;

    let config = CatalogConfig::from_env();
    info!(upload_dir = %config.upload_dir.display(), db_dir = %config.db_dir.display(), "starting canopy context");

    let ctx = AppContext::new(config);
    info!(jobs = ctx.jobs.len(), rows = ctx.tabular.row_count(), "canopy context ready");

    Ok(())
}
