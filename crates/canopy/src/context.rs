//! `AppContext`: the single composition root wiring C1-C6 together.
//!
//! Constructed once per process (spec §9: no process-wide singletons are
//! reached for ad hoc — every component is an explicit field here and
//! handed to callers, not looked up through a global).

use crate::config::CatalogConfig;
use canopy_catalog_db::CatalogStore;
use canopy_ingest::IngestionCoordinator;
use canopy_jobs::JobRegistry;
use canopy_matching::MatchingEngine;
use canopy_tabular::TabularProcessor;
use std::sync::Arc;

pub struct AppContext {
    pub config: CatalogConfig,
    pub catalog: Arc<CatalogStore>,
    pub tabular: Arc<TabularProcessor>,
    pub jobs: Arc<JobRegistry>,
    pub ingest: IngestionCoordinator,
}

impl AppContext {
    pub fn new(config: CatalogConfig) -> Self {
        let catalog = Arc::new(CatalogStore::new(config.db_dir.clone()));
        let tabular = Arc::new(TabularProcessor::new());
        let jobs = Arc::new(JobRegistry::new());
        let ingest = IngestionCoordinator::new(
            Arc::clone(&catalog),
            Arc::clone(&tabular),
            Arc::clone(&jobs),
            config.upload_dir.clone(),
        );

        Self { config, catalog, tabular, jobs, ingest }
    }

    /// Borrows a fresh matching engine (C3) against the live catalog and
    /// table. Not stored as a field: `MatchingEngine` borrows C1/C2
    /// directly, which would make this struct self-referential if it held
    /// one, so callers build one per request from the shared state instead.
    pub fn matching_engine(&self) -> MatchingEngine<'_> {
        MatchingEngine::new(&self.catalog, &self.tabular)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn new_context_wires_all_components() {
        let dir = tempdir().unwrap();
        let mut config = CatalogConfig::default();
        config.db_dir = dir.path().join("db");
        config.upload_dir = dir.path().join("uploads");

        let ctx = AppContext::new(config);
        assert_eq!(ctx.jobs.len(), 0);
        assert_eq!(ctx.tabular.row_count(), 0);
        let _engine = ctx.matching_engine();
    }
}
