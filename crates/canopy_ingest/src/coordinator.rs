//! `IngestionCoordinator`: glue between upload, the background worker, the
//! job registry (C4), the tabular processor (C2), and the catalog store
//! (C1) (spec §4.5).

use crate::error::{IngestError, Result};
use canopy_catalog_db::CatalogStore;
use canopy_jobs::{JobRegistry, JobStatus};
use canopy_protocol::defaults::MAX_UPLOAD_BYTES;
use canopy_protocol::JobState;
use canopy_tabular::TabularProcessor;
use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

pub struct IngestionCoordinator {
    catalog: Arc<CatalogStore>,
    table: Arc<TabularProcessor>,
    jobs: Arc<JobRegistry>,
    upload_dir: PathBuf,
}

impl IngestionCoordinator {
    pub fn new(catalog: Arc<CatalogStore>, table: Arc<TabularProcessor>, jobs: Arc<JobRegistry>, upload_dir: impl Into<PathBuf>) -> Self {
        Self { catalog, table, jobs, upload_dir: upload_dir.into() }
    }

    /// Persist `bytes` under a timestamped, collision-free filename, mark
    /// the job PROCESSING, spawn the worker, and return the job handle
    /// (spec §4.5 steps 1-4). The handle is the persisted filename.
    pub async fn submit_upload(&self, original_filename: &str, bytes: &[u8]) -> Result<String> {
        if bytes.is_empty() {
            return Err(IngestError::Empty);
        }
        if bytes.len() as u64 > MAX_UPLOAD_BYTES {
            return Err(IngestError::TooLarge { actual: bytes.len() as u64, limit: MAX_UPLOAD_BYTES });
        }

        tokio::fs::create_dir_all(&self.upload_dir).await?;
        let handle = format!("{}_{}", Utc::now().format("%Y%m%dT%H%M%S%.6f"), sanitize(original_filename));
        let path = self.upload_dir.join(&handle);
        tokio::fs::write(&path, bytes).await?;

        self.jobs.set(handle.clone(), JobState::Processing);
        info!(filename = %handle, bytes = bytes.len(), "upload accepted");

        let catalog = Arc::clone(&self.catalog);
        let table = Arc::clone(&self.table);
        let jobs = Arc::clone(&self.jobs);
        let worker_handle = handle.clone();
        let worker_path = path.clone();

        tokio::spawn(async move {
            run_worker(catalog, table, jobs, worker_handle, worker_path).await;
        });

        Ok(handle)
    }

    /// Poll the job registry for `filename`, applying the two recovery
    /// heuristics from spec §4.5 for jobs whose worker may have completed
    /// before the poll arrived.
    pub fn upload_status(&self, filename: &str) -> Option<JobState> {
        match self.jobs.get(filename) {
            JobStatus::NotFound => {
                let path = self.upload_dir.join(filename);
                if path.exists() && self.table.has_loaded(&path) {
                    return Some(JobState::Ready);
                }
                None
            }
            JobStatus::Found { state: JobState::Processing, .. } => {
                let path = self.upload_dir.join(filename);
                if self.table.has_loaded(&path) {
                    self.jobs.set(filename, JobState::Ready);
                    return Some(JobState::Ready);
                }
                Some(JobState::Processing)
            }
            JobStatus::Found { state, .. } => Some(state),
        }
    }
}

async fn run_worker(catalog: Arc<CatalogStore>, table: Arc<TabularProcessor>, jobs: Arc<JobRegistry>, handle: String, path: PathBuf) {
    let load_result = {
        let table = Arc::clone(&table);
        let path = path.clone();
        tokio::task::spawn_blocking(move || table.load(&path)).await
    };

    let row_count = match load_result {
        Ok(Ok(count)) => count,
        Ok(Err(err)) => {
            warn!(filename = %handle, error = %err, "ingestion worker failed to load upload");
            jobs.set(handle, JobState::Error(err.to_string()));
            return;
        }
        Err(join_err) => {
            error!(filename = %handle, error = %join_err, "ingestion worker task panicked");
            jobs.set(handle, JobState::Error("worker task panicked".to_string()));
            return;
        }
    };

    info!(filename = %handle, rows = row_count, "loaded upload into tabular processor");

    let products = table.all_rows();
    let source_file = handle.clone();
    match catalog.store_excel_data(None, &products, &source_file).await {
        Ok(result) => info!(filename = %handle, stored = result.stored, excluded = result.excluded_synthetic, "stored upload into catalog"),
        Err(err) => warn!(filename = %handle, error = %err, "catalog storage failed; job still reported READY"),
    }

    jobs.set(handle, JobState::Ready);
}

fn sanitize(name: &str) -> String {
    let name = Path::new(name).file_name().and_then(|n| n.to_str()).unwrap_or(name);
    name.chars().map(|ch| if ch.is_ascii_alphanumeric() || ch == '.' || ch == '-' || ch == '_' { ch } else { '_' }).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn submit_upload_persists_file_and_sets_processing() {
        let dir = tempdir().unwrap();
        let catalog = Arc::new(CatalogStore::new(dir.path().join("db")));
        let table = Arc::new(TabularProcessor::new());
        let jobs = Arc::new(JobRegistry::new());
        let coordinator = IngestionCoordinator::new(catalog, table, Arc::clone(&jobs), dir.path().join("uploads"));

        let handle = coordinator.submit_upload("list.csv", b"Product Name*,Vendor/Supplier*\n").await.unwrap();
        assert!(dir.path().join("uploads").join(&handle).exists());
        assert!(matches!(jobs.get(&handle), JobStatus::Found { .. }));
    }

    #[tokio::test]
    async fn submit_upload_rejects_empty_payload() {
        let dir = tempdir().unwrap();
        let catalog = Arc::new(CatalogStore::new(dir.path().join("db")));
        let table = Arc::new(TabularProcessor::new());
        let jobs = Arc::new(JobRegistry::new());
        let coordinator = IngestionCoordinator::new(catalog, table, jobs, dir.path().join("uploads"));

        let result = coordinator.submit_upload("empty.csv", b"").await;
        assert!(matches!(result, Err(IngestError::Empty)));
    }

    #[tokio::test]
    async fn submit_upload_rejects_oversized_payload() {
        let dir = tempdir().unwrap();
        let catalog = Arc::new(CatalogStore::new(dir.path().join("db")));
        let table = Arc::new(TabularProcessor::new());
        let jobs = Arc::new(JobRegistry::new());
        let coordinator = IngestionCoordinator::new(catalog, table, jobs, dir.path().join("uploads"));

        let oversized = vec![0u8; (MAX_UPLOAD_BYTES + 1) as usize];
        let result = coordinator.submit_upload("huge.csv", &oversized).await;
        assert!(matches!(result, Err(IngestError::TooLarge { .. })));
    }

    #[tokio::test]
    async fn worker_marks_job_ready_after_successful_load_and_store() {
        let dir = tempdir().unwrap();
        let catalog = Arc::new(CatalogStore::new(dir.path().join("db")));
        let table = Arc::new(TabularProcessor::new());
        let jobs = Arc::new(JobRegistry::new());
        let coordinator = IngestionCoordinator::new(Arc::clone(&catalog), Arc::clone(&table), Arc::clone(&jobs), dir.path().join("uploads"));

        let csv = "Product Name*,Vendor/Supplier*,Product Type*\nWidget,Acme,Flower\n";
        let handle = coordinator.submit_upload("list.csv", csv.as_bytes()).await.unwrap();

        for _ in 0..50 {
            if jobs.get(&handle).is_ready() {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        }
        assert!(jobs.get(&handle).is_ready());
        assert_eq!(table.row_count(), 1);
    }
}
