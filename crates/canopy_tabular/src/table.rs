//! `TabularProcessor`: the mutex-guarded in-memory table (C2, spec §5).
//!
//! A single global instance protected by one mutex covering load/mutate
//! operations; reads of the table after load don't need their own lock
//! since the whole structure is swapped atomically under the guard.

use crate::error::Result;
use crate::filters::{apply_filters, dynamic_filter_options, FilterSet};
use crate::load::load_path;
use canopy_protocol::{Lineage, Product};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Default)]
struct TableState {
    rows: Vec<Product>,
    last_loaded_file: Option<PathBuf>,
    /// Per-category sorted unique values with no filters active, precomputed
    /// on load and refreshed on every mutation (spec §4.2 dropdown cache).
    /// `dynamic_filter_options` serves the unfiltered case straight from
    /// here; any active filter still recomputes, since the faceted result
    /// depends on the other categories' current selections.
    dropdown_cache: BTreeMap<&'static str, BTreeSet<String>>,
}

fn recompute_dropdown_cache(rows: &[Product]) -> BTreeMap<&'static str, BTreeSet<String>> {
    dynamic_filter_options(rows, &FilterSet::default())
}

pub struct TabularProcessor {
    state: Mutex<TableState>,
}

impl Default for TabularProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl TabularProcessor {
    pub fn new() -> Self {
        Self { state: Mutex::new(TableState::default()) }
    }

    /// Parse `path` and replace the table. On failure the instance is left
    /// holding an empty table (spec §4.2).
    pub fn load(&self, path: &Path) -> Result<usize> {
        match load_path(path) {
            Ok(rows) => {
                let count = rows.len();
                let mut state = self.state.lock().unwrap();
                state.rows = rows;
                state.last_loaded_file = Some(path.to_path_buf());
                state.dropdown_cache = recompute_dropdown_cache(&state.rows);
                info!(path = %path.display(), rows = count, "loaded table");
                Ok(count)
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "load failed, table cleared");
                let mut state = self.state.lock().unwrap();
                state.rows.clear();
                state.last_loaded_file = None;
                state.dropdown_cache = recompute_dropdown_cache(&state.rows);
                Err(err)
            }
        }
    }

    pub fn last_loaded_file(&self) -> Option<PathBuf> {
        self.state.lock().unwrap().last_loaded_file.clone()
    }

    /// True if this path is the currently-loaded file (spec §4.5 recovery
    /// heuristics for `upload_status`).
    pub fn has_loaded(&self, path: &Path) -> bool {
        self.state.lock().unwrap().last_loaded_file.as_deref() == Some(path)
    }

    pub fn row_count(&self) -> usize {
        self.state.lock().unwrap().rows.len()
    }

    /// All non-archived rows (spec §4.2 `available_tags`).
    pub fn available_tags(&self) -> Vec<Product> {
        self.state.lock().unwrap().rows.iter().filter(|p| !p.archived).cloned().collect()
    }

    pub fn all_rows(&self) -> Vec<Product> {
        self.state.lock().unwrap().rows.clone()
    }

    pub fn apply_filters(&self, filters: &FilterSet) -> Vec<Product> {
        let state = self.state.lock().unwrap();
        apply_filters(&state.rows, filters).into_iter().cloned().collect()
    }

    pub fn dynamic_filter_options(&self, filters: &FilterSet) -> BTreeMap<&'static str, BTreeSet<String>> {
        let state = self.state.lock().unwrap();
        if filters.is_empty() {
            return state.dropdown_cache.clone();
        }
        dynamic_filter_options(&state.rows, filters)
    }

    /// Mutate a row's lineage in place and invalidate caches (spec §4.2).
    pub fn update_lineage(&self, product_name: &str, new_lineage: Lineage) -> bool {
        let mut state = self.state.lock().unwrap();
        let fold = product_name.to_ascii_lowercase();
        let mut found = false;
        for row in state.rows.iter_mut() {
            if row.product_name.to_ascii_lowercase() == fold {
                row.lineage = new_lineage;
                row.enforce_paraphernalia_lineage();
                found = true;
            }
        }
        if found {
            state.dropdown_cache = recompute_dropdown_cache(&state.rows);
        }
        found
    }

    pub fn update_doh(&self, product_name: &str, new_flag: bool) -> bool {
        let mut state = self.state.lock().unwrap();
        let fold = product_name.to_ascii_lowercase();
        let mut found = false;
        for row in state.rows.iter_mut() {
            if row.product_name.to_ascii_lowercase() == fold {
                row.doh_compliant = new_flag;
                found = true;
            }
        }
        if found {
            state.dropdown_cache = recompute_dropdown_cache(&state.rows);
        }
        found
    }

    /// Reconcile every row's lineage against the catalog's effective
    /// lineage for rows that reference a known strain (spec §4.2).
    ///
    /// `catalog_lineage` resolves a strain name to its effective lineage;
    /// callers pass a closure backed by `canopy_catalog_db` so this crate
    /// stays free of a dependency on the store.
    pub fn ensure_lineage_persistence(&self, catalog_lineage: impl Fn(&str) -> Option<Lineage>) -> usize {
        let mut state = self.state.lock().unwrap();
        let mut updated = 0;
        for row in state.rows.iter_mut() {
            if row.product_type == canopy_protocol::ProductType::Paraphernalia {
                continue;
            }
            let Some(strain_name) = row.strain_name.as_deref() else { continue };
            if let Some(effective) = catalog_lineage(strain_name) {
                if row.lineage != effective {
                    row.lineage = effective;
                    updated += 1;
                }
            }
        }
        if updated > 0 {
            state.dropdown_cache = recompute_dropdown_cache(&state.rows);
        }
        updated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn load_failure_leaves_table_empty() {
        let processor = TabularProcessor::new();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.csv");
        assert!(processor.load(&path).is_err());
        assert_eq!(processor.row_count(), 0);
    }

    #[test]
    fn update_lineage_is_case_insensitive_and_refreshes_cache() {
        let processor = TabularProcessor::new();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Product Name*,Vendor/Supplier*,Product Type*").unwrap();
        writeln!(file, "Blue Dream,Acme,flower").unwrap();
        processor.load(&path).unwrap();

        assert!(processor.update_lineage("blue dream", Lineage::Indica));
        let rows = processor.available_tags();
        assert_eq!(rows[0].lineage, Lineage::Indica);

        let options = processor.dynamic_filter_options(&FilterSet::default());
        assert!(options["lineage"].contains("INDICA"));
        assert!(!options["lineage"].contains("HYBRID"));
    }

    #[test]
    fn load_precomputes_dropdown_cache_for_the_unfiltered_case() {
        let processor = TabularProcessor::new();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rows.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "Product Name*,Vendor/Supplier*,Product Type*").unwrap();
        writeln!(file, "Blue Dream,Acme,flower").unwrap();
        writeln!(file, "Gelato,Other Co,vape cartridge").unwrap();
        processor.load(&path).unwrap();

        let cached = processor.state.lock().unwrap().dropdown_cache.clone();
        assert!(cached["vendor"].contains("Acme"));
        assert!(cached["vendor"].contains("Other Co"));

        let options = processor.dynamic_filter_options(&FilterSet::default());
        assert_eq!(options, cached);
    }
}
