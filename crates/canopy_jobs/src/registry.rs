//! `JobRegistry`: the mutex-guarded ingestion job table (C4, spec §4.1).
//!
//! # Lock Invariant
//!
//! The `entries` map is protected by a single `Mutex` because:
//! 1. `set`/`get`/`sweep` are all O(1) or O(swept entries) HashMap ops.
//! 2. Lock is held only across those ops, never across I/O — callers pass
//!    already-computed state in, they don't do file/network work with the
//!    lock held.
//! 3. The registry is deliberately ephemeral (spec §4.1 failure semantics):
//!    a process restart clears every job and the coordinator assumes all
//!    outstanding uploads failed. There is nothing here to persist.

use canopy_protocol::defaults::{JOB_GRACE_PERIOD_SECS, JOB_READY_MIN_AGE_SECS};
use canopy_protocol::rng::{time_seed, XorShift64};
use canopy_protocol::JobState;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Fraction of `get` calls that opportunistically trigger a sweep
/// (spec §4.1: "a small random fraction (≈2-5%)").
const SWEEP_PROBABILITY: f64 = 0.03;

#[derive(Debug, Clone)]
struct Entry {
    state: JobState,
    updated_at: Instant,
}

/// What `get` reports for a filename (spec §4.1).
#[derive(Debug, Clone)]
pub enum JobStatus {
    NotFound,
    Found { state: JobState, age: Duration },
}

pub struct JobRegistry {
    entries: Mutex<HashMap<String, Entry>>,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl JobRegistry {
    pub fn new() -> Self {
        Self { entries: Mutex::new(HashMap::new()) }
    }

    /// Atomic write: sets state and bumps the updated-at timestamp. A new
    /// upload for a filename already tracked replaces its prior state
    /// (spec's I-J1: no two active jobs share a filename).
    pub fn set(&self, filename: impl Into<String>, state: JobState) {
        let filename = filename.into();
        let mut entries = self.entries.lock().unwrap();
        entries.insert(filename, Entry { state, updated_at: Instant::now() });
    }

    /// Current state plus age, or `NotFound`. Opportunistically triggers a
    /// sweep on a small random fraction of calls (spec §4.1) rather than a
    /// dedicated timer, keeping the registry single-process-local with no
    /// background thread.
    pub fn get(&self, filename: &str) -> JobStatus {
        let mut rng = XorShift64::new(time_seed());
        if rng.next_f64() < SWEEP_PROBABILITY {
            self.sweep();
        }

        let entries = self.entries.lock().unwrap();
        match entries.get(filename) {
            Some(entry) => JobStatus::Found { state: entry.state.clone(), age: entry.updated_at.elapsed() },
            None => JobStatus::NotFound,
        }
    }

    /// Remove terminal entries older than the grace period; PROCESSING
    /// entries that old are considered stuck and removed too. Never
    /// removes READY entries younger than `JOB_READY_MIN_AGE_SECS`, to
    /// avoid racing a poller that just started watching (spec §4.1).
    pub fn sweep(&self) {
        let grace_period = Duration::from_secs(JOB_GRACE_PERIOD_SECS);
        let ready_min_age = Duration::from_secs(JOB_READY_MIN_AGE_SECS);

        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();

        entries.retain(|_, entry| {
            let age = entry.updated_at.elapsed();
            match &entry.state {
                JobState::Ready if age < ready_min_age => true,
                _ => age < grace_period,
            }
        });

        let removed = before - entries.len();
        if removed > 0 {
            debug!(removed, "swept stale job entries");
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl JobStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, JobStatus::Found { state: JobState::Ready, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn set_then_get_reports_state() {
        let registry = JobRegistry::new();
        registry.set("a.xlsx", JobState::Processing);
        assert!(matches!(registry.get("a.xlsx"), JobStatus::Found { state: JobState::Processing, .. }));
    }

    #[test]
    fn unknown_filename_is_not_found() {
        let registry = JobRegistry::new();
        assert!(matches!(registry.get("missing.xlsx"), JobStatus::NotFound));
    }

    #[test]
    fn new_upload_for_same_filename_replaces_prior_state() {
        let registry = JobRegistry::new();
        registry.set("a.xlsx", JobState::Processing);
        registry.set("a.xlsx", JobState::Ready);
        assert!(registry.get("a.xlsx").is_ready());
    }

    #[test]
    fn sweep_preserves_fresh_ready_entries() {
        let registry = JobRegistry::new();
        registry.set("a.xlsx", JobState::Ready);
        registry.sweep();
        assert!(registry.get("a.xlsx").is_ready());
    }

    #[test]
    fn sweep_removes_old_terminal_entries() {
        let registry = JobRegistry::new();
        registry.entries.lock().unwrap().insert(
            "old.xlsx".to_string(),
            Entry {
                state: JobState::Error("boom".to_string()),
                updated_at: Instant::now() - Duration::from_secs(JOB_GRACE_PERIOD_SECS + 1),
            },
        );
        registry.sweep();
        assert!(matches!(registry.get("old.xlsx"), JobStatus::NotFound));
    }

    #[test]
    fn sweep_ignores_ready_entries_younger_than_min_age() {
        let registry = JobRegistry::new();
        registry.set("fresh.xlsx", JobState::Ready);
        sleep(Duration::from_millis(10));
        registry.sweep();
        assert!(registry.get("fresh.xlsx").is_ready());
    }
}
