//! Runtime configuration loaded from the environment, with defaults
//! mirroring `canopy_protocol::defaults`.

use canopy_protocol::defaults::{
    GENERATION_SOFT_TIMEOUT_SECS, JOB_GRACE_PERIOD_SECS, MAX_SELECTED_TAGS, MAX_UPLOAD_BYTES,
    RATE_LIMIT_WINDOW_SECS, UNDO_STACK_DEPTH,
};
use std::path::PathBuf;

/// Get the Canopy home directory: ~/.canopy_catalog (or `CANOPY_HOME`).
pub fn canopy_home() -> PathBuf {
    canopy_logging::canopy_home()
}

#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub upload_dir: PathBuf,
    pub db_dir: PathBuf,
    pub rate_limit_window_secs: u64,
    pub undo_stack_depth: usize,
    pub job_grace_period_secs: u64,
    pub generation_soft_timeout_secs: u64,
    pub max_upload_bytes: u64,
    pub max_selected_tags: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let home = canopy_home();
        Self {
            upload_dir: home.join("uploads"),
            db_dir: home.join("db"),
            rate_limit_window_secs: RATE_LIMIT_WINDOW_SECS,
            undo_stack_depth: UNDO_STACK_DEPTH,
            job_grace_period_secs: JOB_GRACE_PERIOD_SECS,
            generation_soft_timeout_secs: GENERATION_SOFT_TIMEOUT_SECS,
            max_upload_bytes: MAX_UPLOAD_BYTES,
            max_selected_tags: MAX_SELECTED_TAGS,
        }
    }
}

impl CatalogConfig {
    /// Load overrides from the environment; anything unset keeps the
    /// compiled-in default.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(dir) = std::env::var("CANOPY_UPLOAD_DIR") {
            config.upload_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("CANOPY_DB_DIR") {
            config.db_dir = PathBuf::from(dir);
        }
        if let Some(value) = parse_env_u64("CANOPY_RATE_LIMIT_WINDOW_SECS") {
            config.rate_limit_window_secs = value;
        }
        if let Some(value) = parse_env_usize("CANOPY_UNDO_STACK_DEPTH") {
            config.undo_stack_depth = value;
        }
        if let Some(value) = parse_env_u64("CANOPY_JOB_GRACE_PERIOD_SECS") {
            config.job_grace_period_secs = value;
        }
        if let Some(value) = parse_env_u64("CANOPY_GENERATION_SOFT_TIMEOUT_SECS") {
            config.generation_soft_timeout_secs = value;
        }
        if let Some(value) = parse_env_u64("CANOPY_MAX_UPLOAD_BYTES") {
            config.max_upload_bytes = value;
        }
        if let Some(value) = parse_env_usize("CANOPY_MAX_SELECTED_TAGS") {
            config.max_selected_tags = value;
        }

        config
    }
}

fn parse_env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn parse_env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_protocol_defaults() {
        let config = CatalogConfig::default();
        assert_eq!(config.undo_stack_depth, UNDO_STACK_DEPTH);
        assert_eq!(config.max_upload_bytes, MAX_UPLOAD_BYTES);
    }
}
