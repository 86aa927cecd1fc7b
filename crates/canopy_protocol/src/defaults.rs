//! Canonical default values shared across the ingestion/matching/catalog
//! components (spec §4-§5).

pub const DEFAULT_DB_FILENAME: &str = "product_database.db";
pub const DB_FILENAME_PREFIX: &str = "product_database_";

pub const UNDO_STACK_DEPTH: usize = 5;
pub const JOB_GRACE_PERIOD_SECS: u64 = 15 * 60;
pub const JOB_READY_MIN_AGE_SECS: u64 = 30;
pub const SELECTION_RECENCY_WINDOW_SECS: u64 = 5 * 60;

pub const MATCH_EMISSION_THRESHOLD: f64 = 0.3;
pub const DATABASE_PRIORITY_SCORE: f64 = 0.95;
pub const DATABASE_PRIORITY_CONFIDENCE: f64 = 0.95;
pub const FIXED_MODEL_CONFIDENCE: f64 = 0.6;
pub const FEEDBACK_MIN_EXAMPLES: usize = 10;

pub const MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;
pub const MAX_SELECTED_TAGS: usize = 100;
pub const GENERATION_SOFT_TIMEOUT_SECS: u64 = 45;
pub const RATE_LIMIT_WINDOW_SECS: u64 = 60;
pub const RATE_LIMIT_MAX_REQUESTS: u32 = 100;
