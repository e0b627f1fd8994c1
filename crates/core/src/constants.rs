/// Window size used when neither the request nor the settings name one.
pub const DEFAULT_RANGE_LIMIT: i64 = 1000;

/// Upper bound accepted for a single run's window.
pub const MAX_RANGE_LIMIT: i64 = 10_000;

/// Rows recorded between two ledger progress writes.
pub const DEFAULT_PROGRESS_FLUSH_EVERY: u32 = 10;

/// Default bound on a single remote query.
pub const DEFAULT_REMOTE_QUERY_TIMEOUT_SECS: u64 = 30;

/// Actor recorded on entries created without an authenticated operator.
pub const SYSTEM_ACTOR: &str = "System";

/// Message written when a run moves to processing.
pub const SYNC_STARTED_MESSAGE: &str = "Sync started...";

/// Remote key column used when neither the transformer nor the config names one.
pub const DEFAULT_REMOTE_KEY_COLUMN: &str = "id";
