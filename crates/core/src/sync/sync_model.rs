//! Batch orchestration models.

use serde::{Deserialize, Serialize};

use crate::config::SyncConfig;
use crate::constants::{DEFAULT_PROGRESS_FLUSH_EVERY, DEFAULT_RANGE_LIMIT};

/// Request to create (and optionally run) a sync for one table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSyncRequest {
    pub table_name: String,
    /// Overrides `config.range_limit` when both are set
    pub range_limit: Option<i64>,
    pub config: Option<SyncConfig>,
    pub triggered_by: Option<String>,
}

impl CreateSyncRequest {
    pub fn for_table(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
            ..Default::default()
        }
    }
}

/// Process-wide orchestration settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncSettings {
    pub default_range_limit: i64,
    pub progress_flush_every: u32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            default_range_limit: DEFAULT_RANGE_LIMIT,
            progress_flush_every: DEFAULT_PROGRESS_FLUSH_EVERY,
        }
    }
}
