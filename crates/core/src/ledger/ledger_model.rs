//! Sync Ledger domain models.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::SyncConfig;
use crate::errors::{Error, ValidationError};

/// Lifecycle status of a sync run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    /// Created, waiting for a worker
    #[default]
    Pending,
    /// A worker is reading and applying the window
    Processing,
    /// Terminal: the window was processed
    Completed,
    /// Terminal: a fatal error stopped the run
    Failed,
    /// Reserved; no transition leads here
    Paused,
}

impl SyncStatus {
    pub const ACTIVE: [SyncStatus; 2] = [SyncStatus::Pending, SyncStatus::Processing];

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Pending => "pending",
            SyncStatus::Processing => "processing",
            SyncStatus::Completed => "completed",
            SyncStatus::Failed => "failed",
            SyncStatus::Paused => "paused",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SyncStatus::Completed | SyncStatus::Failed)
    }

    pub fn is_active(&self) -> bool {
        matches!(self, SyncStatus::Pending | SyncStatus::Processing)
    }

    /// Whether the ledger accepts a move from `self` to `next`.
    pub fn can_transition_to(&self, next: SyncStatus) -> bool {
        matches!(
            (self, next),
            (SyncStatus::Pending, SyncStatus::Processing)
                | (SyncStatus::Processing, SyncStatus::Completed)
                | (SyncStatus::Pending, SyncStatus::Failed)
                | (SyncStatus::Processing, SyncStatus::Failed)
        )
    }

    pub fn color(&self) -> StatusColor {
        match self {
            SyncStatus::Pending => StatusColor::Warning,
            SyncStatus::Processing => StatusColor::Info,
            SyncStatus::Completed => StatusColor::Success,
            SyncStatus::Failed => StatusColor::Danger,
            SyncStatus::Paused => StatusColor::Neutral,
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SyncStatus::Pending),
            "processing" => Ok(SyncStatus::Processing),
            "completed" => Ok(SyncStatus::Completed),
            "failed" => Ok(SyncStatus::Failed),
            "paused" => Ok(SyncStatus::Paused),
            other => Err(Error::Validation(ValidationError::InvalidInput(format!(
                "Unknown sync status '{}'",
                other
            )))),
        }
    }
}

/// Display color category used by monitoring views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Warning,
    Info,
    Success,
    Danger,
    Neutral,
}

/// One row of the Sync Ledger (`remote_database_syncs`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncLedgerEntry {
    pub id: i64,
    pub table_name: String,
    pub last_synced_at: Option<DateTime<Utc>>,
    /// First key of the window
    pub start_id: i64,
    /// Window size
    pub range_limit: i64,
    pub status: SyncStatus,
    pub message: Option<String>,
    /// Sample of the first remote row read by the run
    pub remote_data: Option<Value>,
    pub number_of_records_synced: i64,
    pub total_records: Option<i64>,
    pub records_inserted: i64,
    pub records_updated: i64,
    pub records_skipped: i64,
    pub records_failed: i64,
    pub sync_started_at: Option<DateTime<Utc>>,
    pub sync_completed_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
    pub triggered_by: Option<String>,
    pub sync_config: SyncConfig,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SyncLedgerEntry {
    /// Percentage of `total_records` synced, rounded to two decimals and
    /// capped at 100. Zero when the total is unknown.
    pub fn progress_percentage(&self) -> f64 {
        match self.total_records {
            Some(total) if total > 0 => {
                let pct = self.number_of_records_synced as f64 / total as f64 * 100.0;
                ((pct * 100.0).round() / 100.0).clamp(0.0, 100.0)
            }
            _ => 0.0,
        }
    }

    pub fn status_color(&self) -> StatusColor {
        self.status.color()
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Rows the run has classified so far.
    pub fn records_processed(&self) -> i64 {
        self.records_inserted + self.records_updated + self.records_skipped + self.records_failed
    }

    /// First key after this entry's window.
    pub fn next_start_id(&self) -> i64 {
        self.start_id + self.range_limit
    }
}

/// Input for a new ledger entry. Status is always pending.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NewSyncLedgerEntry {
    pub table_name: String,
    pub start_id: i64,
    pub range_limit: i64,
    pub triggered_by: String,
    pub sync_config: SyncConfig,
}

/// Field changes written together with a status transition.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub status: SyncStatus,
    pub message: Option<String>,
    pub sync_started_at: Option<DateTime<Utc>>,
    pub sync_completed_at: Option<DateTime<Utc>>,
    pub last_synced_at: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
}

/// Counter increments flushed to the ledger by the progress tracker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressDelta {
    pub inserted: i64,
    pub updated: i64,
    pub skipped: i64,
    pub failed: i64,
    pub message: Option<String>,
}

impl ProgressDelta {
    /// Rows that changed local data.
    pub fn synced(&self) -> i64 {
        self.inserted + self.updated
    }

    pub fn rows(&self) -> i64 {
        self.inserted + self.updated + self.skipped + self.failed
    }

    pub fn is_empty(&self) -> bool {
        self.rows() == 0
    }
}

/// Filters for listing ledger entries. Results are newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerQuery {
    pub table_name: Option<String>,
    pub status: Option<SyncStatus>,
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

/// Aggregate view over the ledger, overall or for one table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatistics {
    pub total_syncs: i64,
    pub completed: i64,
    pub failed: i64,
    pub processing: i64,
    pub total_records_synced: i64,
    pub latest_sync: Option<SyncLedgerEntry>,
}
