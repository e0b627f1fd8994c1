use async_trait::async_trait;
use serde_json::Value;

use super::ledger_model::{
    LedgerQuery, NewSyncLedgerEntry, ProgressDelta, StatusChange, SyncLedgerEntry, SyncStatistics,
    SyncStatus,
};
use crate::errors::Result;

/// Persistence operations for the Sync Ledger.
///
/// Entries are never deleted. Writes that depend on the current status are
/// conditional, so callers learn about a lost race from the return value
/// instead of silently overwriting a terminal entry.
#[async_trait]
pub trait SyncLedgerRepositoryTrait: Send + Sync {
    /// Inserts a pending entry. Fails with a unique violation when the table
    /// already has a pending or processing entry.
    async fn create(&self, new_entry: NewSyncLedgerEntry) -> Result<SyncLedgerEntry>;

    fn get_by_id(&self, id: i64) -> Result<Option<SyncLedgerEntry>>;

    fn list(&self, query: &LedgerQuery) -> Result<Vec<SyncLedgerEntry>>;

    /// Most recent entry for the table, any status.
    fn latest_for_table(&self, table_name: &str) -> Result<Option<SyncLedgerEntry>>;

    /// Most recent completed or failed entry for the table.
    fn latest_terminal_for_table(&self, table_name: &str) -> Result<Option<SyncLedgerEntry>>;

    fn find_active_for_table(&self, table_name: &str) -> Result<Option<SyncLedgerEntry>>;

    /// Applies `change` only while the entry is still in `expected`.
    /// Returns `None` when the entry was not in that status.
    async fn transition(
        &self,
        id: i64,
        expected: SyncStatus,
        change: StatusChange,
    ) -> Result<Option<SyncLedgerEntry>>;

    /// Adds `delta` to the counters of a processing entry. Returns false when
    /// the entry is not processing.
    async fn apply_progress(&self, id: i64, delta: ProgressDelta) -> Result<bool>;

    /// Stores the remote total and the first-row sample. Only a processing
    /// entry is written.
    async fn record_window(
        &self,
        id: i64,
        total_records: Option<i64>,
        remote_data: Option<Value>,
    ) -> Result<()>;

    fn statistics(&self, table_name: Option<&str>) -> Result<SyncStatistics>;
}
