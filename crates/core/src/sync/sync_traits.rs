use async_trait::async_trait;

use super::sync_model::CreateSyncRequest;
use crate::errors::Result;
use crate::ledger::{LedgerQuery, SyncLedgerEntry, SyncStatistics};
use crate::remote::RemoteConnectionStatus;

/// Trait for the batch orchestrator.
#[async_trait]
pub trait SyncServiceTrait: Send + Sync {
    /// Validates the request and creates a pending ledger entry.
    async fn create_entry(&self, request: CreateSyncRequest) -> Result<SyncLedgerEntry>;

    /// Runs a pending entry to a terminal status.
    ///
    /// Fatal run errors are recorded on the entry, which is returned with
    /// status failed. `Err` means the run could not be started or its
    /// outcome could not be persisted.
    async fn process_entry(&self, id: i64) -> Result<SyncLedgerEntry>;

    /// `create_entry` followed by `process_entry`.
    async fn start_sync(&self, request: CreateSyncRequest) -> Result<SyncLedgerEntry>;

    /// Marks a pending or processing entry failed with `reason`.
    async fn abandon_entry(&self, id: i64, reason: String) -> Result<SyncLedgerEntry>;

    fn get_entry(&self, id: i64) -> Result<SyncLedgerEntry>;

    fn list_entries(&self, query: &LedgerQuery) -> Result<Vec<SyncLedgerEntry>>;

    fn statistics(&self, table_name: Option<&str>) -> Result<SyncStatistics>;

    async fn test_remote_connection(&self) -> RemoteConnectionStatus;

    async fn list_remote_tables(&self) -> Result<Vec<String>>;
}
