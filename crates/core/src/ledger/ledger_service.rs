use std::sync::Arc;

use chrono::Utc;
use log::{debug, info, warn};
use serde_json::Value;

use super::ledger_model::{
    LedgerQuery, NewSyncLedgerEntry, ProgressDelta, StatusChange, SyncLedgerEntry, SyncStatistics,
    SyncStatus,
};
use super::ledger_traits::SyncLedgerRepositoryTrait;
use crate::config::{FailedWindowPolicy, SyncConfig};
use crate::constants::{SYNC_STARTED_MESSAGE, SYSTEM_ACTOR};
use crate::errors::{DatabaseError, Error, Result, SyncError};
use crate::utils::time_utils::duration_seconds;

/// Sync Ledger service: entry creation, continuation and status lifecycle.
pub struct SyncLedger {
    repository: Arc<dyn SyncLedgerRepositoryTrait>,
}

impl SyncLedger {
    pub fn new(repository: Arc<dyn SyncLedgerRepositoryTrait>) -> Self {
        Self { repository }
    }

    /// Computes where the next window for `table_name` starts.
    ///
    /// Continuation follows the most recent terminal entry. A completed entry
    /// advances past its window. A failed entry needs an explicit policy so a
    /// failed window is never skipped or repeated by accident.
    pub fn next_start_id(
        &self,
        table_name: &str,
        on_failed_window: Option<FailedWindowPolicy>,
    ) -> Result<i64> {
        let Some(last) = self.repository.latest_terminal_for_table(table_name)? else {
            return Ok(0);
        };

        match last.status {
            SyncStatus::Completed => Ok(last.next_start_id()),
            _ => match on_failed_window {
                Some(FailedWindowPolicy::Retry) => Ok(last.start_id),
                Some(FailedWindowPolicy::SkipForward) => Ok(last.next_start_id()),
                None => Err(SyncError::DecisionRequired {
                    table: table_name.to_string(),
                    entry_id: last.id,
                }
                .into()),
            },
        }
    }

    /// Creates a pending entry for the next window of `table_name`.
    pub async fn create_entry(
        &self,
        table_name: &str,
        range_limit: i64,
        config: SyncConfig,
        triggered_by: Option<&str>,
    ) -> Result<SyncLedgerEntry> {
        if let Some(active) = self.repository.find_active_for_table(table_name)? {
            debug!(
                "Table '{}' already has active sync entry {} ({})",
                table_name, active.id, active.status
            );
            return Err(SyncError::AlreadyActive(table_name.to_string()).into());
        }

        let start_id = self.next_start_id(table_name, config.on_failed_window)?;
        let triggered_by = triggered_by
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(SYSTEM_ACTOR)
            .to_string();

        let new_entry = NewSyncLedgerEntry {
            table_name: table_name.to_string(),
            start_id,
            range_limit,
            triggered_by,
            sync_config: config,
        };

        let entry = self
            .repository
            .create(new_entry)
            .await
            .map_err(|err| match err {
                Error::Database(DatabaseError::UniqueViolation(_)) => {
                    Error::Sync(SyncError::AlreadyActive(table_name.to_string()))
                }
                other => other,
            })?;

        info!(
            "Created sync entry {} for '{}' (start_id={}, range_limit={})",
            entry.id, entry.table_name, entry.start_id, entry.range_limit
        );
        Ok(entry)
    }

    pub fn get_entry(&self, id: i64) -> Result<SyncLedgerEntry> {
        self.repository
            .get_by_id(id)?
            .ok_or_else(|| SyncError::NotFound(id).into())
    }

    pub fn list_entries(&self, query: &LedgerQuery) -> Result<Vec<SyncLedgerEntry>> {
        self.repository.list(query)
    }

    pub fn latest_for_table(&self, table_name: &str) -> Result<Option<SyncLedgerEntry>> {
        self.repository.latest_for_table(table_name)
    }

    pub fn statistics(&self, table_name: Option<&str>) -> Result<SyncStatistics> {
        self.repository.statistics(table_name)
    }

    /// pending -> processing
    pub async fn mark_started(&self, id: i64) -> Result<SyncLedgerEntry> {
        self.transition(id, SyncStatus::Processing, SYNC_STARTED_MESSAGE.to_string())
            .await
    }

    /// processing -> completed
    pub async fn mark_completed(&self, id: i64, message: String) -> Result<SyncLedgerEntry> {
        self.transition(id, SyncStatus::Completed, message).await
    }

    /// pending | processing -> failed
    pub async fn mark_failed(&self, id: i64, message: String) -> Result<SyncLedgerEntry> {
        self.transition(id, SyncStatus::Failed, message).await
    }

    pub async fn apply_progress(&self, id: i64, delta: ProgressDelta) -> Result<()> {
        if delta.is_empty() && delta.message.is_none() {
            return Ok(());
        }
        if !self.repository.apply_progress(id, delta).await? {
            warn!("Progress for sync entry {} dropped: entry is not processing", id);
        }
        Ok(())
    }

    pub async fn record_window(
        &self,
        id: i64,
        total_records: Option<i64>,
        remote_data: Option<Value>,
    ) -> Result<()> {
        self.repository
            .record_window(id, total_records, remote_data)
            .await
    }

    async fn transition(
        &self,
        id: i64,
        next: SyncStatus,
        message: String,
    ) -> Result<SyncLedgerEntry> {
        let current = self.get_entry(id)?;
        if !current.status.can_transition_to(next) {
            return Err(SyncError::InvalidTransition {
                id,
                from: current.status,
                to: next,
            }
            .into());
        }

        let now = Utc::now();
        let mut change = StatusChange {
            status: next,
            message: Some(message),
            sync_started_at: None,
            sync_completed_at: None,
            last_synced_at: None,
            duration_seconds: None,
        };
        match next {
            SyncStatus::Processing => change.sync_started_at = Some(now),
            SyncStatus::Completed => {
                change.sync_completed_at = Some(now);
                change.last_synced_at = Some(now);
                change.duration_seconds = duration_seconds(current.sync_started_at, now);
            }
            SyncStatus::Failed => {
                change.sync_completed_at = Some(now);
                change.duration_seconds = duration_seconds(current.sync_started_at, now);
            }
            SyncStatus::Pending | SyncStatus::Paused => {}
        }

        match self.repository.transition(id, current.status, change).await? {
            Some(entry) => {
                debug!("Sync entry {} moved {} -> {}", id, current.status, next);
                Ok(entry)
            }
            None => {
                // Another writer moved the entry between the read and the write.
                let latest = self.get_entry(id)?;
                Err(SyncError::InvalidTransition {
                    id,
                    from: latest.status,
                    to: next,
                }
                .into())
            }
        }
    }
}
