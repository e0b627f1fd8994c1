//! Tests for the Sync Ledger service.

use super::*;
use crate::config::{FailedWindowPolicy, SyncConfig};
use crate::errors::{DatabaseError, Error, Result, SyncError};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::sync::{Arc, Mutex};

// ============================================================================
// In-memory repository
// ============================================================================

/// Ledger repository backed by a vector. Mirrors the conditional writes and
/// the one-active-entry-per-table constraint of the SQLite repository.
#[derive(Clone, Default)]
pub(crate) struct InMemoryLedgerRepository {
    pub entries: Arc<Mutex<Vec<SyncLedgerEntry>>>,
    pub progress_writes: Arc<Mutex<Vec<ProgressDelta>>>,
    pub fail_on_progress: Arc<Mutex<bool>>,
}

impl InMemoryLedgerRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a terminal entry directly, bypassing the service.
    pub fn seed(&self, table: &str, start_id: i64, range_limit: i64, status: SyncStatus) -> i64 {
        let mut entries = self.entries.lock().unwrap();
        let id = entries.len() as i64 + 1;
        let now = Utc::now();
        entries.push(SyncLedgerEntry {
            id,
            table_name: table.to_string(),
            last_synced_at: None,
            start_id,
            range_limit,
            status,
            message: None,
            remote_data: None,
            number_of_records_synced: 0,
            total_records: None,
            records_inserted: 0,
            records_updated: 0,
            records_skipped: 0,
            records_failed: 0,
            sync_started_at: None,
            sync_completed_at: None,
            duration_seconds: None,
            triggered_by: Some("seed".to_string()),
            sync_config: SyncConfig::default(),
            created_at: now,
            updated_at: now,
        });
        id
    }

    pub fn snapshot(&self, id: i64) -> SyncLedgerEntry {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .unwrap()
    }
}

#[async_trait]
impl SyncLedgerRepositoryTrait for InMemoryLedgerRepository {
    async fn create(&self, new_entry: NewSyncLedgerEntry) -> Result<SyncLedgerEntry> {
        let mut entries = self.entries.lock().unwrap();
        if entries
            .iter()
            .any(|e| e.table_name == new_entry.table_name && e.status.is_active())
        {
            return Err(Error::Database(DatabaseError::UniqueViolation(
                "remote_database_syncs.table_name".to_string(),
            )));
        }
        let now = Utc::now();
        let entry = SyncLedgerEntry {
            id: entries.len() as i64 + 1,
            table_name: new_entry.table_name,
            last_synced_at: None,
            start_id: new_entry.start_id,
            range_limit: new_entry.range_limit,
            status: SyncStatus::Pending,
            message: None,
            remote_data: None,
            number_of_records_synced: 0,
            total_records: None,
            records_inserted: 0,
            records_updated: 0,
            records_skipped: 0,
            records_failed: 0,
            sync_started_at: None,
            sync_completed_at: None,
            duration_seconds: None,
            triggered_by: Some(new_entry.triggered_by),
            sync_config: new_entry.sync_config,
            created_at: now,
            updated_at: now,
        };
        entries.push(entry.clone());
        Ok(entry)
    }

    fn get_by_id(&self, id: i64) -> Result<Option<SyncLedgerEntry>> {
        Ok(self.entries.lock().unwrap().iter().find(|e| e.id == id).cloned())
    }

    fn list(&self, query: &LedgerQuery) -> Result<Vec<SyncLedgerEntry>> {
        let mut out: Vec<SyncLedgerEntry> = self
            .entries
            .lock()
            .unwrap()
            .iter()
            .rev()
            .filter(|e| query.table_name.as_deref().is_none_or(|t| e.table_name == t))
            .filter(|e| query.status.is_none_or(|s| e.status == s))
            .filter(|e| query.since.is_none_or(|s| e.created_at >= s))
            .cloned()
            .collect();
        if let Some(limit) = query.limit {
            out.truncate(limit.max(0) as usize);
        }
        Ok(out)
    }

    fn latest_for_table(&self, table_name: &str) -> Result<Option<SyncLedgerEntry>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|e| e.table_name == table_name)
            .cloned())
    }

    fn latest_terminal_for_table(&self, table_name: &str) -> Result<Option<SyncLedgerEntry>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|e| e.table_name == table_name && e.status.is_terminal())
            .cloned())
    }

    fn find_active_for_table(&self, table_name: &str) -> Result<Option<SyncLedgerEntry>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.table_name == table_name && e.status.is_active())
            .cloned())
    }

    async fn transition(
        &self,
        id: i64,
        expected: SyncStatus,
        change: StatusChange,
    ) -> Result<Option<SyncLedgerEntry>> {
        let mut entries = self.entries.lock().unwrap();
        let Some(entry) = entries.iter_mut().find(|e| e.id == id && e.status == expected) else {
            return Ok(None);
        };
        entry.status = change.status;
        if change.message.is_some() {
            entry.message = change.message;
        }
        if change.sync_started_at.is_some() {
            entry.sync_started_at = change.sync_started_at;
        }
        if change.sync_completed_at.is_some() {
            entry.sync_completed_at = change.sync_completed_at;
        }
        if change.last_synced_at.is_some() {
            entry.last_synced_at = change.last_synced_at;
        }
        if change.duration_seconds.is_some() {
            entry.duration_seconds = change.duration_seconds;
        }
        entry.updated_at = Utc::now();
        Ok(Some(entry.clone()))
    }

    async fn apply_progress(&self, id: i64, delta: ProgressDelta) -> Result<bool> {
        if *self.fail_on_progress.lock().unwrap() {
            return Err(Error::Database(DatabaseError::QueryFailed(
                "disk I/O error".to_string(),
            )));
        }
        let mut entries = self.entries.lock().unwrap();
        let Some(entry) = entries
            .iter_mut()
            .find(|e| e.id == id && e.status == SyncStatus::Processing)
        else {
            return Ok(false);
        };
        entry.records_inserted += delta.inserted;
        entry.records_updated += delta.updated;
        entry.records_skipped += delta.skipped;
        entry.records_failed += delta.failed;
        entry.number_of_records_synced += delta.synced();
        if delta.message.is_some() {
            entry.message = delta.message.clone();
        }
        self.progress_writes.lock().unwrap().push(delta);
        Ok(true)
    }

    async fn record_window(
        &self,
        id: i64,
        total_records: Option<i64>,
        remote_data: Option<Value>,
    ) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        if let Some(entry) = entries
            .iter_mut()
            .find(|e| e.id == id && e.status == SyncStatus::Processing)
        {
            entry.total_records = total_records;
            entry.remote_data = remote_data;
        }
        Ok(())
    }

    fn statistics(&self, table_name: Option<&str>) -> Result<SyncStatistics> {
        let entries = self.entries.lock().unwrap();
        let scoped: Vec<&SyncLedgerEntry> = entries
            .iter()
            .filter(|e| table_name.is_none_or(|t| e.table_name == t))
            .collect();
        let count = |s: SyncStatus| scoped.iter().filter(|e| e.status == s).count() as i64;
        Ok(SyncStatistics {
            total_syncs: scoped.len() as i64,
            completed: count(SyncStatus::Completed),
            failed: count(SyncStatus::Failed),
            processing: count(SyncStatus::Processing),
            total_records_synced: scoped.iter().map(|e| e.number_of_records_synced).sum(),
            latest_sync: scoped.last().map(|e| (*e).clone()),
        })
    }
}

fn ledger_with(repo: &InMemoryLedgerRepository) -> SyncLedger {
    SyncLedger::new(Arc::new(repo.clone()))
}

// ============================================================================
// Derived attributes
// ============================================================================

mod derived_tests {
    use super::*;

    #[test]
    fn test_progress_percentage_bounds() {
        let repo = InMemoryLedgerRepository::new();
        let id = repo.seed("students", 0, 1000, SyncStatus::Processing);
        let mut entry = repo.snapshot(id);

        assert_eq!(entry.progress_percentage(), 0.0);

        entry.total_records = Some(0);
        entry.number_of_records_synced = 5;
        assert_eq!(entry.progress_percentage(), 0.0);

        entry.total_records = Some(3);
        entry.number_of_records_synced = 1;
        assert_eq!(entry.progress_percentage(), 33.33);

        entry.number_of_records_synced = 7;
        assert_eq!(entry.progress_percentage(), 100.0);
    }

    #[test]
    fn test_status_colors() {
        assert_eq!(SyncStatus::Pending.color(), StatusColor::Warning);
        assert_eq!(SyncStatus::Processing.color(), StatusColor::Info);
        assert_eq!(SyncStatus::Completed.color(), StatusColor::Success);
        assert_eq!(SyncStatus::Failed.color(), StatusColor::Danger);
        assert_eq!(SyncStatus::Paused.color(), StatusColor::Neutral);
    }

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [
            SyncStatus::Pending,
            SyncStatus::Processing,
            SyncStatus::Completed,
            SyncStatus::Failed,
            SyncStatus::Paused,
        ] {
            assert_eq!(status.as_str().parse::<SyncStatus>().unwrap(), status);
        }
        assert!("running".parse::<SyncStatus>().is_err());
    }

    #[test]
    fn test_transitions_only_move_forward() {
        assert!(SyncStatus::Pending.can_transition_to(SyncStatus::Processing));
        assert!(SyncStatus::Processing.can_transition_to(SyncStatus::Completed));
        assert!(SyncStatus::Processing.can_transition_to(SyncStatus::Failed));
        assert!(SyncStatus::Pending.can_transition_to(SyncStatus::Failed));

        assert!(!SyncStatus::Pending.can_transition_to(SyncStatus::Completed));
        assert!(!SyncStatus::Completed.can_transition_to(SyncStatus::Failed));
        assert!(!SyncStatus::Failed.can_transition_to(SyncStatus::Processing));
        assert!(!SyncStatus::Processing.can_transition_to(SyncStatus::Pending));
    }
}

// ============================================================================
// Continuation
// ============================================================================

mod continuation_tests {
    use super::*;

    #[tokio::test]
    async fn test_first_entry_starts_at_zero() {
        let repo = InMemoryLedgerRepository::new();
        let ledger = ledger_with(&repo);

        let entry = ledger
            .create_entry("acad_results", 500, SyncConfig::default(), None)
            .await
            .unwrap();

        assert_eq!(entry.start_id, 0);
        assert_eq!(entry.range_limit, 500);
        assert_eq!(entry.status, SyncStatus::Pending);
        assert_eq!(entry.triggered_by.as_deref(), Some("System"));
    }

    #[tokio::test]
    async fn test_continues_after_last_completed_window() {
        let repo = InMemoryLedgerRepository::new();
        repo.seed("acad_results", 1000, 500, SyncStatus::Completed);
        repo.seed("students", 0, 50, SyncStatus::Completed);
        let ledger = ledger_with(&repo);

        let entry = ledger
            .create_entry("acad_results", 500, SyncConfig::default(), Some("registrar"))
            .await
            .unwrap();

        assert_eq!(entry.start_id, 1500);
        assert_eq!(entry.triggered_by.as_deref(), Some("registrar"));
    }

    #[tokio::test]
    async fn test_failed_window_requires_decision() {
        let repo = InMemoryLedgerRepository::new();
        repo.seed("acad_results", 0, 500, SyncStatus::Completed);
        let failed_id = repo.seed("acad_results", 500, 500, SyncStatus::Failed);
        let ledger = ledger_with(&repo);

        let err = ledger
            .create_entry("acad_results", 500, SyncConfig::default(), None)
            .await
            .unwrap_err();
        match err {
            Error::Sync(SyncError::DecisionRequired { table, entry_id }) => {
                assert_eq!(table, "acad_results");
                assert_eq!(entry_id, failed_id);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_failed_window_policies() {
        let repo = InMemoryLedgerRepository::new();
        repo.seed("acad_results", 0, 500, SyncStatus::Completed);
        repo.seed("acad_results", 500, 500, SyncStatus::Failed);
        let ledger = ledger_with(&repo);

        assert_eq!(
            ledger
                .next_start_id("acad_results", Some(FailedWindowPolicy::Retry))
                .unwrap(),
            500
        );
        assert_eq!(
            ledger
                .next_start_id("acad_results", Some(FailedWindowPolicy::SkipForward))
                .unwrap(),
            1000
        );
    }

    #[test]
    fn test_completed_after_failed_continues_normally() {
        let repo = InMemoryLedgerRepository::new();
        repo.seed("acad_results", 0, 500, SyncStatus::Failed);
        repo.seed("acad_results", 0, 500, SyncStatus::Completed);
        let ledger = ledger_with(&repo);

        assert_eq!(ledger.next_start_id("acad_results", None).unwrap(), 500);
    }

    #[tokio::test]
    async fn test_second_active_entry_is_rejected() {
        let repo = InMemoryLedgerRepository::new();
        let ledger = ledger_with(&repo);

        ledger
            .create_entry("students", 100, SyncConfig::default(), None)
            .await
            .unwrap();
        let err = ledger
            .create_entry("students", 100, SyncConfig::default(), None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Sync(SyncError::AlreadyActive(t)) if t == "students"));
        assert_eq!(repo.entries.lock().unwrap().len(), 1);
    }
}

// ============================================================================
// Lifecycle
// ============================================================================

mod lifecycle_tests {
    use super::*;

    #[tokio::test]
    async fn test_full_lifecycle_sets_timestamps_once() {
        let repo = InMemoryLedgerRepository::new();
        let ledger = ledger_with(&repo);
        let entry = ledger
            .create_entry("students", 100, SyncConfig::default(), None)
            .await
            .unwrap();

        let started = ledger.mark_started(entry.id).await.unwrap();
        assert_eq!(started.status, SyncStatus::Processing);
        assert_eq!(started.message.as_deref(), Some("Sync started..."));
        assert!(started.sync_started_at.is_some());
        assert!(started.sync_completed_at.is_none());

        let completed = ledger
            .mark_completed(entry.id, "done".to_string())
            .await
            .unwrap();
        assert_eq!(completed.status, SyncStatus::Completed);
        assert!(completed.sync_completed_at.is_some());
        assert!(completed.last_synced_at.is_some());
        assert!(completed.duration_seconds.unwrap() >= 0);

        let err = ledger
            .mark_failed(entry.id, "late failure".to_string())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Sync(SyncError::InvalidTransition {
                from: SyncStatus::Completed,
                to: SyncStatus::Failed,
                ..
            })
        ));
        let after = repo.snapshot(entry.id);
        assert_eq!(after.status, SyncStatus::Completed);
        assert_eq!(after.message.as_deref(), Some("done"));
        assert_eq!(after.sync_completed_at, completed.sync_completed_at);
    }

    #[tokio::test]
    async fn test_fail_before_start_has_no_duration() {
        let repo = InMemoryLedgerRepository::new();
        let ledger = ledger_with(&repo);
        let entry = ledger
            .create_entry("students", 100, SyncConfig::default(), None)
            .await
            .unwrap();

        let failed = ledger
            .mark_failed(entry.id, "worker crashed".to_string())
            .await
            .unwrap();

        assert_eq!(failed.status, SyncStatus::Failed);
        assert!(failed.sync_completed_at.is_some());
        assert!(failed.last_synced_at.is_none());
        assert!(failed.duration_seconds.is_none());
    }

    #[tokio::test]
    async fn test_complete_requires_processing() {
        let repo = InMemoryLedgerRepository::new();
        let ledger = ledger_with(&repo);
        let entry = ledger
            .create_entry("students", 100, SyncConfig::default(), None)
            .await
            .unwrap();

        let err = ledger
            .mark_completed(entry.id, "done".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Sync(SyncError::InvalidTransition { .. })));
        assert_eq!(repo.snapshot(entry.id).status, SyncStatus::Pending);
    }

    #[tokio::test]
    async fn test_unknown_entry_is_not_found() {
        let repo = InMemoryLedgerRepository::new();
        let ledger = ledger_with(&repo);

        let err = ledger.mark_started(42).await.unwrap_err();
        assert!(matches!(err, Error::Sync(SyncError::NotFound(42))));
    }

    #[tokio::test]
    async fn test_progress_is_ignored_once_terminal() {
        let repo = InMemoryLedgerRepository::new();
        let ledger = ledger_with(&repo);
        let entry = ledger
            .create_entry("students", 100, SyncConfig::default(), None)
            .await
            .unwrap();
        ledger.mark_started(entry.id).await.unwrap();
        ledger
            .apply_progress(
                entry.id,
                ProgressDelta {
                    inserted: 2,
                    updated: 1,
                    skipped: 1,
                    failed: 0,
                    message: None,
                },
            )
            .await
            .unwrap();
        ledger
            .mark_completed(entry.id, "done".to_string())
            .await
            .unwrap();

        ledger
            .apply_progress(
                entry.id,
                ProgressDelta {
                    inserted: 5,
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let after = repo.snapshot(entry.id);
        assert_eq!(after.records_inserted, 2);
        assert_eq!(after.number_of_records_synced, 3);
        assert_eq!(
            after.number_of_records_synced,
            after.records_inserted + after.records_updated
        );
    }
}
