use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, error, info, warn};

use super::sync_lock::TableLocks;
use super::sync_model::{CreateSyncRequest, SyncSettings};
use super::sync_traits::SyncServiceTrait;
use crate::apply::{LocalTableStore, RowOutcome, UpsertApplier};
use crate::config::validate_range_limit;
use crate::errors::{Result, SyncError};
use crate::ledger::{
    LedgerQuery, SyncLedger, SyncLedgerEntry, SyncLedgerRepositoryTrait, SyncStatistics,
    SyncStatus,
};
use crate::progress::{ProgressTotals, ProgressTracker};
use crate::remote::{RemoteConnectionStatus, RemoteRow, RemoteTableReader};
use crate::transform::coerce::as_trimmed_text;
use crate::transform::{ResolvedTransformer, TransformerRegistry};
use crate::utils::validate_identifier;

/// `column=value` for log and failure messages; `?` when the key is missing.
pub(super) fn row_key_label(row: &RemoteRow, column: &str) -> String {
    let value = row
        .get(column)
        .and_then(as_trimmed_text)
        .unwrap_or_else(|| "?".to_string());
    format!("{}={}", column, value)
}

/// Batch orchestrator: one bounded window of one table per run.
pub struct SyncService {
    ledger: Arc<SyncLedger>,
    reader: Arc<dyn RemoteTableReader>,
    applier: UpsertApplier,
    registry: TransformerRegistry,
    settings: SyncSettings,
    locks: TableLocks,
}

impl SyncService {
    pub fn new(
        ledger_repository: Arc<dyn SyncLedgerRepositoryTrait>,
        reader: Arc<dyn RemoteTableReader>,
        store: Arc<dyn LocalTableStore>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            ledger: Arc::new(SyncLedger::new(ledger_repository)),
            reader,
            applier: UpsertApplier::new(store),
            registry: TransformerRegistry::new(),
            settings,
            locks: TableLocks::new(),
        }
    }

    /// Replaces the transformer registry.
    pub fn with_registry(mut self, registry: TransformerRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn settings(&self) -> SyncSettings {
        self.settings
    }

    /// Whether this process is currently running a window for `table_name`.
    pub fn is_running(&self, table_name: &str) -> bool {
        self.locks.is_held(table_name)
    }

    /// Reads the window, applies every row and flushes progress.
    /// Errors returned here are fatal for the run.
    async fn run_window(&self, entry: &SyncLedgerEntry) -> Result<ProgressTotals> {
        let table = validate_identifier(&entry.table_name)?;
        let resolved = self.registry.resolve(table, &entry.sync_config)?;
        let key_column = validate_identifier(&resolved.remote_key_column)?;

        let total_records = match self.reader.count_rows(table).await {
            Ok(total) => Some(total),
            Err(e) => {
                warn!("Could not count remote rows for '{}': {}", table, e);
                None
            }
        };

        let rows = self
            .reader
            .fetch_window(table, key_column, entry.start_id, entry.range_limit)
            .await?;
        info!(
            "Fetched {} row(s) from '{}' for window [{}, {})",
            rows.len(),
            table,
            entry.start_id,
            entry.next_start_id()
        );

        let sample = rows.first().map(RemoteRow::to_json);
        self.ledger
            .record_window(entry.id, total_records, sample)
            .await?;

        let mut tracker = ProgressTracker::new(
            self.ledger.clone(),
            entry.id,
            self.settings.progress_flush_every,
        );
        for row in &rows {
            let outcome = self.process_row(entry, &resolved, row).await;
            tracker.record(&outcome).await?;
        }
        tracker.finish().await
    }

    async fn process_row(
        &self,
        entry: &SyncLedgerEntry,
        resolved: &ResolvedTransformer,
        row: &RemoteRow,
    ) -> RowOutcome {
        let remote_key = row_key_label(row, &resolved.remote_key_column);

        let transformed = resolved
            .transformer
            .transform(row, &entry.sync_config)
            .and_then(|local| {
                let key = local.key_for(&resolved.natural_key)?;
                Ok((local, key))
            });

        match transformed {
            Ok((local, key)) => self.applier.apply(&entry.table_name, &key, &local).await,
            Err(e) => {
                debug!(
                    "Row {} of '{}' rejected: {}",
                    remote_key, entry.table_name, e
                );
                RowOutcome::Failed(format!("{}: {}", remote_key, e))
            }
        }
    }
}

#[async_trait]
impl SyncServiceTrait for SyncService {
    async fn create_entry(&self, request: CreateSyncRequest) -> Result<SyncLedgerEntry> {
        let table = validate_identifier(request.table_name.trim())?.to_string();
        let mut config = request.config.unwrap_or_default();
        if request.range_limit.is_some() {
            config.range_limit = request.range_limit;
        }
        config.validate()?;

        let range_limit = config.effective_range_limit(self.settings.default_range_limit);
        validate_range_limit(range_limit)?;

        // Unsupported tables are rejected before anything is recorded.
        self.registry.resolve(&table, &config)?;

        self.ledger
            .create_entry(&table, range_limit, config, request.triggered_by.as_deref())
            .await
    }

    async fn process_entry(&self, id: i64) -> Result<SyncLedgerEntry> {
        let entry = self.ledger.get_entry(id)?;
        if entry.status != SyncStatus::Pending {
            return Err(SyncError::InvalidTransition {
                id,
                from: entry.status,
                to: SyncStatus::Processing,
            }
            .into());
        }

        let Some(_guard) = self.locks.try_acquire(&entry.table_name) else {
            return Err(SyncError::AlreadyActive(entry.table_name.clone()).into());
        };

        let entry = self.ledger.mark_started(id).await?;
        info!(
            "Sync entry {} started for '{}' (start_id={}, range_limit={})",
            entry.id, entry.table_name, entry.start_id, entry.range_limit
        );

        match self.run_window(&entry).await {
            Ok(totals) => {
                let completed = self
                    .ledger
                    .mark_completed(id, totals.completion_message())
                    .await?;
                info!(
                    "Sync entry {} completed: {} inserted, {} updated, {} skipped, {} failed",
                    id, totals.inserted, totals.updated, totals.skipped, totals.failed
                );
                Ok(completed)
            }
            Err(e) => {
                error!("Sync entry {} for '{}' failed: {}", id, entry.table_name, e);
                self.ledger
                    .mark_failed(id, format!("Sync failed: {}", e))
                    .await
            }
        }
    }

    async fn start_sync(&self, request: CreateSyncRequest) -> Result<SyncLedgerEntry> {
        let entry = self.create_entry(request).await?;
        self.process_entry(entry.id).await
    }

    async fn abandon_entry(&self, id: i64, reason: String) -> Result<SyncLedgerEntry> {
        let entry = self.ledger.get_entry(id)?;
        if !entry.status.is_active() {
            return Err(SyncError::InvalidTransition {
                id,
                from: entry.status,
                to: SyncStatus::Failed,
            }
            .into());
        }

        let reason = reason.trim();
        let message = if reason.is_empty() {
            "Abandoned by operator".to_string()
        } else {
            format!("Abandoned by operator: {}", reason)
        };
        warn!("Abandoning sync entry {} for '{}'", id, entry.table_name);
        self.ledger.mark_failed(id, message).await
    }

    fn get_entry(&self, id: i64) -> Result<SyncLedgerEntry> {
        self.ledger.get_entry(id)
    }

    fn list_entries(&self, query: &LedgerQuery) -> Result<Vec<SyncLedgerEntry>> {
        self.ledger.list_entries(query)
    }

    fn statistics(&self, table_name: Option<&str>) -> Result<SyncStatistics> {
        self.ledger.statistics(table_name)
    }

    async fn test_remote_connection(&self) -> RemoteConnectionStatus {
        self.reader.ping().await
    }

    async fn list_remote_tables(&self) -> Result<Vec<String>> {
        self.reader.list_tables().await
    }
}
