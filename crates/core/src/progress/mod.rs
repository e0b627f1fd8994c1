//! Progress Tracker - row outcome counters flushed to the ledger.

use std::sync::Arc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::apply::RowOutcome;
use crate::constants::DEFAULT_PROGRESS_FLUSH_EVERY;
use crate::errors::Result;
use crate::ledger::{ProgressDelta, SyncLedger};

/// Running totals for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressTotals {
    pub inserted: i64,
    pub updated: i64,
    pub skipped: i64,
    pub failed: i64,
}

impl ProgressTotals {
    pub fn synced(&self) -> i64 {
        self.inserted + self.updated
    }

    pub fn processed(&self) -> i64 {
        self.inserted + self.updated + self.skipped + self.failed
    }

    fn add(&mut self, outcome: &RowOutcome) {
        match outcome {
            RowOutcome::Inserted => self.inserted += 1,
            RowOutcome::Updated => self.updated += 1,
            RowOutcome::Skipped => self.skipped += 1,
            RowOutcome::Failed(_) => self.failed += 1,
        }
    }

    /// Operator-facing summary written when a run completes.
    pub fn completion_message(&self) -> String {
        format!(
            "Successfully synced {} records. Inserted: {}, Updated: {}, Skipped: {}, Failed: {}",
            self.synced(),
            self.inserted,
            self.updated,
            self.skipped,
            self.failed
        )
    }
}

/// Counts row outcomes for one ledger entry and flushes them in batches.
pub struct ProgressTracker {
    ledger: Arc<SyncLedger>,
    entry_id: i64,
    flush_every: u32,
    totals: ProgressTotals,
    pending: ProgressTotals,
}

impl ProgressTracker {
    pub fn new(ledger: Arc<SyncLedger>, entry_id: i64, flush_every: u32) -> Self {
        Self {
            ledger,
            entry_id,
            flush_every: if flush_every == 0 {
                DEFAULT_PROGRESS_FLUSH_EVERY
            } else {
                flush_every
            },
            totals: ProgressTotals::default(),
            pending: ProgressTotals::default(),
        }
    }

    /// Counts `outcome` and flushes once `flush_every` rows are pending.
    pub async fn record(&mut self, outcome: &RowOutcome) -> Result<()> {
        self.totals.add(outcome);
        self.pending.add(outcome);
        if self.pending.processed() >= i64::from(self.flush_every) {
            self.flush().await?;
        }
        Ok(())
    }

    /// Writes pending counts to the ledger.
    pub async fn flush(&mut self) -> Result<()> {
        if self.pending.processed() == 0 {
            return Ok(());
        }
        let delta = ProgressDelta {
            inserted: self.pending.inserted,
            updated: self.pending.updated,
            skipped: self.pending.skipped,
            failed: self.pending.failed,
            message: Some(format!(
                "Processing... {} records processed",
                self.totals.processed()
            )),
        };
        debug!(
            "Flushing progress for sync entry {}: {} row(s)",
            self.entry_id,
            delta.rows()
        );
        self.ledger.apply_progress(self.entry_id, delta).await?;
        self.pending = ProgressTotals::default();
        Ok(())
    }

    /// Flushes the remainder and returns the run totals.
    pub async fn finish(mut self) -> Result<ProgressTotals> {
        self.flush().await?;
        Ok(self.totals)
    }

    pub fn totals(&self) -> ProgressTotals {
        self.totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::ledger::tests::InMemoryLedgerRepository;
    use crate::ledger::SyncStatus;

    async fn processing_entry(repo: &InMemoryLedgerRepository) -> (Arc<SyncLedger>, i64) {
        let ledger = Arc::new(SyncLedger::new(Arc::new(repo.clone())));
        let entry = ledger
            .create_entry("students", 100, SyncConfig::default(), None)
            .await
            .unwrap();
        ledger.mark_started(entry.id).await.unwrap();
        (ledger, entry.id)
    }

    #[tokio::test]
    async fn test_flushes_every_n_rows_and_on_finish() {
        let repo = InMemoryLedgerRepository::new();
        let (ledger, id) = processing_entry(&repo).await;
        let mut tracker = ProgressTracker::new(ledger, id, 3);

        for outcome in [
            RowOutcome::Inserted,
            RowOutcome::Updated,
            RowOutcome::Skipped,
            RowOutcome::Failed("bad".to_string()),
            RowOutcome::Inserted,
        ] {
            tracker.record(&outcome).await.unwrap();
        }
        assert_eq!(repo.progress_writes.lock().unwrap().len(), 1);
        let mid = repo.snapshot(id);
        assert_eq!(mid.records_inserted + mid.records_updated + mid.records_skipped, 3);
        assert_eq!(mid.message.as_deref(), Some("Processing... 3 records processed"));

        let totals = tracker.finish().await.unwrap();
        assert_eq!(repo.progress_writes.lock().unwrap().len(), 2);
        assert_eq!(
            totals,
            ProgressTotals {
                inserted: 2,
                updated: 1,
                skipped: 1,
                failed: 1
            }
        );

        let entry = repo.snapshot(id);
        assert_eq!(entry.status, SyncStatus::Processing);
        assert_eq!(entry.records_inserted, 2);
        assert_eq!(entry.records_failed, 1);
        assert_eq!(entry.number_of_records_synced, 3);
        assert_eq!(entry.message.as_deref(), Some("Processing... 5 records processed"));
    }

    #[tokio::test]
    async fn test_finish_without_rows_writes_nothing() {
        let repo = InMemoryLedgerRepository::new();
        let (ledger, id) = processing_entry(&repo).await;
        let totals = ProgressTracker::new(ledger, id, 10).finish().await.unwrap();

        assert_eq!(totals, ProgressTotals::default());
        assert!(repo.progress_writes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_flush_error_propagates() {
        let repo = InMemoryLedgerRepository::new();
        let (ledger, id) = processing_entry(&repo).await;
        *repo.fail_on_progress.lock().unwrap() = true;
        let mut tracker = ProgressTracker::new(ledger, id, 1);

        assert!(tracker.record(&RowOutcome::Inserted).await.is_err());
    }

    #[test]
    fn test_completion_message_format() {
        let totals = ProgressTotals {
            inserted: 400,
            updated: 80,
            skipped: 15,
            failed: 5,
        };
        assert_eq!(
            totals.completion_message(),
            "Successfully synced 480 records. Inserted: 400, Updated: 80, Skipped: 15, Failed: 5"
        );
    }
}
