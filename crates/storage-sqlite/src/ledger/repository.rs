//! Repository for Sync Ledger persistence.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Nullable, Text};
use diesel::sqlite::SqliteConnection;
use serde_json::Value;
use std::sync::Arc;

use records_sync_core::errors::Result;
use records_sync_core::ledger::{
    LedgerQuery, NewSyncLedgerEntry, ProgressDelta, StatusChange, SyncLedgerEntry,
    SyncLedgerRepositoryTrait, SyncStatistics, SyncStatus,
};

use super::model::{NewSyncLedgerEntryDB, StatusChangeDB, SyncLedgerEntryDB};
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::remote_database_syncs;
use crate::schema::remote_database_syncs::dsl::*;
use crate::utils::to_db_timestamp;

const DEFAULT_LIST_LIMIT: i64 = 100;
const MAX_LIST_LIMIT: i64 = 1000;

#[derive(QueryableByName, Debug)]
struct StatisticsRow {
    #[diesel(sql_type = BigInt)]
    total_syncs: i64,
    #[diesel(sql_type = BigInt)]
    completed: i64,
    #[diesel(sql_type = BigInt)]
    failed: i64,
    #[diesel(sql_type = BigInt)]
    processing: i64,
    #[diesel(sql_type = BigInt)]
    total_records_synced: i64,
}

pub struct SyncLedgerRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SyncLedgerRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    fn load_one(conn: &mut SqliteConnection, entry_id: i64) -> Result<Option<SyncLedgerEntry>> {
        remote_database_syncs
            .find(entry_id)
            .select(SyncLedgerEntryDB::as_select())
            .first::<SyncLedgerEntryDB>(conn)
            .optional()
            .map_err(StorageError::from)?
            .map(SyncLedgerEntry::try_from)
            .transpose()
    }

    fn latest_matching(
        &self,
        table: &str,
        statuses: &[SyncStatus],
    ) -> Result<Option<SyncLedgerEntry>> {
        let mut conn = get_connection(&self.pool)?;
        let wanted: Vec<&str> = statuses.iter().map(SyncStatus::as_str).collect();
        remote_database_syncs
            .filter(table_name.eq(table))
            .filter(status.eq_any(wanted))
            .order(id.desc())
            .select(SyncLedgerEntryDB::as_select())
            .first::<SyncLedgerEntryDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(SyncLedgerEntry::try_from)
            .transpose()
    }
}

#[async_trait]
impl SyncLedgerRepositoryTrait for SyncLedgerRepository {
    async fn create(&self, new_entry: NewSyncLedgerEntry) -> Result<SyncLedgerEntry> {
        let now = to_db_timestamp(Utc::now());
        let new_entry_db = NewSyncLedgerEntryDB::from_domain(new_entry, &now)?;

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<SyncLedgerEntry> {
                let created = diesel::insert_into(remote_database_syncs::table)
                    .values(&new_entry_db)
                    .returning(SyncLedgerEntryDB::as_returning())
                    .get_result(conn)
                    .map_err(StorageError::from)?;
                SyncLedgerEntry::try_from(created)
            })
            .await
    }

    fn get_by_id(&self, entry_id: i64) -> Result<Option<SyncLedgerEntry>> {
        let mut conn = get_connection(&self.pool)?;
        Self::load_one(&mut conn, entry_id)
    }

    fn list(&self, query: &LedgerQuery) -> Result<Vec<SyncLedgerEntry>> {
        let mut conn = get_connection(&self.pool)?;
        let mut q = remote_database_syncs.into_boxed();

        if let Some(table) = &query.table_name {
            q = q.filter(table_name.eq(table.clone()));
        }
        if let Some(wanted) = query.status {
            q = q.filter(status.eq(wanted.as_str()));
        }
        if let Some(since) = query.since {
            q = q.filter(created_at.ge(to_db_timestamp(since)));
        }
        let limit = query
            .limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT);

        q.order(id.desc())
            .limit(limit)
            .select(SyncLedgerEntryDB::as_select())
            .load::<SyncLedgerEntryDB>(&mut conn)
            .map_err(StorageError::from)?
            .into_iter()
            .map(SyncLedgerEntry::try_from)
            .collect()
    }

    fn latest_for_table(&self, table: &str) -> Result<Option<SyncLedgerEntry>> {
        self.latest_matching(
            table,
            &[
                SyncStatus::Pending,
                SyncStatus::Processing,
                SyncStatus::Completed,
                SyncStatus::Failed,
                SyncStatus::Paused,
            ],
        )
    }

    fn latest_terminal_for_table(&self, table: &str) -> Result<Option<SyncLedgerEntry>> {
        self.latest_matching(table, &[SyncStatus::Completed, SyncStatus::Failed])
    }

    fn find_active_for_table(&self, table: &str) -> Result<Option<SyncLedgerEntry>> {
        self.latest_matching(table, &SyncStatus::ACTIVE)
    }

    async fn transition(
        &self,
        entry_id: i64,
        expected: SyncStatus,
        change: StatusChange,
    ) -> Result<Option<SyncLedgerEntry>> {
        let changeset = StatusChangeDB::from_domain(change, &to_db_timestamp(Utc::now()));

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<Option<SyncLedgerEntry>> {
                let affected = diesel::update(
                    remote_database_syncs
                        .filter(id.eq(entry_id))
                        .filter(status.eq(expected.as_str())),
                )
                .set(&changeset)
                .execute(conn)
                .map_err(StorageError::from)?;

                if affected == 0 {
                    return Ok(None);
                }
                Self::load_one(conn, entry_id)
            })
            .await
    }

    async fn apply_progress(&self, entry_id: i64, delta: ProgressDelta) -> Result<bool> {
        let now = to_db_timestamp(Utc::now());

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<bool> {
                let target = remote_database_syncs
                    .filter(id.eq(entry_id))
                    .filter(status.eq(SyncStatus::Processing.as_str()));

                let affected = diesel::update(target)
                    .set((
                        records_inserted.eq(records_inserted + delta.inserted),
                        records_updated.eq(records_updated + delta.updated),
                        records_skipped.eq(records_skipped + delta.skipped),
                        records_failed.eq(records_failed + delta.failed),
                        number_of_records_synced.eq(number_of_records_synced + delta.synced()),
                        updated_at.eq(now),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;

                if affected > 0 {
                    if let Some(text) = &delta.message {
                        diesel::update(remote_database_syncs.find(entry_id))
                            .set(message.eq(text.as_str()))
                            .execute(conn)
                            .map_err(StorageError::from)?;
                    }
                }
                Ok(affected > 0)
            })
            .await
    }

    async fn record_window(
        &self,
        entry_id: i64,
        total: Option<i64>,
        sample: Option<Value>,
    ) -> Result<()> {
        let now = to_db_timestamp(Utc::now());
        let sample = sample.map(|v| v.to_string());

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let target = remote_database_syncs
                    .filter(id.eq(entry_id))
                    .filter(status.eq(SyncStatus::Processing.as_str()));

                diesel::update(target)
                    .set((
                        total_records.eq(total),
                        remote_data.eq(sample),
                        updated_at.eq(now),
                    ))
                    .execute(conn)
                    .map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    fn statistics(&self, table: Option<&str>) -> Result<SyncStatistics> {
        let mut conn = get_connection(&self.pool)?;
        let table_filter = table.map(str::to_string);

        let row = diesel::sql_query(
            "SELECT COUNT(*) AS total_syncs, \
                    COALESCE(SUM(CASE WHEN status = 'completed' THEN 1 ELSE 0 END), 0) AS completed, \
                    COALESCE(SUM(CASE WHEN status = 'failed' THEN 1 ELSE 0 END), 0) AS failed, \
                    COALESCE(SUM(CASE WHEN status = 'processing' THEN 1 ELSE 0 END), 0) AS processing, \
                    COALESCE(SUM(number_of_records_synced), 0) AS total_records_synced \
             FROM remote_database_syncs \
             WHERE ?1 IS NULL OR table_name = ?1",
        )
        .bind::<Nullable<Text>, _>(table_filter)
        .get_result::<StatisticsRow>(&mut conn)
        .map_err(StorageError::from)?;

        let mut latest = remote_database_syncs
            .order(id.desc())
            .select(SyncLedgerEntryDB::as_select())
            .into_boxed();
        if let Some(t) = table {
            latest = latest.filter(table_name.eq(t.to_string()));
        }
        let latest_sync = latest
            .first::<SyncLedgerEntryDB>(&mut conn)
            .optional()
            .map_err(StorageError::from)?
            .map(SyncLedgerEntry::try_from)
            .transpose()?;

        Ok(SyncStatistics {
            total_syncs: row.total_syncs,
            completed: row.completed,
            failed: row.failed,
            processing: row.processing,
            total_records_synced: row.total_records_synced,
            latest_sync,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, run_migrations, spawn_writer};
    use records_sync_core::config::SyncConfig;
    use records_sync_core::errors::{DatabaseError, Error};
    use records_sync_core::ledger::SyncLedger;
    use serde_json::json;
    use tempfile::tempdir;

    async fn create_test_repository() -> (SyncLedgerRepository, tempfile::TempDir) {
        let temp_dir = tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let db_path_str = db_path.to_string_lossy().to_string();

        let pool = create_pool(&db_path_str).expect("Failed to create pool");
        run_migrations(&pool).expect("Failed to run migrations");
        let writer = spawn_writer((*pool).clone());

        (SyncLedgerRepository::new(Arc::clone(&pool), writer), temp_dir)
    }

    fn new_entry(table: &str, start: i64, limit: i64) -> NewSyncLedgerEntry {
        NewSyncLedgerEntry {
            table_name: table.to_string(),
            start_id: start,
            range_limit: limit,
            triggered_by: "tester".to_string(),
            sync_config: SyncConfig::default(),
        }
    }

    fn change(next: SyncStatus, text: &str) -> StatusChange {
        StatusChange {
            status: next,
            message: Some(text.to_string()),
            sync_started_at: Some(Utc::now()),
            sync_completed_at: None,
            last_synced_at: None,
            duration_seconds: None,
        }
    }

    #[tokio::test]
    async fn test_create_round_trips_entry() {
        let (repo, _temp_dir) = create_test_repository().await;

        let mut entry = new_entry("acad_results", 500, 250);
        entry.sync_config.range_limit = Some(250);
        entry
            .sync_config
            .field_map
            .insert("CreditUnits".to_string(), "credit_units".to_string());
        let created = repo.create(entry).await.unwrap();

        assert!(created.id > 0);
        assert_eq!(created.status, SyncStatus::Pending);
        assert_eq!(created.start_id, 500);
        assert_eq!(created.range_limit, 250);
        assert_eq!(created.number_of_records_synced, 0);
        assert_eq!(created.triggered_by.as_deref(), Some("tester"));
        assert_eq!(
            created.sync_config.field_map.get("CreditUnits").map(String::as_str),
            Some("credit_units")
        );

        let loaded = repo.get_by_id(created.id).unwrap().unwrap();
        assert_eq!(loaded, created);
        assert!(repo.get_by_id(created.id + 100).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_second_active_entry_is_rejected_by_index() {
        let (repo, _temp_dir) = create_test_repository().await;

        repo.create(new_entry("acad_results", 0, 100)).await.unwrap();
        let err = repo
            .create(new_entry("acad_results", 100, 100))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Database(DatabaseError::UniqueViolation(_))
        ));

        // Other tables are independent.
        repo.create(new_entry("students", 0, 100)).await.unwrap();
    }

    #[tokio::test]
    async fn test_transition_is_conditional_on_expected_status() {
        let (repo, _temp_dir) = create_test_repository().await;
        let entry = repo.create(new_entry("acad_results", 0, 100)).await.unwrap();

        let moved = repo
            .transition(entry.id, SyncStatus::Pending, change(SyncStatus::Processing, "go"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(moved.status, SyncStatus::Processing);
        assert_eq!(moved.message.as_deref(), Some("go"));
        assert!(moved.sync_started_at.is_some());

        // Stale expectation leaves the row untouched.
        let stale = repo
            .transition(entry.id, SyncStatus::Pending, change(SyncStatus::Failed, "nope"))
            .await
            .unwrap();
        assert!(stale.is_none());
        let current = repo.get_by_id(entry.id).unwrap().unwrap();
        assert_eq!(current.status, SyncStatus::Processing);
        assert_eq!(current.message.as_deref(), Some("go"));
    }

    #[tokio::test]
    async fn test_progress_only_applies_while_processing() {
        let (repo, _temp_dir) = create_test_repository().await;
        let entry = repo.create(new_entry("acad_results", 0, 100)).await.unwrap();

        let delta = ProgressDelta {
            inserted: 3,
            updated: 2,
            skipped: 4,
            failed: 1,
            message: Some("Processing... 10 records processed".to_string()),
        };
        assert!(!repo.apply_progress(entry.id, delta.clone()).await.unwrap());

        repo.transition(entry.id, SyncStatus::Pending, change(SyncStatus::Processing, "go"))
            .await
            .unwrap();
        assert!(repo.apply_progress(entry.id, delta.clone()).await.unwrap());
        assert!(repo.apply_progress(entry.id, delta).await.unwrap());

        let current = repo.get_by_id(entry.id).unwrap().unwrap();
        assert_eq!(current.records_inserted, 6);
        assert_eq!(current.records_updated, 4);
        assert_eq!(current.records_skipped, 8);
        assert_eq!(current.records_failed, 2);
        assert_eq!(current.number_of_records_synced, 10);
        assert_eq!(
            current.message.as_deref(),
            Some("Processing... 10 records processed")
        );
    }

    #[tokio::test]
    async fn test_record_window_stores_total_and_sample() {
        let (repo, _temp_dir) = create_test_repository().await;
        let entry = repo.create(new_entry("students", 0, 100)).await.unwrap();
        repo.transition(entry.id, SyncStatus::Pending, change(SyncStatus::Processing, "go"))
            .await
            .unwrap();

        repo.record_window(entry.id, Some(1200), Some(json!({"id": 1, "name": "Ada"})))
            .await
            .unwrap();

        let current = repo.get_by_id(entry.id).unwrap().unwrap();
        assert_eq!(current.total_records, Some(1200));
        assert_eq!(current.remote_data, Some(json!({"id": 1, "name": "Ada"})));
    }

    #[tokio::test]
    async fn test_record_window_leaves_terminal_entries_alone() {
        let (repo, _temp_dir) = create_test_repository().await;
        let entry = repo.create(new_entry("students", 0, 100)).await.unwrap();
        repo.transition(entry.id, SyncStatus::Pending, change(SyncStatus::Processing, "go"))
            .await
            .unwrap();
        repo.transition(
            entry.id,
            SyncStatus::Processing,
            change(SyncStatus::Failed, "Abandoned by operator"),
        )
        .await
        .unwrap();

        repo.record_window(entry.id, Some(1200), Some(json!({"id": 1})))
            .await
            .unwrap();

        let current = repo.get_by_id(entry.id).unwrap().unwrap();
        assert_eq!(current.status, SyncStatus::Failed);
        assert_eq!(current.total_records, None);
        assert_eq!(current.remote_data, None);
    }

    #[tokio::test]
    async fn test_latest_queries_and_list_filters() {
        let (repo, _temp_dir) = create_test_repository().await;

        let first = repo.create(new_entry("acad_results", 0, 100)).await.unwrap();
        repo.transition(first.id, SyncStatus::Pending, change(SyncStatus::Processing, "go"))
            .await
            .unwrap();
        repo.transition(first.id, SyncStatus::Processing, change(SyncStatus::Completed, "ok"))
            .await
            .unwrap();
        let second = repo.create(new_entry("acad_results", 100, 100)).await.unwrap();
        repo.create(new_entry("students", 0, 50)).await.unwrap();

        let terminal = repo.latest_terminal_for_table("acad_results").unwrap().unwrap();
        assert_eq!(terminal.id, first.id);
        let active = repo.find_active_for_table("acad_results").unwrap().unwrap();
        assert_eq!(active.id, second.id);
        assert_eq!(repo.latest_for_table("acad_results").unwrap().unwrap().id, second.id);
        assert!(repo.latest_terminal_for_table("students").unwrap().is_none());
        assert!(repo.latest_for_table("missing").unwrap().is_none());

        let all = repo.list(&LedgerQuery::default()).unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.windows(2).all(|w| w[0].id > w[1].id));

        let results = repo
            .list(&LedgerQuery {
                table_name: Some("acad_results".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(results.len(), 2);

        let completed = repo
            .list(&LedgerQuery {
                status: Some(SyncStatus::Completed),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(completed.len(), 1);
        assert_eq!(completed[0].id, first.id);

        let limited = repo
            .list(&LedgerQuery {
                limit: Some(1),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(limited.len(), 1);
    }

    #[tokio::test]
    async fn test_statistics_overall_and_per_table() {
        let (repo, _temp_dir) = create_test_repository().await;
        let ledger = SyncLedger::new(Arc::new(SyncLedgerRepository::new(
            Arc::clone(&repo.pool),
            repo.writer.clone(),
        )));

        let empty = repo.statistics(None).unwrap();
        assert_eq!(empty.total_syncs, 0);
        assert_eq!(empty.total_records_synced, 0);
        assert!(empty.latest_sync.is_none());

        let entry = ledger
            .create_entry("acad_results", 100, SyncConfig::default(), None)
            .await
            .unwrap();
        ledger.mark_started(entry.id).await.unwrap();
        ledger
            .apply_progress(
                entry.id,
                ProgressDelta {
                    inserted: 7,
                    updated: 3,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        ledger.mark_completed(entry.id, "done".to_string()).await.unwrap();

        let failed = ledger
            .create_entry("students", 100, SyncConfig::default(), Some("ops"))
            .await
            .unwrap();
        ledger.mark_failed(failed.id, "boom".to_string()).await.unwrap();

        let overall = repo.statistics(None).unwrap();
        assert_eq!(overall.total_syncs, 2);
        assert_eq!(overall.completed, 1);
        assert_eq!(overall.failed, 1);
        assert_eq!(overall.processing, 0);
        assert_eq!(overall.total_records_synced, 10);
        assert_eq!(overall.latest_sync.map(|e| e.id), Some(failed.id));

        let results = repo.statistics(Some("acad_results")).unwrap();
        assert_eq!(results.total_syncs, 1);
        assert_eq!(results.completed, 1);
        assert_eq!(results.latest_sync.map(|e| e.id), Some(entry.id));

        // Continuation advances past the completed window.
        assert_eq!(ledger.next_start_id("acad_results", None).unwrap(), 100);
    }
}
