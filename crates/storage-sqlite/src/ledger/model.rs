//! Database models for the Sync Ledger.

use diesel::prelude::*;
use serde_json::Value;

use records_sync_core::config::SyncConfig;
use records_sync_core::errors::{DatabaseError, Error, Result};
use records_sync_core::ledger::{NewSyncLedgerEntry, StatusChange, SyncLedgerEntry, SyncStatus};

use crate::utils::{parse_db_timestamp, parse_opt_db_timestamp, to_db_timestamp};

/// Database model for a ledger entry
#[derive(Queryable, Identifiable, Selectable, PartialEq, Debug, Clone)]
#[diesel(table_name = crate::schema::remote_database_syncs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SyncLedgerEntryDB {
    pub id: i64,
    pub table_name: String,
    pub last_synced_at: Option<String>,
    pub start_id: i64,
    pub range_limit: i64,
    pub status: String,
    pub message: Option<String>,
    pub remote_data: Option<String>,
    pub number_of_records_synced: i64,
    pub total_records: Option<i64>,
    pub records_inserted: i64,
    pub records_updated: i64,
    pub records_skipped: i64,
    pub records_failed: i64,
    pub sync_started_at: Option<String>,
    pub sync_completed_at: Option<String>,
    pub duration_seconds: Option<i64>,
    pub triggered_by: Option<String>,
    pub sync_config: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Database model for inserting a pending entry
#[derive(Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::remote_database_syncs)]
pub struct NewSyncLedgerEntryDB {
    pub table_name: String,
    pub start_id: i64,
    pub range_limit: i64,
    pub status: String,
    pub triggered_by: Option<String>,
    pub sync_config: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// Changeset written with a status transition. `None` leaves a column as is.
#[derive(AsChangeset, Debug, Clone)]
#[diesel(table_name = crate::schema::remote_database_syncs)]
pub struct StatusChangeDB {
    pub status: String,
    pub message: Option<String>,
    pub sync_started_at: Option<String>,
    pub sync_completed_at: Option<String>,
    pub last_synced_at: Option<String>,
    pub duration_seconds: Option<i64>,
    pub updated_at: String,
}

impl TryFrom<SyncLedgerEntryDB> for SyncLedgerEntry {
    type Error = Error;

    fn try_from(db: SyncLedgerEntryDB) -> Result<Self> {
        let sync_config = match db.sync_config.as_deref() {
            Some(raw) if !raw.trim().is_empty() => {
                let value: Value = serde_json::from_str(raw).map_err(|e| {
                    Error::Database(DatabaseError::Internal(format!(
                        "Invalid sync_config on entry {}: {}",
                        db.id, e
                    )))
                })?;
                SyncConfig::from_json(&value)?
            }
            _ => SyncConfig::default(),
        };
        // remote_data is reference data only; an unreadable sample is dropped.
        let remote_data = db
            .remote_data
            .as_deref()
            .and_then(|raw| serde_json::from_str::<Value>(raw).ok());

        Ok(Self {
            id: db.id,
            table_name: db.table_name,
            last_synced_at: parse_opt_db_timestamp(db.last_synced_at)?,
            start_id: db.start_id,
            range_limit: db.range_limit,
            status: db.status.parse()?,
            message: db.message,
            remote_data,
            number_of_records_synced: db.number_of_records_synced,
            total_records: db.total_records,
            records_inserted: db.records_inserted,
            records_updated: db.records_updated,
            records_skipped: db.records_skipped,
            records_failed: db.records_failed,
            sync_started_at: parse_opt_db_timestamp(db.sync_started_at)?,
            sync_completed_at: parse_opt_db_timestamp(db.sync_completed_at)?,
            duration_seconds: db.duration_seconds,
            triggered_by: db.triggered_by,
            sync_config,
            created_at: parse_db_timestamp(&db.created_at)?,
            updated_at: parse_db_timestamp(&db.updated_at)?,
        })
    }
}

impl NewSyncLedgerEntryDB {
    pub fn from_domain(entry: NewSyncLedgerEntry, now: &str) -> Result<Self> {
        let config = entry.sync_config.to_json()?;
        Ok(Self {
            table_name: entry.table_name,
            start_id: entry.start_id,
            range_limit: entry.range_limit,
            status: SyncStatus::Pending.as_str().to_string(),
            triggered_by: Some(entry.triggered_by),
            sync_config: Some(config.to_string()),
            created_at: now.to_string(),
            updated_at: now.to_string(),
        })
    }
}

impl StatusChangeDB {
    pub fn from_domain(change: StatusChange, now: &str) -> Self {
        Self {
            status: change.status.as_str().to_string(),
            message: change.message,
            sync_started_at: change.sync_started_at.map(to_db_timestamp),
            sync_completed_at: change.sync_completed_at.map(to_db_timestamp),
            last_synced_at: change.last_synced_at.map(to_db_timestamp),
            duration_seconds: change.duration_seconds,
            updated_at: now.to_string(),
        }
    }
}
