use chrono::{DateTime, Utc};
use records_sync_core::ledger::{LedgerQuery, StatusColor, SyncLedgerEntry, SyncStatus};
use serde::{Deserialize, Serialize};

/// Ledger entry plus the derived fields monitoring views display.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncEntryView {
    #[serde(flatten)]
    pub entry: SyncLedgerEntry,
    pub progress_percentage: f64,
    pub status_color: StatusColor,
    pub records_processed: i64,
}

impl From<SyncLedgerEntry> for SyncEntryView {
    fn from(entry: SyncLedgerEntry) -> Self {
        Self {
            progress_percentage: entry.progress_percentage(),
            status_color: entry.status_color(),
            records_processed: entry.records_processed(),
            entry,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSyncsQuery {
    pub table_name: Option<String>,
    pub status: Option<SyncStatus>,
    pub since: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

impl From<ListSyncsQuery> for LedgerQuery {
    fn from(q: ListSyncsQuery) -> Self {
        LedgerQuery {
            table_name: q.table_name,
            status: q.status,
            since: q.since,
            limit: q.limit,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsQuery {
    pub table_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AbandonRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteTablesResponse {
    pub endpoint: String,
    pub tables: Vec<String>,
}
