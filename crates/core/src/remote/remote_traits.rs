use async_trait::async_trait;

use super::remote_model::{RemoteConnectionStatus, RemoteRow};
use crate::errors::Result;

/// Read-only access to the remote source.
///
/// Implementations bound every query in time and report failures as
/// `Error::Remote`. Table and column names are validated identifiers.
#[async_trait]
pub trait RemoteTableReader: Send + Sync {
    /// Rows with `start_id <= key_column < start_id + limit`, ascending by
    /// key, at most `limit` rows.
    async fn fetch_window(
        &self,
        table: &str,
        key_column: &str,
        start_id: i64,
        limit: i64,
    ) -> Result<Vec<RemoteRow>>;

    async fn count_rows(&self, table: &str) -> Result<i64>;

    /// Never fails; a broken connection is reported in the status.
    async fn ping(&self) -> RemoteConnectionStatus;

    async fn list_tables(&self) -> Result<Vec<String>>;
}
