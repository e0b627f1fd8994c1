use async_trait::async_trait;

use crate::errors::Result;
use crate::transform::{LocalRow, RowKey};

/// Row access to the local tables. The applier is its only writer.
#[async_trait]
pub trait LocalTableStore: Send + Sync {
    /// Stored values of the given columns for the row matching `key`.
    async fn find_row(&self, table: &str, key: &RowKey, columns: &[String])
        -> Result<Option<LocalRow>>;

    async fn insert_row(&self, table: &str, row: &LocalRow) -> Result<()>;

    /// Writes `changes` to the row matching `key`. Returns affected rows.
    async fn update_row(&self, table: &str, key: &RowKey, changes: &LocalRow) -> Result<usize>;
}
