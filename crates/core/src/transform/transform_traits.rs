use super::transform_model::{LocalRow, TransformError};
use crate::config::SyncConfig;
use crate::remote::RemoteRow;

/// Maps a remote row to a local row for one table.
///
/// Implementations are deterministic: the same input and config always
/// produce the same output. No clock reads, no randomness.
pub trait RowTransformer: Send + Sync {
    /// Remote column the window is taken over, unless the config overrides it.
    fn remote_key_column(&self) -> &str;

    /// Local columns identifying a row for upsert.
    fn natural_key(&self) -> Vec<String>;

    fn transform(&self, row: &RemoteRow, config: &SyncConfig) -> Result<LocalRow, TransformError>;
}
