//! Config-driven column copy for tables without built-in rules.

use super::coerce::apply_casts_and_defaults;
use super::transform_model::{LocalRow, TransformError};
use super::transform_traits::RowTransformer;
use crate::config::SyncConfig;
use crate::remote::RemoteRow;

#[derive(Debug, Clone)]
pub struct MappedTransformer {
    remote_key: String,
    natural_key: Vec<String>,
}

impl MappedTransformer {
    pub fn new(remote_key: impl Into<String>, natural_key: Vec<String>) -> Self {
        Self {
            remote_key: remote_key.into(),
            natural_key,
        }
    }

    /// Builds the transformer from `primary_key` and `local_key`. The local
    /// key defaults to the mapped name of the primary key.
    pub fn from_config(config: &SyncConfig) -> Option<Self> {
        let remote_key = config.primary_key.clone()?;
        let natural_key = config
            .local_key
            .clone()
            .unwrap_or_else(|| vec![config.local_name(&remote_key).to_string()]);
        Some(Self::new(remote_key, natural_key))
    }
}

impl RowTransformer for MappedTransformer {
    fn remote_key_column(&self) -> &str {
        &self.remote_key
    }

    fn natural_key(&self) -> Vec<String> {
        self.natural_key.clone()
    }

    fn transform(&self, row: &RemoteRow, config: &SyncConfig) -> Result<LocalRow, TransformError> {
        let mut local = LocalRow::new();
        for (column, value) in row.iter() {
            if config.is_skipped(column) {
                continue;
            }
            local.insert(config.local_name(column).to_string(), value.clone());
        }
        apply_casts_and_defaults(&mut local, config)?;
        Ok(local)
    }
}
