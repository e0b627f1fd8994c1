use std::sync::Arc;

use log::{debug, warn};
use serde_json::Value;

use super::apply_model::{RowDiff, RowOutcome, UpsertPlan};
use super::apply_traits::LocalTableStore;
use crate::transform::{LocalRow, RowKey};

/// Compares a stored value with an incoming one.
///
/// Numbers compare numerically (`1 == 1.0`). A number also equals numeric
/// text and a boolean equals 0/1, since SQLite column affinity rewrites both
/// on storage.
pub fn values_equal(stored: &Value, incoming: &Value) -> bool {
    match (stored, incoming) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => a.as_f64() == b.as_f64(),
        },
        (Value::Number(n), Value::String(s)) | (Value::String(s), Value::Number(n)) => s
            .trim()
            .parse::<f64>()
            .ok()
            .zip(n.as_f64())
            .is_some_and(|(x, y)| x == y),
        (Value::Number(n), Value::Bool(b)) | (Value::Bool(b), Value::Number(n)) => {
            n.as_f64() == Some(if *b { 1.0 } else { 0.0 })
        }
        _ => stored == incoming,
    }
}

/// Decides insert, update or no-op for `incoming` against the stored row.
/// Only columns present in `incoming` participate.
pub fn plan_upsert(existing: Option<&LocalRow>, incoming: &LocalRow) -> UpsertPlan {
    let Some(existing) = existing else {
        return UpsertPlan::Insert;
    };

    let mut diff = RowDiff::default();
    for (column, value) in incoming.iter() {
        let unchanged = existing
            .get(column)
            .is_some_and(|stored| values_equal(stored, value));
        if !unchanged {
            diff.insert(column.clone(), value.clone());
        }
    }

    if diff.is_empty() {
        UpsertPlan::NoOp
    } else {
        UpsertPlan::Update(diff)
    }
}

/// Applies one transformed row to its local table.
pub struct UpsertApplier {
    store: Arc<dyn LocalTableStore>,
}

impl UpsertApplier {
    pub fn new(store: Arc<dyn LocalTableStore>) -> Self {
        Self { store }
    }

    /// Never returns an error: store failures become `RowOutcome::Failed`.
    pub async fn apply(&self, table: &str, key: &RowKey, row: &LocalRow) -> RowOutcome {
        let columns: Vec<String> = row.columns().cloned().collect();
        let existing = match self.store.find_row(table, key, &columns).await {
            Ok(existing) => existing,
            Err(e) => return self.failed(table, key, e.to_string()),
        };

        match plan_upsert(existing.as_ref(), row) {
            UpsertPlan::Insert => match self.store.insert_row(table, row).await {
                Ok(()) => RowOutcome::Inserted,
                Err(e) => self.failed(table, key, e.to_string()),
            },
            UpsertPlan::Update(diff) => {
                debug!(
                    "Updating {} [{}]: {} column(s) changed",
                    table,
                    key,
                    diff.len()
                );
                match self.store.update_row(table, key, &diff.into_row()).await {
                    Ok(0) => self.failed(table, key, "row disappeared before update".to_string()),
                    Ok(_) => RowOutcome::Updated,
                    Err(e) => self.failed(table, key, e.to_string()),
                }
            }
            UpsertPlan::NoOp => RowOutcome::Skipped,
        }
    }

    fn failed(&self, table: &str, key: &RowKey, message: String) -> RowOutcome {
        warn!("Failed to apply {} [{}]: {}", table, key, message);
        RowOutcome::Failed(format!("{} [{}]: {}", table, key, message))
    }
}
