//! Upsert classification models.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::transform::LocalRow;

/// Columns whose incoming value differs from the stored one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowDiff {
    changes: Map<String, Value>,
}

impl RowDiff {
    pub fn insert(&mut self, column: String, value: Value) {
        self.changes.insert(column, value);
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.changes.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.changes.iter()
    }

    pub fn into_row(self) -> LocalRow {
        LocalRow::from_map(self.changes)
    }
}

/// What the applier must do for one incoming row.
#[derive(Debug, Clone, PartialEq)]
pub enum UpsertPlan {
    Insert,
    Update(RowDiff),
    NoOp,
}

/// Classification of one processed row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "outcome", content = "message")]
pub enum RowOutcome {
    Inserted,
    Updated,
    Skipped,
    Failed(String),
}

impl RowOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, RowOutcome::Failed(_))
    }
}
