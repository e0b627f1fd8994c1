//! In-process per-table run lock.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

/// Set of tables with a run in progress in this process.
#[derive(Clone, Default)]
pub struct TableLocks {
    held: Arc<Mutex<HashSet<String>>>,
}

impl TableLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn held(&self) -> MutexGuard<'_, HashSet<String>> {
        // The set stays consistent even if a holder panicked.
        self.held.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns a guard when `table` was free, `None` when already held.
    pub fn try_acquire(&self, table: &str) -> Option<TableLockGuard> {
        let mut held = self.held();
        if !held.insert(table.to_string()) {
            return None;
        }
        Some(TableLockGuard {
            locks: self.clone(),
            table: table.to_string(),
        })
    }

    pub fn is_held(&self, table: &str) -> bool {
        self.held().contains(table)
    }
}

/// RAII guard that releases the table lock when dropped.
pub struct TableLockGuard {
    locks: TableLocks,
    table: String,
}

impl Drop for TableLockGuard {
    fn drop(&mut self) {
        self.locks.held().remove(&self.table);
    }
}
