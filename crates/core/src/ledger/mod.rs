//! Sync Ledger - run records, status lifecycle and continuation.

mod ledger_model;
mod ledger_service;
mod ledger_traits;

#[cfg(test)]
pub(crate) mod tests;

pub use ledger_model::{
    LedgerQuery, NewSyncLedgerEntry, ProgressDelta, StatusChange, StatusColor, SyncLedgerEntry,
    SyncStatistics, SyncStatus,
};
pub use ledger_service::SyncLedger;
pub use ledger_traits::SyncLedgerRepositoryTrait;
