//! SQLite storage implementation for the Sync Ledger.

mod model;
mod repository;

pub use model::{NewSyncLedgerEntryDB, StatusChangeDB, SyncLedgerEntryDB};
pub use repository::SyncLedgerRepository;
