//! Batch Orchestrator - drives one sync run end to end.

mod sync_lock;
mod sync_model;
mod sync_service;
mod sync_traits;


pub use sync_lock::{TableLockGuard, TableLocks};
pub use sync_model::{CreateSyncRequest, SyncSettings};
pub use sync_service::SyncService;
pub use sync_traits::SyncServiceTrait;
