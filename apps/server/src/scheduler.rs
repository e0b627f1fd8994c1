//! Background scheduler that runs one window per configured table on a fixed
//! interval.

use std::sync::Arc;

use records_sync_core::errors::{Error as CoreError, SyncError};
use records_sync_core::sync::CreateSyncRequest;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::main_lib::AppState;

/// Actor recorded on scheduled entries.
pub const SCHEDULER_ACTOR: &str = "Scheduler";

/// Initial delay before the first run so the server can finish starting.
const INITIAL_DELAY_SECS: u64 = 30;

/// Starts the scheduler. Does nothing when `tables` is empty.
pub fn start_sync_scheduler(state: Arc<AppState>, tables: Vec<String>, every: Duration) {
    if tables.is_empty() {
        debug!("Sync scheduler disabled: no scheduled tables");
        return;
    }

    tokio::spawn(async move {
        info!(
            "Sync scheduler started for {:?} ({}s interval)",
            tables,
            every.as_secs()
        );

        tokio::time::sleep(Duration::from_secs(INITIAL_DELAY_SECS)).await;

        let mut ticker = interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            run_scheduled_syncs(&state, &tables).await;
        }
    });
}

/// Runs one window for each table, in order.
pub async fn run_scheduled_syncs(state: &Arc<AppState>, tables: &[String]) {
    for table in tables {
        let request = CreateSyncRequest {
            table_name: table.clone(),
            triggered_by: Some(SCHEDULER_ACTOR.to_string()),
            ..Default::default()
        };

        match state.sync_service.start_sync(request).await {
            Ok(entry) => info!(
                "Scheduled sync of '{}' finished as {} (entry {}, {} rows)",
                table,
                entry.status,
                entry.id,
                entry.records_processed()
            ),
            Err(CoreError::Sync(SyncError::AlreadyActive(_))) => {
                debug!("Scheduled sync of '{}' skipped: already active", table)
            }
            Err(CoreError::Sync(SyncError::DecisionRequired { entry_id, .. })) => warn!(
                "Scheduled sync of '{}' paused: entry {} failed and needs an operator decision",
                table, entry_id
            ),
            Err(e) => warn!("Scheduled sync of '{}' failed: {}", table, e),
        }
    }
}
