use std::sync::Arc;

use records_sync_core::remote::RemoteTableReader;
use records_sync_core::sync::{SyncService, SyncServiceTrait, SyncSettings};
use records_sync_remote_mysql::MySqlTableReader;
use records_sync_storage_sqlite::{
    create_pool, init, run_migrations, spawn_writer, LocalTableRepository, SyncLedgerRepository,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;

pub struct AppState {
    pub sync_service: Arc<dyn SyncServiceTrait>,
    pub db_path: String,
    pub remote_endpoint: String,
    pub settings: SyncSettings,
}

/// Installs the global subscriber. `RS_LOG_FORMAT=json` switches to JSON lines.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("RS_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let (json_layer, text_layer) = if json {
        (Some(fmt::layer().json().with_current_span(false)), None)
    } else {
        (
            None,
            Some(fmt::layer().with_target(true).with_line_number(true)),
        )
    };

    // try_init: tests build several states in one process.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .try_init();
}

pub async fn build_state(config: &Config) -> anyhow::Result<Arc<AppState>> {
    tracing::info!("Remote source: {:?}", config.remote);
    let reader: Arc<dyn RemoteTableReader> = Arc::new(MySqlTableReader::new(&config.remote));
    build_state_with_reader(config, reader, config.remote.endpoint()).await
}

/// Builds the state around an already constructed remote reader.
pub async fn build_state_with_reader(
    config: &Config,
    reader: Arc<dyn RemoteTableReader>,
    remote_endpoint: String,
) -> anyhow::Result<Arc<AppState>> {
    let db_path = init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);

    let pool = create_pool(&db_path)?;
    run_migrations(&pool)?;
    let writer = spawn_writer((*pool).clone());

    let ledger_repo = Arc::new(SyncLedgerRepository::new(pool.clone(), writer.clone()));
    let local_repo = Arc::new(LocalTableRepository::new(pool.clone(), writer));
    let sync_service = Arc::new(SyncService::new(
        ledger_repo,
        reader,
        local_repo,
        config.sync,
    ));

    Ok(Arc::new(AppState {
        sync_service,
        db_path,
        remote_endpoint,
        settings: config.sync,
    }))
}
