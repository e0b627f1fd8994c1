//! Ledger and run endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use records_sync_core::errors::{Error as CoreError, SyncError};
use records_sync_core::ledger::{LedgerQuery, SyncStatistics, SyncStatus};
use records_sync_core::sync::CreateSyncRequest;
use tracing::{info, warn};

use crate::{
    error::{ApiError, ApiResult},
    main_lib::AppState,
    models::{AbandonRequest, ListSyncsQuery, StatisticsQuery, SyncEntryView},
};

async fn list_syncs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListSyncsQuery>,
) -> ApiResult<Json<Vec<SyncEntryView>>> {
    let query = LedgerQuery::from(query);
    let entries = state.sync_service.list_entries(&query)?;
    Ok(Json(entries.into_iter().map(SyncEntryView::from).collect()))
}

/// Records a pending entry without running it.
async fn create_sync(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateSyncRequest>,
) -> ApiResult<(StatusCode, Json<SyncEntryView>)> {
    let entry = state.sync_service.create_entry(request).await?;
    info!(
        "Created sync entry {} for '{}' (start_id={})",
        entry.id, entry.table_name, entry.start_id
    );
    Ok((StatusCode::CREATED, Json(entry.into())))
}

/// Creates an entry and runs it before responding. The run is a spawned task;
/// a timed out or dropped request does not cancel it.
async fn run_sync(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateSyncRequest>,
) -> ApiResult<Json<SyncEntryView>> {
    let service = state.sync_service.clone();
    let entry = tokio::spawn(async move { service.start_sync(request).await })
        .await
        .map_err(|e| ApiError::Internal(format!("Sync run aborted: {}", e)))??;
    Ok(Json(entry.into()))
}

async fn get_statistics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatisticsQuery>,
) -> ApiResult<Json<SyncStatistics>> {
    let stats = state.sync_service.statistics(query.table_name.as_deref())?;
    Ok(Json(stats))
}

async fn get_sync(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<Json<SyncEntryView>> {
    let entry = state.sync_service.get_entry(id)?;
    Ok(Json(entry.into()))
}

/// Hands a pending entry to a background worker and returns immediately.
async fn process_sync(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> ApiResult<(StatusCode, Json<SyncEntryView>)> {
    let entry = state.sync_service.get_entry(id)?;
    if entry.status != SyncStatus::Pending {
        return Err(CoreError::from(SyncError::InvalidTransition {
            id,
            from: entry.status,
            to: SyncStatus::Processing,
        })
        .into());
    }

    let service = state.sync_service.clone();
    tokio::spawn(async move {
        match service.process_entry(id).await {
            Ok(done) => info!("Background sync entry {} finished as {}", id, done.status),
            Err(e) => warn!("Background sync entry {} could not run: {}", id, e),
        }
    });

    Ok((StatusCode::ACCEPTED, Json(entry.into())))
}

async fn abandon_sync(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    body: Option<Json<AbandonRequest>>,
) -> ApiResult<Json<SyncEntryView>> {
    let reason = body.and_then(|Json(b)| b.reason).unwrap_or_default();
    let entry = state.sync_service.abandon_entry(id, reason).await?;
    Ok(Json(entry.into()))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/syncs", get(list_syncs).post(create_sync))
        .route("/syncs/run", post(run_sync))
        .route("/syncs/statistics", get(get_statistics))
        .route("/syncs/{id}", get(get_sync))
        .route("/syncs/{id}/process", post(process_sync))
        .route("/syncs/{id}/abandon", post(abandon_sync))
}
