use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use records_sync_core::remote::RemoteConnectionStatus;

use crate::{error::ApiResult, main_lib::AppState, models::RemoteTablesResponse};

async fn test_connection(State(state): State<Arc<AppState>>) -> Json<RemoteConnectionStatus> {
    let status = state.sync_service.test_remote_connection().await;
    if !status.success {
        tracing::warn!(
            "Remote connection test against {} failed: {}",
            state.remote_endpoint,
            status.message
        );
    }
    Json(status)
}

async fn list_tables(State(state): State<Arc<AppState>>) -> ApiResult<Json<RemoteTablesResponse>> {
    let tables = state.sync_service.list_remote_tables().await?;
    Ok(Json(RemoteTablesResponse {
        endpoint: state.remote_endpoint.clone(),
        tables,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/remote/connection", get(test_connection))
        .route("/remote/tables", get(list_tables))
}
