//! Health check endpoint

use axum::{Json, extract::State};

use crate::api::{error::ApiResult, state::ApiState, types::HealthResponse};

/// GET /api/health
///
/// Reports "ok" while the store answers its health check, "degraded" otherwise
pub async fn health_check(State(state): State<ApiState>) -> ApiResult<Json<HealthResponse>> {
    let storage = state.store.health_check().await?;

    Ok(Json(HealthResponse {
        status: if storage.healthy { "ok" } else { "degraded" }.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        storage,
    }))
}
