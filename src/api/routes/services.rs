//! Service endpoints

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::info;

use crate::ServiceId;
use crate::api::{
    error::{ApiError, ApiResult},
    state::ApiState,
    types::{ServiceDetailResponse, ServicesResponse, StatusUpdateRequest, StatusUpdateResponse},
};

/// GET /api/services
///
/// All services, worst status first, with per-status counts
pub async fn list_services(State(state): State<ApiState>) -> ApiResult<Json<ServicesResponse>> {
    let response = ServicesResponse::load(state.store.as_ref()).await?;
    Ok(Json(response))
}

/// GET /api/services/:id
pub async fn get_service(
    State(state): State<ApiState>,
    Path(id): Path<ServiceId>,
) -> ApiResult<Json<ServiceDetailResponse>> {
    let response = ServiceDetailResponse::load(state.store.as_ref(), id).await?;
    Ok(Json(response))
}

/// PATCH /api/services/:id/status
///
/// Operator override. The next tick re-derives the status from metrics.
pub async fn set_status(
    State(state): State<ApiState>,
    Path(id): Path<ServiceId>,
    Json(body): Json<StatusUpdateRequest>,
) -> ApiResult<Json<StatusUpdateResponse>> {
    state.store.set_service_status(id, body.status).await?;
    info!("service {} status set to {} by operator", id, body.status);

    let service = state
        .store
        .get_service(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("service {id} not found")))?;

    Ok(Json(StatusUpdateResponse {
        success: true,
        service,
    }))
}
