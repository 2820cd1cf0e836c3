//! Alert endpoints

use axum::{
    Json,
    extract::{Path, Query, State},
};
use tracing::info;

use crate::AlertId;
use crate::api::{
    error::ApiResult,
    state::ApiState,
    types::{AcknowledgeRequest, AcknowledgeResponse, AlertsResponse},
};
use crate::storage::AlertFilter;

/// Recorded when the request does not name who acknowledged
pub const DEFAULT_ACKNOWLEDGER: &str = "operator";

/// GET /api/alerts?severity=&acknowledged=&service_id=&limit=
///
/// Alerts newest first, with counts over the returned set
pub async fn list_alerts(
    State(state): State<ApiState>,
    Query(filter): Query<AlertFilter>,
) -> ApiResult<Json<AlertsResponse>> {
    let response = AlertsResponse::load(state.store.as_ref(), filter).await?;
    Ok(Json(response))
}

/// PATCH /api/alerts/:id/acknowledge
///
/// An empty body is accepted and acknowledges as "operator".
pub async fn acknowledge_alert(
    State(state): State<ApiState>,
    Path(id): Path<AlertId>,
    body: Option<Json<AcknowledgeRequest>>,
) -> ApiResult<Json<AcknowledgeResponse>> {
    let actor = body
        .and_then(|Json(request)| request.acknowledged_by)
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ACKNOWLEDGER.to_string());

    let alert = state.store.acknowledge_alert(id, &actor).await?;
    info!("alert {} acknowledged by {}", id, actor);

    Ok(Json(AcknowledgeResponse {
        success: true,
        alert,
    }))
}
