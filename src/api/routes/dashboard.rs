//! Dashboard summary endpoint

use axum::{Json, extract::State};

use crate::api::{error::ApiResult, state::ApiState, types::DashboardResponse};

/// GET /api/dashboard
///
/// KPIs, every service, and the most recent unacknowledged alerts
pub async fn get_dashboard(State(state): State<ApiState>) -> ApiResult<Json<DashboardResponse>> {
    let dashboard = DashboardResponse::load(state.store.as_ref()).await?;
    Ok(Json(dashboard))
}
