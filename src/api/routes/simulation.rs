//! Simulation engine endpoints

use axum::{Json, extract::State};

use crate::api::{error::ApiResult, state::ApiState, types::SimulationStatsResponse};
use crate::simulation::TickReport;

/// GET /api/simulation/stats
///
/// Engine counters plus a one-line summary of the store
pub async fn get_stats(State(state): State<ApiState>) -> ApiResult<Json<SimulationStatsResponse>> {
    let stats = state.engine.get_stats().await;
    let storage = state.store.get_stats().await?;

    Ok(Json(SimulationStatsResponse {
        running: stats.is_some(),
        stats,
        storage,
    }))
}

/// POST /api/simulation/tick
///
/// Run one tick now and return its report
pub async fn tick_now(State(state): State<ApiState>) -> ApiResult<Json<TickReport>> {
    let report = state.engine.tick_now().await?;
    Ok(Json(report))
}
