//! REST API for the command center dashboard
//!
//! This module provides HTTP endpoints over the shared store the simulator
//! writes, plus read access to the engine's counters.
//!
//! ## Architecture
//!
//! - **Axum** web framework with Tower middleware
//! - **Store handle** (`Arc<dyn StorageBackend>`) for reads and operator actions
//! - **Engine handle** for simulation statistics and on-demand ticks
//!
//! ## Endpoints
//!
//! - `GET /api/health` - Health check
//! - `GET /api/dashboard` - KPIs, services, recent unacknowledged alerts
//! - `GET /api/services` - List services with per-status summary
//! - `GET /api/services/:id` - Service detail with recent alerts
//! - `PATCH /api/services/:id/status` - Operator status override
//! - `GET /api/alerts` - Filterable alert listing with summary
//! - `PATCH /api/alerts/:id/acknowledge` - Acknowledge an alert
//! - `GET /api/simulation/stats` - Engine statistics
//! - `POST /api/simulation/tick` - Run one tick now
//!
//! The response types in [`types`] are always compiled; the static export
//! shares them. Everything else needs the `api` feature.

#[cfg(feature = "api")]
pub mod error;
#[cfg(feature = "api")]
pub mod routes;
#[cfg(feature = "api")]
pub mod state;
pub mod types;

#[cfg(feature = "api")]
pub use error::{ApiError, ApiResult};
#[cfg(feature = "api")]
pub use state::ApiState;
pub use types::{
    AlertSummary, AlertsResponse, DashboardKpis, DashboardResponse, HealthResponse,
    ServiceDetailResponse, ServiceSummary, ServicesResponse, SimulationStatsResponse,
};

#[cfg(feature = "api")]
use axum::{
    Router,
    routing::{get, patch, post},
};
use std::net::SocketAddr;

use crate::config::ApiSettings;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:4000")
    pub bind_addr: SocketAddr,

    /// Enable CORS for dashboard
    pub enable_cors: bool,
}

impl From<&ApiSettings> for ApiConfig {
    fn from(settings: &ApiSettings) -> Self {
        Self {
            bind_addr: settings.bind,
            enable_cors: settings.enable_cors,
        }
    }
}

/// Build the router with all routes
#[cfg(feature = "api")]
pub fn router(config: &ApiConfig, state: ApiState) -> Router {
    use tower::ServiceBuilder;
    use tower_http::cors::{Any, CorsLayer};
    use tower_http::trace::TraceLayer;

    let mut app = Router::new()
        .route("/api/health", get(routes::health::health_check))
        .route("/api/dashboard", get(routes::dashboard::get_dashboard))
        .route("/api/services", get(routes::services::list_services))
        .route("/api/services/:id", get(routes::services::get_service))
        .route(
            "/api/services/:id/status",
            patch(routes::services::set_status),
        )
        .route("/api/alerts", get(routes::alerts::list_alerts))
        .route(
            "/api/alerts/:id/acknowledge",
            patch(routes::alerts::acknowledge_alert),
        )
        .route("/api/simulation/stats", get(routes::simulation::get_stats))
        .route("/api/simulation/tick", post(routes::simulation::tick_now))
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    // Add CORS if enabled
    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    app
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task.
/// Returns the server's local address.
#[cfg(feature = "api")]
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    use tracing::info;

    info!("starting API server on {}", config.bind_addr);

    let app = router(&config, state);

    // Bind and serve
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    // Spawn server in background
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
