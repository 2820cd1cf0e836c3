//! Shared API response types
//!
//! This module contains the response types of the read API together with
//! the queries that build them. The static export writes the very same
//! types, so the JSON files and the HTTP responses cannot drift apart.

use serde::{Deserialize, Serialize};

use crate::simulation::EngineStats;
use crate::storage::{AlertFilter, HealthStatus, StorageBackend, StorageError, StorageResult};
use crate::{AlertRecord, Service, ServiceId, ServiceStatus, Severity};

/// Unacknowledged alerts shown on the dashboard
pub const DASHBOARD_ALERT_LIMIT: usize = 8;

/// Alerts shown on the service detail view
pub const SERVICE_ALERT_LIMIT: usize = 10;

// ============================================================================
// Summaries
// ============================================================================

/// Headline numbers of the dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardKpis {
    pub services_healthy: usize,
    pub services_total: usize,
    pub unacked_alerts: usize,
}

/// Service count per status
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServiceSummary {
    pub total: usize,
    pub healthy: usize,
    pub warning: usize,
    pub degraded: usize,
    pub down: usize,
}

impl ServiceSummary {
    pub fn from_services(services: &[Service]) -> Self {
        let mut summary = Self {
            total: services.len(),
            ..Default::default()
        };

        for service in services {
            match service.status {
                ServiceStatus::Healthy => summary.healthy += 1,
                ServiceStatus::Warning => summary.warning += 1,
                ServiceStatus::Degraded => summary.degraded += 1,
                ServiceStatus::Down => summary.down += 1,
            }
        }

        summary
    }
}

/// Counts over an alert listing
///
/// `critical` and `high` only count unacknowledged alerts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertSummary {
    pub total: usize,
    pub unacknowledged: usize,
    pub critical: usize,
    pub high: usize,
}

impl AlertSummary {
    pub fn from_alerts(alerts: &[AlertRecord]) -> Self {
        let open = || alerts.iter().filter(|a| !a.acknowledged);

        Self {
            total: alerts.len(),
            unacknowledged: open().count(),
            critical: open().filter(|a| a.severity == Severity::Critical).count(),
            high: open().filter(|a| a.severity == Severity::High).count(),
        }
    }
}

// ============================================================================
// API Response Types
// ============================================================================

/// Response for GET /api/health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub storage: HealthStatus,
}

/// Response for GET /api/dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardResponse {
    pub kpis: DashboardKpis,
    pub services: Vec<Service>,
    #[serde(rename = "recentAlerts")]
    pub recent_alerts: Vec<AlertRecord>,
}

impl DashboardResponse {
    pub async fn load(store: &dyn StorageBackend) -> StorageResult<Self> {
        let services = store.list_services().await?;
        let unacked = store.query_alerts(AlertFilter::unacknowledged()).await?;

        let kpis = DashboardKpis {
            services_healthy: services
                .iter()
                .filter(|s| s.status == ServiceStatus::Healthy)
                .count(),
            services_total: services.len(),
            unacked_alerts: unacked.len(),
        };

        let recent_alerts = unacked.into_iter().take(DASHBOARD_ALERT_LIMIT).collect();

        Ok(Self {
            kpis,
            services,
            recent_alerts,
        })
    }
}

/// Response for GET /api/services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServicesResponse {
    pub services: Vec<Service>,
    pub summary: ServiceSummary,
}

impl ServicesResponse {
    /// Services ordered worst status first, then by name
    pub async fn load(store: &dyn StorageBackend) -> StorageResult<Self> {
        let mut services = store.list_services().await?;
        services.sort_by(|a, b| b.status.cmp(&a.status).then_with(|| a.name.cmp(&b.name)));

        let summary = ServiceSummary::from_services(&services);
        Ok(Self { services, summary })
    }
}

/// Response for GET /api/services/:id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDetailResponse {
    pub service: Service,
    pub alerts: Vec<AlertRecord>,
}

impl ServiceDetailResponse {
    pub async fn load(store: &dyn StorageBackend, id: ServiceId) -> StorageResult<Self> {
        let service = store
            .get_service(id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("service {id}")))?;

        let alerts = store
            .query_alerts(AlertFilter::for_service(id).with_limit(SERVICE_ALERT_LIMIT))
            .await?;

        Ok(Self { service, alerts })
    }
}

/// Response for GET /api/alerts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertsResponse {
    pub alerts: Vec<AlertRecord>,
    pub summary: AlertSummary,
}

impl AlertsResponse {
    pub async fn load(store: &dyn StorageBackend, filter: AlertFilter) -> StorageResult<Self> {
        let alerts = store.query_alerts(filter).await?;
        let summary = AlertSummary::from_alerts(&alerts);
        Ok(Self { alerts, summary })
    }
}

/// Body of PATCH /api/services/:id/status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: ServiceStatus,
}

/// Response for PATCH /api/services/:id/status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateResponse {
    pub success: bool,
    pub service: Service,
}

/// Body of PATCH /api/alerts/:id/acknowledge
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AcknowledgeRequest {
    #[serde(default)]
    pub acknowledged_by: Option<String>,
}

/// Response for PATCH /api/alerts/:id/acknowledge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AcknowledgeResponse {
    pub success: bool,
    pub alert: AlertRecord,
}

/// Response for GET /api/simulation/stats
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationStatsResponse {
    pub running: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<EngineStats>,
    pub storage: String,
}
