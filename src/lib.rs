pub mod api;
pub mod config;
pub mod export;
pub mod seed;
pub mod simulation;
pub mod storage;
pub mod util;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier of a monitored service
pub type ServiceId = i64;

/// Opaque identifier of an alert record
pub type AlertId = i64;

/// A simulated service whose health metrics drift over time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    /// Service type (gateway, proxy, database, ...)
    #[serde(rename = "type")]
    pub kind: String,
    pub region: String,
    pub status: ServiceStatus,
    pub uptime_percent: f64,
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub request_rate: i64,
    pub error_rate: f64,
    pub latency_p99: f64,
    /// Refreshed on every simulator write; stale values mean the engine stalled
    pub last_check: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Derived health classification of a service
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Warning,
    Degraded,
    Down,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Healthy => "healthy",
            ServiceStatus::Warning => "warning",
            ServiceStatus::Degraded => "degraded",
            ServiceStatus::Down => "down",
        }
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ServiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "healthy" => Ok(ServiceStatus::Healthy),
            "warning" => Ok(ServiceStatus::Warning),
            "degraded" => Ok(ServiceStatus::Degraded),
            "down" => Ok(ServiceStatus::Down),
            other => Err(format!("unknown service status: {other}")),
        }
    }
}

/// Alert severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            other => Err(format!("unknown severity: {other}")),
        }
    }
}

/// A persisted alert
///
/// `service_id` is a weak reference: the service may be renamed or removed
/// without touching its alerts. `service_name` is resolved at read time and
/// is `None` when the service no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: AlertId,
    pub service_id: Option<ServiceId>,
    pub service_name: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub severity: Severity,
    pub message: String,
    pub acknowledged: bool,
    pub acknowledged_by: Option<String>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
