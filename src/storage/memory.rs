//! In-memory storage backend (no persistence)
//!
//! This backend keeps services and alerts behind a single `RwLock`.
//! It's useful for:
//! - Testing without database dependencies
//! - Short-lived demo runs (`"backend": "none"`)
//!
//! ## Limitations
//!
//! - **No persistence**: All data lost on restart
//! - **Unbounded alerts**: alerts are never evicted, matching the SQLite backend

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use super::backend::{HealthStatus, StorageBackend};
use super::error::{StorageError, StorageResult};
use super::schema::{AlertFilter, NewAlert, NewService, ServiceMetricsUpdate};
use crate::{AlertId, AlertRecord, Service, ServiceId, ServiceStatus};

#[derive(Debug, Default)]
struct Tables {
    services: BTreeMap<ServiceId, Service>,
    alerts: Vec<AlertRecord>,
    next_service_id: ServiceId,
    next_alert_id: AlertId,
}

impl Tables {
    fn resolve_name(&self, mut alert: AlertRecord) -> AlertRecord {
        alert.service_name = alert
            .service_id
            .and_then(|id| self.services.get(&id))
            .map(|service| service.name.clone());
        alert
    }
}

/// In-memory storage backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: RwLock<Tables>,
}

impl MemoryBackend {
    /// Create a new, empty in-memory backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a service without touching its alerts
    ///
    /// Services are never deleted by the simulator; this exists so callers
    /// can exercise the weak service reference held by alerts.
    pub async fn remove_service(&self, id: ServiceId) -> Option<Service> {
        self.tables.write().await.services.remove(&id)
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn list_services(&self) -> StorageResult<Vec<Service>> {
        let tables = self.tables.read().await;
        Ok(tables.services.values().cloned().collect())
    }

    async fn get_service(&self, id: ServiceId) -> StorageResult<Option<Service>> {
        let tables = self.tables.read().await;
        Ok(tables.services.get(&id).cloned())
    }

    async fn insert_service(&self, service: NewService) -> StorageResult<Service> {
        let mut tables = self.tables.write().await;
        tables.next_service_id += 1;

        let now = Utc::now();
        let stored = Service {
            id: tables.next_service_id,
            name: service.name,
            kind: service.kind,
            region: service.region,
            status: service.status,
            uptime_percent: service.uptime_percent,
            cpu_usage: service.cpu_usage,
            memory_usage: service.memory_usage,
            request_rate: service.request_rate,
            error_rate: service.error_rate,
            latency_p99: service.latency_p99,
            last_check: now,
            created_at: now,
        };

        debug!("in-memory backend: inserted service {}", stored.id);
        tables.services.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update_service_metrics(
        &self,
        id: ServiceId,
        update: ServiceMetricsUpdate,
    ) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        let service = tables
            .services
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(format!("service {id}")))?;

        service.cpu_usage = update.cpu_usage;
        service.memory_usage = update.memory_usage;
        service.request_rate = update.request_rate;
        service.status = update.status;
        service.last_check = Utc::now();

        trace!("in-memory backend: updated metrics of service {id}");
        Ok(())
    }

    async fn set_service_status(&self, id: ServiceId, status: ServiceStatus) -> StorageResult<()> {
        let mut tables = self.tables.write().await;
        let service = tables
            .services
            .get_mut(&id)
            .ok_or_else(|| StorageError::NotFound(format!("service {id}")))?;

        service.status = status;
        service.last_check = Utc::now();
        Ok(())
    }

    async fn insert_alert(&self, alert: NewAlert) -> StorageResult<AlertRecord> {
        let mut tables = self.tables.write().await;
        tables.next_alert_id += 1;

        let record = AlertRecord {
            id: tables.next_alert_id,
            service_id: alert.service_id,
            service_name: None,
            kind: alert.kind,
            severity: alert.severity,
            message: alert.message,
            acknowledged: false,
            acknowledged_by: None,
            acknowledged_at: None,
            created_at: Utc::now(),
        };

        tables.alerts.push(record.clone());
        Ok(tables.resolve_name(record))
    }

    async fn query_alerts(&self, filter: AlertFilter) -> StorageResult<Vec<AlertRecord>> {
        let tables = self.tables.read().await;

        // Insertion order is creation order; newest first
        let alerts = tables
            .alerts
            .iter()
            .rev()
            .filter(|alert| filter.matches(alert))
            .take(filter.limit.unwrap_or(usize::MAX))
            .cloned()
            .map(|alert| tables.resolve_name(alert))
            .collect();

        Ok(alerts)
    }

    async fn acknowledge_alert(&self, id: AlertId, actor: &str) -> StorageResult<AlertRecord> {
        let mut tables = self.tables.write().await;
        let alert = tables
            .alerts
            .iter_mut()
            .find(|alert| alert.id == id)
            .ok_or_else(|| StorageError::NotFound(format!("alert {id}")))?;

        alert.acknowledged = true;
        alert.acknowledged_by = Some(actor.to_string());
        alert.acknowledged_at = Some(Utc::now());

        let alert = alert.clone();
        Ok(tables.resolve_name(alert))
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        let tables = self.tables.read().await;
        Ok(HealthStatus {
            healthy: true,
            message: "In-memory storage operational".to_string(),
            metadata: HashMap::from([
                ("backend".to_string(), "memory".to_string()),
                ("services".to_string(), tables.services.len().to_string()),
                ("alerts".to_string(), tables.alerts.len().to_string()),
            ]),
        })
    }

    async fn get_stats(&self) -> StorageResult<String> {
        let tables = self.tables.read().await;
        Ok(format!(
            "In-Memory: {} services, {} alerts",
            tables.services.len(),
            tables.alerts.len()
        ))
    }

    async fn close(&self) -> StorageResult<()> {
        debug!("closing in-memory backend (no-op)");
        Ok(())
    }
}
