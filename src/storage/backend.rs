//! Storage backend trait definition
//!
//! This module defines the core `StorageBackend` trait that all
//! storage implementations must implement.

use async_trait::async_trait;

use super::error::StorageResult;
use super::schema::{AlertFilter, NewAlert, NewService, ServiceMetricsUpdate};
use crate::{AlertId, AlertRecord, Service, ServiceId, ServiceStatus};

/// Health status of the storage backend
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HealthStatus {
    /// Is the backend operational?
    pub healthy: bool,

    /// Human-readable status message
    pub message: String,

    /// Additional backend-specific metadata
    pub metadata: std::collections::HashMap<String, String>,
}

/// Shared store for services and alerts
///
/// The simulator mutates services and appends alerts through this trait;
/// the read API and the static export consume it. Implementations must be
/// `Send + Sync` as they are shared between the engine task and request
/// handlers.
///
/// ## Atomicity
///
/// Each write method is atomic on its own. No method spans several
/// services, and callers must not expect cross-service consistency.
///
/// ## Error Handling
///
/// Methods return `StorageResult<T>`. A write addressing a row that does
/// not exist returns `StorageError::NotFound`.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// All services, ordered by id
    async fn list_services(&self) -> StorageResult<Vec<Service>>;

    /// A single service, `None` if it does not exist
    async fn get_service(&self, id: ServiceId) -> StorageResult<Option<Service>>;

    /// Insert a service and return it with its assigned id
    async fn insert_service(&self, service: NewService) -> StorageResult<Service>;

    /// Overwrite the simulated metric columns of one service
    ///
    /// Also refreshes `last_check`. All columns change together or not at
    /// all.
    async fn update_service_metrics(
        &self,
        id: ServiceId,
        update: ServiceMetricsUpdate,
    ) -> StorageResult<()>;

    /// Manually override the status of a service
    async fn set_service_status(&self, id: ServiceId, status: ServiceStatus) -> StorageResult<()>;

    /// Append an alert and return the stored record
    async fn insert_alert(&self, alert: NewAlert) -> StorageResult<AlertRecord>;

    /// Alerts matching `filter`, newest first
    async fn query_alerts(&self, filter: AlertFilter) -> StorageResult<Vec<AlertRecord>>;

    /// Mark an alert as acknowledged by `actor`
    async fn acknowledge_alert(&self, id: AlertId, actor: &str) -> StorageResult<AlertRecord>;

    /// Check backend health
    ///
    /// Performs a lightweight operation to verify the backend
    /// is operational (e.g., ping database).
    async fn health_check(&self) -> StorageResult<HealthStatus>;

    /// Human-readable statistics (e.g. "SQLite: 12 services, 40 alerts")
    async fn get_stats(&self) -> StorageResult<String>;

    /// Close the backend and release resources
    async fn close(&self) -> StorageResult<()>;
}
