//! Helper functions for integration tests

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use command_center::{
    AlertId, AlertRecord, Service, ServiceId, ServiceStatus,
    config::SimulationConfig,
    seed::seed_if_empty,
    simulation::classify,
    storage::{
        AlertFilter, HealthStatus, MemoryBackend, NewAlert, NewService, ServiceMetricsUpdate,
        StorageBackend, StorageError, StorageResult,
    },
};

pub async fn seeded_memory_store() -> Arc<MemoryBackend> {
    let store = Arc::new(MemoryBackend::new());
    seed_if_empty(store.as_ref()).await.unwrap();
    store
}

pub fn test_config(alert_probability: f64, seed: u64) -> SimulationConfig {
    SimulationConfig {
        tick_interval_ms: 3_600_000,
        alert_probability,
        seed: Some(seed),
        tick_timeout_ms: None,
    }
}

pub fn fast_config(tick_interval_ms: u64) -> SimulationConfig {
    SimulationConfig {
        tick_interval_ms,
        ..test_config(0.5, 7)
    }
}

/// Half a storage decimal, plus float slack
const ROUNDING_WINDOW: f64 = 0.05 + 1e-9;

/// Whether `service.status` is the classification of some unrounded usage
/// that rounds to the stored cpu and memory values
pub fn status_within_rounding(service: &Service) -> bool {
    let (cpu, memory) = (service.cpu_usage, service.memory_usage);
    let low = classify(cpu - ROUNDING_WINDOW, memory - ROUNDING_WINDOW);
    let high = classify(cpu + ROUNDING_WINDOW, memory + ROUNDING_WINDOW);

    (low..=high).contains(&service.status)
}

/// Memory store with switchable faults
///
/// - `fail_reads`: `list_services` returns a query error
/// - `vanish`: ids removed from the store right after the next listing,
///   so the tick that loaded them writes to rows that no longer exist
/// - `list_delay`: `list_services` sleeps before answering
pub struct FaultyStore {
    pub inner: Arc<MemoryBackend>,
    pub fail_reads: AtomicBool,
    pub vanish: Mutex<HashSet<ServiceId>>,
    pub list_delay: Mutex<Option<Duration>>,
    pub list_calls: AtomicUsize,
}

impl FaultyStore {
    pub fn new(inner: Arc<MemoryBackend>) -> Self {
        Self {
            inner,
            fail_reads: AtomicBool::new(false),
            vanish: Mutex::new(HashSet::new()),
            list_delay: Mutex::new(None),
            list_calls: AtomicUsize::new(0),
        }
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_list_delay(&self, delay: Duration) {
        *self.list_delay.lock().unwrap() = Some(delay);
    }

    pub fn vanish_after_listing(&self, id: ServiceId) {
        self.vanish.lock().unwrap().insert(id);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StorageBackend for FaultyStore {
    async fn list_services(&self) -> StorageResult<Vec<Service>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self.list_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StorageError::QueryFailed("injected read failure".to_string()));
        }

        let services = self.inner.list_services().await?;

        let doomed: Vec<_> = self.vanish.lock().unwrap().drain().collect();
        for id in doomed {
            self.inner.remove_service(id).await;
        }

        Ok(services)
    }

    async fn get_service(&self, id: ServiceId) -> StorageResult<Option<Service>> {
        self.inner.get_service(id).await
    }

    async fn insert_service(&self, service: NewService) -> StorageResult<Service> {
        self.inner.insert_service(service).await
    }

    async fn update_service_metrics(
        &self,
        id: ServiceId,
        update: ServiceMetricsUpdate,
    ) -> StorageResult<()> {
        self.inner.update_service_metrics(id, update).await
    }

    async fn set_service_status(&self, id: ServiceId, status: ServiceStatus) -> StorageResult<()> {
        self.inner.set_service_status(id, status).await
    }

    async fn insert_alert(&self, alert: NewAlert) -> StorageResult<AlertRecord> {
        self.inner.insert_alert(alert).await
    }

    async fn query_alerts(&self, filter: AlertFilter) -> StorageResult<Vec<AlertRecord>> {
        self.inner.query_alerts(filter).await
    }

    async fn acknowledge_alert(&self, id: AlertId, actor: &str) -> StorageResult<AlertRecord> {
        self.inner.acknowledge_alert(id, actor).await
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        self.inner.health_check().await
    }

    async fn get_stats(&self) -> StorageResult<String> {
        self.inner.get_stats().await
    }

    async fn close(&self) -> StorageResult<()> {
        self.inner.close().await
    }
}
