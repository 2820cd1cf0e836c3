//! Reference service inventory
//!
//! A fresh store is populated with twelve services so the dashboard has
//! something to show before the first tick.

use tracing::{debug, info, instrument};

use crate::ServiceStatus;
use crate::storage::{NewService, StorageBackend, StorageResult};

#[allow(clippy::too_many_arguments)]
fn service(
    name: &str,
    kind: &str,
    region: &str,
    status: ServiceStatus,
    uptime_percent: f64,
    cpu_usage: f64,
    memory_usage: f64,
    request_rate: i64,
    error_rate: f64,
    latency_p99: f64,
) -> NewService {
    NewService {
        name: name.to_string(),
        kind: kind.to_string(),
        region: region.to_string(),
        status,
        uptime_percent,
        cpu_usage,
        memory_usage,
        request_rate,
        error_rate,
        latency_p99,
    }
}

/// The twelve reference services, in insertion order
#[rustfmt::skip]
pub fn default_services() -> Vec<NewService> {
    use ServiceStatus::*;

    vec![
        service("PTT Gateway", "gateway", "us-east-1", Healthy, 99.97, 34.0, 52.0, 12_400, 0.02, 45.0),
        service("SIP Proxy Cluster", "proxy", "us-west-2", Healthy, 99.99, 28.0, 41.0, 8_900, 0.01, 32.0),
        service("UC Media Server", "media", "eu-west-1", Degraded, 98.50, 78.0, 85.0, 6_200, 1.20, 180.0),
        service("Voice Routing Engine", "core", "us-east-1", Healthy, 99.95, 45.0, 63.0, 15_600, 0.05, 55.0),
        service("Presence Service", "api", "ap-south-1", Healthy, 99.92, 22.0, 38.0, 4_300, 0.03, 28.0),
        service("Auth & Identity", "auth", "us-east-1", Healthy, 99.99, 15.0, 30.0, 9_800, 0.00, 18.0),
        service("Push Notification Hub", "messaging", "eu-central-1", Healthy, 99.88, 40.0, 55.0, 7_100, 0.08, 65.0),
        service("CDN Edge Cache", "cdn", "global", Healthy, 99.99, 12.0, 25.0, 45_000, 0.01, 8.0),
        service("PostgreSQL Primary", "database", "us-east-1", Healthy, 99.96, 55.0, 70.0, 3_200, 0.04, 42.0),
        service("Redis Session Store", "cache", "us-east-1", Warning, 99.80, 62.0, 88.0, 28_000, 0.10, 12.0),
        service("Kafka Event Bus", "streaming", "us-east-1", Healthy, 99.94, 48.0, 60.0, 18_000, 0.03, 22.0),
        service("Elasticsearch Logs", "search", "us-west-2", Healthy, 99.91, 52.0, 65.0, 5_400, 0.06, 95.0),
    ]
}

/// Insert the reference services unless the store already has services
///
/// Returns the number of services inserted.
#[instrument(skip_all)]
pub async fn seed_if_empty(store: &dyn StorageBackend) -> StorageResult<usize> {
    let existing = store.list_services().await?;
    if !existing.is_empty() {
        debug!("store already holds {} services, not seeding", existing.len());
        return Ok(0);
    }

    let services = default_services();
    let count = services.len();
    for service in services {
        store.insert_service(service).await?;
    }

    info!("seeded {} reference services", count);
    Ok(count)
}
