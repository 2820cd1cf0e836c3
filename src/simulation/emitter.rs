//! Synthetic alert generation
//!
//! Alerts are rendered from a fixed set of templates and appended to the
//! store. There is no de-duplication: the same template may fire for the
//! same service on consecutive ticks.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::storage::{NewAlert, StorageBackend, StorageResult};
use crate::{AlertRecord, Service, Severity};

/// Immutable recipe for one kind of alert
#[derive(Debug, Clone, Copy)]
pub struct AlertTemplate {
    /// Alert type (resource, performance, connectivity)
    pub kind: &'static str,
    pub severity: Severity,
    message: fn(&str) -> String,
}

impl AlertTemplate {
    pub const fn new(kind: &'static str, severity: Severity, message: fn(&str) -> String) -> Self {
        Self {
            kind,
            severity,
            message,
        }
    }

    /// Format the message for the service called `service_name`
    pub fn message(&self, service_name: &str) -> String {
        (self.message)(service_name)
    }

    /// Build the alert row for `service`
    pub fn render(&self, service: &Service) -> NewAlert {
        NewAlert {
            service_id: Some(service.id),
            kind: self.kind.to_string(),
            severity: self.severity,
            message: self.message(&service.name),
        }
    }
}

/// Templates the simulator chooses from
pub static ALERT_TEMPLATES: [AlertTemplate; 5] = [
    AlertTemplate::new("resource", Severity::Medium, |svc| {
        format!("{svc}: Memory usage elevated")
    }),
    AlertTemplate::new("performance", Severity::Medium, |svc| {
        format!("{svc}: P99 latency spike detected")
    }),
    AlertTemplate::new("connectivity", Severity::Low, |svc| {
        format!("{svc}: Connection pool utilization > 80%")
    }),
    AlertTemplate::new("performance", Severity::Medium, |svc| {
        format!("{svc}: Request queue depth increasing")
    }),
    AlertTemplate::new("resource", Severity::Low, |svc| {
        format!("{svc}: Disk I/O latency above baseline")
    }),
];

/// Appends rendered alerts to the store
#[derive(Clone)]
pub struct AlertEmitter {
    store: Arc<dyn StorageBackend>,
}

impl AlertEmitter {
    pub fn new(store: Arc<dyn StorageBackend>) -> Self {
        Self { store }
    }

    /// Render `template` for `service` and persist it unacknowledged
    #[instrument(skip_all, fields(service = %service.name, kind = template.kind))]
    pub async fn emit(
        &self,
        service: &Service,
        template: &AlertTemplate,
    ) -> StorageResult<AlertRecord> {
        let alert = self.store.insert_alert(template.render(service)).await?;
        debug!("emitted {} alert {}: {}", alert.severity, alert.id, alert.message);
        Ok(alert)
    }
}
