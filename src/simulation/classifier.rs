//! Threshold classifier for service status
//!
//! A pure mapping from `(cpu%, memory%)` to a status. It never looks at the
//! previous status, so a service hovering around a threshold can flip
//! between two statuses on consecutive ticks.

use crate::ServiceStatus;

/// CPU usage above which a service is degraded
pub const CPU_DEGRADED: f64 = 85.0;

/// Memory usage above which a service is degraded
pub const MEMORY_DEGRADED: f64 = 90.0;

/// CPU usage above which a service is in warning
pub const CPU_WARNING: f64 = 70.0;

/// Memory usage above which a service is in warning
pub const MEMORY_WARNING: f64 = 80.0;

/// Classify a service from its current resource usage.
///
/// Rules are checked in order, first match wins:
///
/// ```text
/// cpu > 85 || mem > 90  → degraded
/// cpu > 70 || mem > 80  → warning
/// otherwise             → healthy
/// ```
///
/// The classifier never yields [`ServiceStatus::Down`]; that status is only
/// set manually.
pub fn classify(cpu_usage: f64, memory_usage: f64) -> ServiceStatus {
    if cpu_usage > CPU_DEGRADED || memory_usage > MEMORY_DEGRADED {
        ServiceStatus::Degraded
    } else if cpu_usage > CPU_WARNING || memory_usage > MEMORY_WARNING {
        ServiceStatus::Warning
    } else {
        ServiceStatus::Healthy
    }
}
