//! Write-side row types and query filters
//!
//! Reads return the domain types from the crate root ([`crate::Service`],
//! [`crate::AlertRecord`]). Writes go through the narrower structs below so
//! that every caller states exactly which columns it touches:
//!
//! - [`NewService`] - full insert, used by seeding
//! - [`ServiceMetricsUpdate`] - the only columns the simulator writes
//! - [`NewAlert`] - alert insert; acknowledgement columns start empty

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, de};

use crate::{AlertRecord, ServiceId, ServiceStatus, Severity};

/// A service to be inserted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewService {
    pub name: String,
    pub kind: String,
    pub region: String,
    pub status: ServiceStatus,
    pub uptime_percent: f64,
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub request_rate: i64,
    pub error_rate: f64,
    pub latency_p99: f64,
}

/// The metric columns written by one simulator step
///
/// Applied as a single statement so readers never observe the cpu value of
/// one step next to the status of another. `last_check` is set by the
/// backend at write time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServiceMetricsUpdate {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    pub request_rate: i64,
    pub status: ServiceStatus,
}

/// An alert to be inserted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAlert {
    pub service_id: Option<ServiceId>,
    pub kind: String,
    pub severity: Severity,
    pub message: String,
}

/// Filter for alert queries
///
/// Every field is optional; an empty filter selects all alerts.
/// `acknowledged` also accepts `0` and `1`, as the dashboard sends them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AlertFilter {
    pub severity: Option<Severity>,
    #[serde(default, deserialize_with = "flag")]
    pub acknowledged: Option<bool>,
    pub service_id: Option<ServiceId>,
    pub limit: Option<usize>,
}

impl AlertFilter {
    pub fn unacknowledged() -> Self {
        Self {
            acknowledged: Some(false),
            ..Default::default()
        }
    }

    pub fn for_service(service_id: ServiceId) -> Self {
        Self {
            service_id: Some(service_id),
            ..Default::default()
        }
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `alert` passes the filter (ignores `limit`)
    pub fn matches(&self, alert: &AlertRecord) -> bool {
        self.severity.is_none_or(|s| alert.severity == s)
            && self.acknowledged.is_none_or(|a| alert.acknowledged == a)
            && self
                .service_id
                .is_none_or(|id| alert.service_id == Some(id))
    }
}

struct FlagVisitor;

impl<'de> de::Visitor<'de> for FlagVisitor {
    type Value = Option<bool>;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("true, false, 1 or 0")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(Some(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        match v {
            0 => Ok(Some(false)),
            1 => Ok(Some(true)),
            _ => Err(E::invalid_value(de::Unexpected::Unsigned(v), &self)),
        }
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        match u64::try_from(v) {
            Ok(v) => self.visit_u64(v),
            Err(_) => Err(E::invalid_value(de::Unexpected::Signed(v), &self)),
        }
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        match v {
            "true" | "1" => Ok(Some(true)),
            "false" | "0" => Ok(Some(false)),
            "" => Ok(None),
            _ => Err(E::invalid_value(de::Unexpected::Str(v), &self)),
        }
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<bool>, D::Error> {
    deserializer.deserialize_any(FlagVisitor)
}
