//! Bounded random walk over service metrics
//!
//! Each tick moves every service by an independent uniform delta:
//!
//! | metric       | delta            | bounds after the step |
//! |--------------|------------------|-----------------------|
//! | cpu_usage    | U(-5, +5)        | [5, 95]               |
//! | memory_usage | U(-2.5, +2.5)    | [10, 95]              |
//! | request_rate | ⌊U(-250, +250)⌋  | >= 100                |
//!
//! The status is classified from the clamped values. Percentages are rounded
//! to one decimal only for storage, so a stored usage within 0.05 of a
//! threshold may sit on the other side of it from the stored status.

use super::classifier::classify;
use super::random::RandomSource;
use crate::Service;
use crate::storage::ServiceMetricsUpdate;
use crate::util::round_one_decimal;

pub const CPU_MIN: f64 = 5.0;
pub const CPU_MAX: f64 = 95.0;
pub const MEMORY_MIN: f64 = 10.0;
pub const MEMORY_MAX: f64 = 95.0;
pub const REQUEST_RATE_MIN: i64 = 100;

const CPU_SPAN: f64 = 10.0;
const MEMORY_SPAN: f64 = 5.0;
const REQUEST_SPAN: f64 = 500.0;

/// One step of the walk for a single service
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricDeltas {
    pub cpu: f64,
    pub memory: f64,
    pub requests: i64,
}

impl MetricDeltas {
    pub const ZERO: MetricDeltas = MetricDeltas {
        cpu: 0.0,
        memory: 0.0,
        requests: 0,
    };

    /// Draw cpu, memory and request deltas, in that order
    pub fn draw(rng: &mut dyn RandomSource) -> Self {
        let cpu = (rng.next_unit() - 0.5) * CPU_SPAN;
        let memory = (rng.next_unit() - 0.5) * MEMORY_SPAN;
        let requests = ((rng.next_unit() - 0.5) * REQUEST_SPAN).floor() as i64;

        Self {
            cpu,
            memory,
            requests,
        }
    }
}

/// Apply `deltas` to the current metrics of `service`
///
/// Clamps, classifies, then rounds. Pure: the previous status is ignored.
pub fn apply_deltas(service: &Service, deltas: MetricDeltas) -> ServiceMetricsUpdate {
    let cpu = (service.cpu_usage + deltas.cpu).clamp(CPU_MIN, CPU_MAX);
    let memory = (service.memory_usage + deltas.memory).clamp(MEMORY_MIN, MEMORY_MAX);
    let request_rate = service
        .request_rate
        .saturating_add(deltas.requests)
        .max(REQUEST_RATE_MIN);

    let status = classify(cpu, memory);

    ServiceMetricsUpdate {
        cpu_usage: round_one_decimal(cpu),
        memory_usage: round_one_decimal(memory),
        request_rate,
        status,
    }
}

/// Draw deltas from `rng` and apply them to `service`
pub fn step(service: &Service, rng: &mut dyn RandomSource) -> ServiceMetricsUpdate {
    apply_deltas(service, MetricDeltas::draw(rng))
}
