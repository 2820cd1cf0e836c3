//! Message types for engine communication
//!
//! Commands travel to the engine task over an mpsc channel; replies come
//! back over oneshot channels.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use super::error::SimulationError;
use crate::{AlertRecord, ServiceId};

/// Commands that can be sent to the engine task
#[derive(Debug)]
pub enum EngineCommand {
    /// Run one tick now, independent of the timer
    ///
    /// Subject to the same in-progress guard as timer ticks.
    TickNow {
        respond_to: oneshot::Sender<Result<TickReport, SimulationError>>,
    },

    /// Get engine statistics
    GetStats {
        respond_to: oneshot::Sender<EngineStats>,
    },

    /// Cancel the schedule and any in-flight tick, then exit
    Shutdown,
}

/// Outcome of one successful tick
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickReport {
    /// Services whose metrics were written
    pub updated: Vec<ServiceId>,

    /// Services that disappeared between load and write
    pub skipped: Vec<ServiceId>,

    /// Alert emitted by this tick, if the draw fired
    pub alert: Option<AlertRecord>,

    pub finished_at: DateTime<Utc>,
}

/// Running counters of the engine
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineStats {
    pub ticks_completed: u64,

    /// Ticks abandoned because of a store failure or timeout
    pub ticks_failed: u64,

    /// Ticks not started because the previous one was still running
    pub ticks_skipped: u64,

    pub services_updated: u64,

    pub alerts_emitted: u64,

    pub last_tick_at: Option<DateTime<Utc>>,

    pub last_error: Option<String>,
}
