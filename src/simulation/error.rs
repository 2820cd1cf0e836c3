//! Error types for the simulation engine

use std::fmt;
use std::time::Duration;

use crate::storage::StorageError;

/// Errors raised while configuring or running the simulator
#[derive(Debug)]
pub enum SimulationError {
    /// Rejected at construction, before any tick is scheduled
    InvalidConfig(String),

    /// The store failed during a tick; the tick is abandoned
    Storage(StorageError),

    /// A tick did not finish within the configured bound
    TickTimedOut(Duration),

    /// The previous tick is still running; this one was skipped
    TickInProgress,

    /// The engine task is no longer running
    EngineStopped,
}

impl fmt::Display for SimulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimulationError::InvalidConfig(msg) => {
                write!(f, "invalid simulation configuration: {}", msg)
            }
            SimulationError::Storage(err) => write!(f, "store access failed during tick: {}", err),
            SimulationError::TickTimedOut(after) => {
                write!(f, "tick did not complete within {} ms", after.as_millis())
            }
            SimulationError::TickInProgress => {
                write!(f, "previous tick still in progress, tick skipped")
            }
            SimulationError::EngineStopped => write!(f, "simulation engine is not running"),
        }
    }
}

impl std::error::Error for SimulationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimulationError::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StorageError> for SimulationError {
    fn from(err: StorageError) -> Self {
        SimulationError::Storage(err)
    }
}
