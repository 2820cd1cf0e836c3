//! API shared state

use std::sync::Arc;

use crate::simulation::SimulationHandle;
use crate::storage::StorageBackend;

/// Shared state passed to all API handlers
#[derive(Clone)]
pub struct ApiState {
    /// Store the simulator writes; handlers only read it, apart from the
    /// operator actions (acknowledge, status override)
    pub store: Arc<dyn StorageBackend>,

    /// Handle to the running simulation engine
    pub engine: SimulationHandle,
}

impl ApiState {
    pub fn new(store: Arc<dyn StorageBackend>, engine: SimulationHandle) -> Self {
        Self { store, engine }
    }
}
