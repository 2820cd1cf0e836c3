//! Metric simulation and derived state
//!
//! On every tick each service's cpu, memory and request metrics take one
//! bounded random step, the service status is re-derived from the new
//! values, and with a configurable probability one synthetic alert is
//! appended for a randomly chosen service.
//!
//! ## Components
//!
//! - [`walk`]: the bounded random walk for a single service
//! - [`classifier`]: pure status derivation from cpu and memory usage
//! - [`emitter`]: alert templates and persistence
//! - [`engine`]: the scheduled tick loop and its control handle
//! - [`random`]: injectable randomness (seeded ChaCha8 or a fixed sequence)

pub mod classifier;
pub mod emitter;
pub mod engine;
pub mod error;
pub mod messages;
pub mod random;
pub mod walk;

pub use classifier::classify;
pub use emitter::{ALERT_TEMPLATES, AlertEmitter, AlertTemplate};
pub use engine::{SimulationEngine, SimulationHandle};
pub use error::SimulationError;
pub use messages::{EngineStats, TickReport};
pub use random::{FixedSequence, RandomSource, SeededRandom};
pub use walk::{MetricDeltas, apply_deltas};
