//! SimulationEngine - drives the periodic metric walk
//!
//! The engine is an explicit object: construct it (configuration is checked
//! here), then `start()` it to obtain a [`SimulationHandle`]. Each engine
//! owns its own timer task, so several engines can run side by side, one
//! per test for instance.
//!
//! ## Tick Flow
//!
//! ```text
//! Timer tick ─┐
//! TickNow ────┴→ in-progress guard → load services → walk + classify each
//!                                                  → write each (atomic per service)
//!                                                  → maybe emit one alert
//! ```
//!
//! Ticks run in their own task so a slow store never delays the timer. A
//! tick that fires while the previous one is still running is skipped, not
//! queued. A failed tick is logged and counted; the schedule continues.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinSet;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument, trace, warn};

use super::emitter::{ALERT_TEMPLATES, AlertEmitter};
use super::error::SimulationError;
use super::messages::{EngineCommand, EngineStats, TickReport};
use super::random::{RandomSource, SeededRandom};
use super::walk;
use crate::Service;
use crate::config::SimulationConfig;
use crate::storage::{ServiceMetricsUpdate, StorageBackend};

/// Tick work shared between the timer task and in-flight ticks
struct Simulator {
    store: Arc<dyn StorageBackend>,
    emitter: AlertEmitter,
    rng: Mutex<Box<dyn RandomSource>>,
    alert_probability: f64,
    tick_timeout: Option<Duration>,
    in_progress: AtomicBool,
    stats: Mutex<EngineStats>,
}

/// Everything a tick decided before touching the store
struct TickPlan {
    updates: Vec<ServiceMetricsUpdate>,
    /// (service index, template index)
    alert: Option<(usize, usize)>,
}

/// Holds the in-progress flag for the duration of one tick
struct TickGuard<'a>(&'a AtomicBool);

impl<'a> TickGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Simulator {
    /// Draw all random numbers for one tick
    ///
    /// Per service: cpu, memory, requests. Then the alert draw, and on a hit
    /// the service pick and the template pick.
    fn plan(&self, services: &[Service]) -> TickPlan {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);

        let mut updates = Vec::with_capacity(services.len());
        for service in services {
            updates.push(walk::step(service, rng.as_mut()));
        }

        let fires = rng.next_unit() < self.alert_probability;
        let alert = (fires && !services.is_empty())
            .then(|| (rng.pick(services.len()), rng.pick(ALERT_TEMPLATES.len())));

        TickPlan { updates, alert }
    }

    #[instrument(skip(self))]
    async fn run_tick(&self) -> Result<TickReport, SimulationError> {
        let services = self.store.list_services().await?;
        trace!("loaded {} services", services.len());

        let plan = self.plan(&services);
        let mut report = TickReport::default();

        for (service, update) in services.iter().zip(plan.updates) {
            match self.store.update_service_metrics(service.id, update).await {
                Ok(()) => {
                    trace!(
                        "{}: cpu {} mem {} req {} → {}",
                        service.name,
                        update.cpu_usage,
                        update.memory_usage,
                        update.request_rate,
                        update.status
                    );
                    report.updated.push(service.id);
                }
                Err(e) if e.is_not_found() => {
                    warn!("service {} disappeared mid-tick, skipping", service.id);
                    report.skipped.push(service.id);
                }
                Err(e) => return Err(e.into()),
            }
        }

        if let Some((service_index, template_index)) = plan.alert {
            let alert = self
                .emitter
                .emit(&services[service_index], &ALERT_TEMPLATES[template_index])
                .await?;
            report.alert = Some(alert);
        }

        report.finished_at = Utc::now();
        Ok(report)
    }

    /// Run one tick unless another is in flight, bounded by the timeout
    async fn guarded_tick(&self) -> Result<TickReport, SimulationError> {
        let Some(_guard) = TickGuard::acquire(&self.in_progress) else {
            debug!("previous tick still running, skipping");
            self.record(|stats| stats.ticks_skipped += 1);
            return Err(SimulationError::TickInProgress);
        };

        let result = match self.tick_timeout {
            Some(limit) => time::timeout(limit, self.run_tick())
                .await
                .unwrap_or(Err(SimulationError::TickTimedOut(limit))),
            None => self.run_tick().await,
        };

        match &result {
            Ok(report) => {
                debug!(
                    "tick complete: {} updated, {} skipped, alert: {}",
                    report.updated.len(),
                    report.skipped.len(),
                    report.alert.is_some()
                );
                self.record(|stats| {
                    stats.ticks_completed += 1;
                    stats.services_updated += report.updated.len() as u64;
                    stats.alerts_emitted += u64::from(report.alert.is_some());
                    stats.last_tick_at = Some(report.finished_at);
                });
            }
            Err(e) => {
                error!("tick failed: {e}");
                let message = e.to_string();
                self.record(|stats| {
                    stats.ticks_failed += 1;
                    stats.last_error = Some(message);
                });
            }
        }

        result
    }

    fn record(&self, update: impl FnOnce(&mut EngineStats)) {
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        update(&mut stats);
    }

    fn snapshot(&self) -> EngineStats {
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// A configured, not yet scheduled simulation engine
pub struct SimulationEngine {
    config: SimulationConfig,
    simulator: Arc<Simulator>,
}

impl fmt::Debug for SimulationEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SimulationEngine {
    /// Create an engine drawing from a ChaCha8 generator
    ///
    /// Uses `config.seed` when set, otherwise a fresh seed which is logged
    /// so a run can be replayed.
    pub fn new(
        config: SimulationConfig,
        store: Arc<dyn StorageBackend>,
    ) -> Result<Self, SimulationError> {
        let rng = SeededRandom::from_optional_seed(config.seed);
        info!("simulation seed: {}", rng.seed());
        Self::with_random_source(config, store, Box::new(rng))
    }

    /// Create an engine drawing from `rng`
    ///
    /// Fails with [`SimulationError::InvalidConfig`] before anything is
    /// scheduled if `config` is unusable.
    pub fn with_random_source(
        config: SimulationConfig,
        store: Arc<dyn StorageBackend>,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self, SimulationError> {
        config.validate()?;

        let simulator = Simulator {
            emitter: AlertEmitter::new(store.clone()),
            store,
            rng: Mutex::new(rng),
            alert_probability: config.alert_probability,
            tick_timeout: config.tick_timeout(),
            in_progress: AtomicBool::new(false),
            stats: Mutex::new(EngineStats::default()),
        };

        Ok(Self {
            config,
            simulator: Arc::new(simulator),
        })
    }

    /// Run a single tick immediately, without a schedule
    pub async fn tick(&self) -> Result<TickReport, SimulationError> {
        self.simulator.guarded_tick().await
    }

    pub fn stats(&self) -> EngineStats {
        self.simulator.snapshot()
    }

    /// Spawn the timer task
    ///
    /// The first tick fires one full interval after start.
    pub fn start(self) -> SimulationHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = SimulationActor {
            simulator: self.simulator,
            command_rx: cmd_rx,
            tick_interval: self.config.tick_interval(),
            ticks: JoinSet::new(),
        };

        tokio::spawn(actor.run());

        SimulationHandle { sender: cmd_tx }
    }
}

/// Timer task owning the schedule
struct SimulationActor {
    simulator: Arc<Simulator>,
    command_rx: mpsc::Receiver<EngineCommand>,
    tick_interval: Duration,
    /// In-flight ticks; aborted on shutdown
    ticks: JoinSet<()>,
}

impl SimulationActor {
    #[instrument(skip(self), fields(interval_ms = self.tick_interval.as_millis() as u64))]
    async fn run(mut self) {
        info!("simulation engine started");

        let mut ticker = time::interval_at(Instant::now() + self.tick_interval, self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.spawn_tick(None);
                }

                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(EngineCommand::TickNow { respond_to }) => {
                            debug!("received TickNow command");
                            self.spawn_tick(Some(respond_to));
                        }

                        Some(EngineCommand::GetStats { respond_to }) => {
                            let _ = respond_to.send(self.simulator.snapshot());
                        }

                        Some(EngineCommand::Shutdown) => {
                            debug!("received shutdown command");
                            break;
                        }

                        None => {
                            warn!("all engine handles dropped, shutting down");
                            break;
                        }
                    }
                }

                Some(joined) = self.ticks.join_next() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            error!("tick task panicked: {e}");
                        }
                    }
                }
            }
        }

        self.ticks.abort_all();
        info!("simulation engine stopped");
    }

    fn spawn_tick(
        &mut self,
        respond_to: Option<oneshot::Sender<Result<TickReport, SimulationError>>>,
    ) {
        let simulator = self.simulator.clone();

        self.ticks.spawn(async move {
            let result = simulator.guarded_tick().await;
            if let Some(respond_to) = respond_to {
                let _ = respond_to.send(result);
            }
        });
    }
}

/// Handle for controlling a running engine
///
/// Cheap to clone. Dropping every handle stops the engine.
#[derive(Debug, Clone)]
pub struct SimulationHandle {
    sender: mpsc::Sender<EngineCommand>,
}

impl SimulationHandle {
    /// Run one tick now and wait for its report
    pub async fn tick_now(&self) -> Result<TickReport, SimulationError> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(EngineCommand::TickNow { respond_to: tx })
            .await
            .map_err(|_| SimulationError::EngineStopped)?;

        rx.await.map_err(|_| SimulationError::EngineStopped)?
    }

    /// Current counters, `None` once the engine has stopped
    pub async fn get_stats(&self) -> Option<EngineStats> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(EngineCommand::GetStats { respond_to: tx })
            .await
            .ok()?;

        rx.await.ok()
    }

    /// Cancel the schedule and wait for the engine task to exit
    ///
    /// Idempotent.
    pub async fn stop(&self) {
        if self.sender.send(EngineCommand::Shutdown).await.is_ok() {
            self.sender.closed().await;
        }
    }

    pub fn is_running(&self) -> bool {
        !self.sender.is_closed()
    }
}
