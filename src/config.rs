use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tracing::trace;

use crate::simulation::SimulationError;

/// Storage backend configuration
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// In-memory storage (no persistence)
    #[serde(rename = "none")]
    None,

    /// SQLite database (default)
    Sqlite {
        /// Path to the SQLite database file
        #[serde(default = "default_sqlite_path")]
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Sqlite {
            path: default_sqlite_path(),
        }
    }
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./commandcenter.db")
}

/// Parameters of the metric simulator
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct SimulationConfig {
    /// Period between two ticks in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Probability that a tick emits one alert
    #[serde(default = "default_alert_probability")]
    pub alert_probability: f64,

    /// Seed for the random source; entropy seeded when absent
    #[serde(default)]
    pub seed: Option<u64>,

    /// Upper bound for the work of a single tick
    #[serde(default)]
    pub tick_timeout_ms: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            alert_probability: default_alert_probability(),
            seed: None,
            tick_timeout_ms: None,
        }
    }
}

impl SimulationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn tick_timeout(&self) -> Option<Duration> {
        self.tick_timeout_ms.map(Duration::from_millis)
    }

    /// Reject parameters the engine cannot run with.
    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.tick_interval_ms == 0 {
            return Err(SimulationError::InvalidConfig(
                "tick_interval_ms must be greater than zero".to_string(),
            ));
        }

        if !self.alert_probability.is_finite() || !(0.0..=1.0).contains(&self.alert_probability)
        {
            return Err(SimulationError::InvalidConfig(format!(
                "alert_probability must be within [0, 1], got {}",
                self.alert_probability
            )));
        }

        if let Some(timeout) = self.tick_timeout_ms {
            if timeout == 0 || timeout >= self.tick_interval_ms {
                return Err(SimulationError::InvalidConfig(format!(
                    "tick_timeout_ms must be in (0, {}), got {timeout}",
                    self.tick_interval_ms
                )));
            }
        }

        Ok(())
    }
}

fn default_tick_interval_ms() -> u64 {
    30_000
}

fn default_alert_probability() -> f64 {
    0.2
}

/// HTTP read API configuration
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ApiSettings {
    #[serde(default = "crate::util::get_default_bind")]
    pub bind: SocketAddr,

    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            bind: crate::util::get_default_bind(),
            enable_cors: default_enable_cors(),
        }
    }
}

fn default_enable_cors() -> bool {
    true
}

#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct Config {
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Storage configuration (defaults to SQLite)
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiSettings,

    /// Insert the reference services when the store holds none
    #[serde(default = "default_seed_on_start")]
    pub seed_on_start: bool,
}

fn default_seed_on_start() -> bool {
    true
}

impl Config {
    /// Apply `PORT` and `COMMAND_CENTER_DB` from the environment.
    pub fn apply_env_overrides(mut self) -> Self {
        if let Some(port) = crate::util::get_port() {
            self.api.bind.set_port(port);
        }

        if let (Some(path), StorageConfig::Sqlite { .. }) =
            (crate::util::get_db_path(), &self.storage)
        {
            self.storage = StorageConfig::Sqlite { path };
        }

        self
    }
}

pub fn read_config_file(path: &str) -> anyhow::Result<Config> {
    let file_content = std::fs::read_to_string(path)?;
    serde_json::from_str(&file_content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))
        .inspect(|config| trace!("loaded config: {config:?}"))
}
