use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use command_center::{
    api::{ApiConfig, ApiState, spawn_api_server},
    config::{Config, read_config_file},
    export::export_static,
    seed::seed_if_empty,
    simulation::SimulationEngine,
    storage::{self, StorageBackend},
};
use tracing::{error, info, instrument, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file (JSON); defaults apply when omitted
    #[arg(short, long)]
    file: Option<String>,

    /// Seed for the simulation, overrides the config file
    #[arg(long)]
    seed: Option<u64>,

    /// Log every tick and store write
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Run the simulator and the read API (default)
    Serve,

    /// Write dashboard.json, services.json and alerts.json, then exit
    Export {
        /// Output directory
        #[arg(long, default_value = "./data")]
        out: PathBuf,
    },
}

fn init(verbose: bool) {
    let level = if verbose {
        LevelFilter::TRACE
    } else {
        LevelFilter::INFO
    };
    let filter = filter::Targets::new().with_targets(vec![
        ("command_center", level),
        ("tower_http", LevelFilter::DEBUG),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let args = Args::parse();
    init(args.verbose);
    trace!("started with args: {args:?}");

    let mut config = match &args.file {
        Some(file) => read_config_file(file)?,
        None => Config::default(),
    }
    .apply_env_overrides();

    if let Some(seed) = args.seed {
        config.simulation.seed = Some(seed);
    }

    let store = storage::open(&config.storage)
        .await
        .context("failed to open store")?;

    if config.seed_on_start {
        seed_if_empty(store.as_ref()).await?;
    }

    let result = match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, store.clone()).await,
        Command::Export { out } => export_static(store.as_ref(), &out).await.map(|_| ()),
    };

    if let Err(e) = store.close().await {
        error!("failed to close store: {e}");
    }

    result
}

#[instrument(skip_all)]
async fn serve(config: Config, store: Arc<dyn StorageBackend>) -> anyhow::Result<()> {
    let engine = SimulationEngine::new(config.simulation.clone(), store.clone())?;
    let handle = engine.start();
    info!(
        "simulation running every {} ms, alert probability {}",
        config.simulation.tick_interval_ms, config.simulation.alert_probability
    );

    let state = ApiState::new(store, handle.clone());
    let addr = spawn_api_server(ApiConfig::from(&config.api), state).await?;
    info!("dashboard API available at http://{addr}/api");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutting down");

    handle.stop().await;

    Ok(())
}
