//! rqd - The rq background service
//!
//! This is the main entry point for the rqd service.
//! It wires together all the components:
//! - Configuration loading and reload on SIGHUP
//! - Store initialization
//! - Core engine
//! - Expiry scheduler

mod host;

use anyhow::{Context, Result};
use clap::Parser;
use rq_config::{Settings, SettingsHandle, load_config};
use rq_core::{CoreEngine, ExpiryScheduler};
use rq_store::{KvStore, SqliteStore};
use rq_util::{STORE_FILENAME, default_config_path};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::host::{ConfigIdentity, LogNotifier};

/// rqd - Shared resource booking service
#[derive(Parser, Debug)]
#[command(name = "rqd")]
#[command(about = "Shared resource booking with queues and automatic expiry", long_about = None)]
struct Args {
    /// Configuration file path (default: ~/.config/rq/config.toml)
    #[arg(short, long, default_value_os_t = default_config_path())]
    config: PathBuf,

    /// Data directory override (or set RQ_DATA_DIR env var)
    #[arg(short, long, env = "RQ_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

/// Main service state
struct Service {
    engine: Arc<CoreEngine>,
    settings: SettingsHandle,
    config_path: PathBuf,
}

impl Service {
    fn new(args: &Args) -> Result<Self> {
        let settings = if args.config.exists() {
            let settings = load_config(&args.config)
                .with_context(|| format!("Failed to load config from {:?}", args.config))?;
            info!(config_path = %args.config.display(), "Configuration loaded");
            settings
        } else {
            warn!(
                config_path = %args.config.display(),
                "Config file not found, using defaults"
            );
            Settings::default()
        };

        let data_dir = args
            .data_dir
            .clone()
            .unwrap_or_else(|| settings.service.data_dir.clone());

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {:?}", data_dir))?;

        let db_path = data_dir.join(STORE_FILENAME);
        let store: Arc<dyn KvStore> = Arc::new(
            SqliteStore::open(&db_path)
                .with_context(|| format!("Failed to open database {:?}", db_path))?,
        );

        info!(db_path = %db_path.display(), "Store initialized");

        let settings = SettingsHandle::new(settings);
        let identity = Arc::new(ConfigIdentity::new(settings.clone()));
        let engine = CoreEngine::new(store, Arc::new(LogNotifier), identity, settings.clone());

        Ok(Self {
            engine: Arc::new(engine),
            settings,
            config_path: args.config.clone(),
        })
    }

    async fn run(self) -> Result<()> {
        let scheduler = ExpiryScheduler::spawn(self.engine.clone());

        let mut sigterm = signal(SignalKind::terminate())
            .context("Failed to create SIGTERM handler")?;
        let mut sigint = signal(SignalKind::interrupt())
            .context("Failed to create SIGINT handler")?;
        let mut sighup = signal(SignalKind::hangup())
            .context("Failed to create SIGHUP handler")?;

        info!("Service running");

        loop {
            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, shutting down gracefully");
                    break;
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, shutting down gracefully");
                    break;
                }

                // SIGHUP - reload configuration
                _ = sighup.recv() => {
                    info!("Received SIGHUP, reloading configuration");
                    self.reload();
                }
            }
        }

        info!("Shutting down rqd");
        scheduler.stop().await;

        if !self.engine.is_healthy() {
            warn!("Store reported unhealthy at shutdown");
        }

        info!("Shutdown complete");
        Ok(())
    }

    fn reload(&self) {
        if !self.config_path.exists() {
            warn!(config_path = %self.config_path.display(), "Config file not found, keeping current settings");
            return;
        }
        if let Err(e) = self.settings.reload_from(&self.config_path) {
            warn!(error = %e, "Config reload failed, keeping previous settings");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "rqd starting"
    );

    let service = Service::new(&args)?;
    service.run().await
}
