//! Main entry point for the Warden server.
//!
//! Boots a standalone registry, the global lock service and the data source
//! state listeners, then runs until Ctrl-C.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};
use warden_consistency::MemoryClusterRepository;
use warden_core::{
    DataSourceListenerManager, DistributedLockHolder, EventBuses, GlobalLockDefinition,
    GlobalLockPersistService, ListenerContext, WardenConfig,
};
use warden_server::startup;

/// Command line arguments for the server
#[derive(Debug, Parser)]
#[command(name = "warden-server", version, about)]
struct Cli {
    /// Config file (YAML or TOML); defaults to conf/warden.* when present
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,
    /// Orchestration name override
    #[arg(short = 'n', long = "name")]
    name: Option<String>,
    /// Log level or filter directive override
    #[arg(long = "log-level")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut configuration = WardenConfig::load(cli.config.as_deref())?;
    if let Some(name) = cli.name {
        configuration.name = name;
    }
    if let Some(level) = cli.log_level {
        configuration.logging.level = level;
    }
    configuration.validate()?;

    startup::init_logging(&configuration.logging)?;
    info!(name = %configuration.name, "Starting Warden server");

    let repository = Arc::new(MemoryClusterRepository::new());
    let lock_service =
        GlobalLockPersistService::new(repository.clone(), Arc::new(DistributedLockHolder::new()))
            .with_properties(configuration.lock_properties()?);

    let buses = Arc::new(EventBuses::new(configuration.watch.event_bus_capacity));
    let _event_loggers = [
        startup::spawn_event_logger(&buses.sharding_state),
        startup::spawn_event_logger(&buses.master_slave_state),
        startup::spawn_event_logger(&buses.proxy),
    ];

    let listener_manager = Arc::new(DataSourceListenerManager::new(
        &configuration.name,
        repository.clone(),
        buses.clone(),
    ));
    let mut listeners = Vec::new();
    for context in [
        ListenerContext::Sharding,
        ListenerContext::MasterSlave,
        ListenerContext::Proxy,
    ] {
        listeners.push(listener_manager.start(context).await?);
    }

    // Only one node in the cluster runs bootstrap work at a time
    let bootstrap = GlobalLockDefinition::new("bootstrap");
    if lock_service.try_lock(&bootstrap, 0).await? {
        info!("Bootstrap lock acquired");
        lock_service.unlock(&bootstrap).await?;
    } else {
        warn!("Bootstrap lock held elsewhere, skipping bootstrap");
    }

    info!("Warden server started, press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    info!("Shutting down");
    for listener in listeners {
        listener.abort();
    }
    Ok(())
}
