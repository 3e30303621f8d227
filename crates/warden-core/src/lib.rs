//! Warden Core - cluster locks and registry state listeners
//!
//! This crate provides:
//! - A per-process lock handle cache (`DistributedLockHolder`)
//! - The global lock persist service (`try_lock` / `unlock` by definition)
//! - Data source state inventory over the registry
//! - Watch dispatch that republishes registry changes on local event buses
//! - Workspace configuration

pub mod config;
pub mod lock;
pub mod state;

pub use config::WardenConfig;
pub use lock::{
    DistributedLockHolder, GlobalLockDefinition, GlobalLockPersistService, LockDefinition,
};
pub use state::{
    ConfigurationNode, DataSourceListenerManager, DataSourceService, EventBus, EventBuses,
    JdbcStateEvent, ListenerContext, ProxyConfigEvent, ProxyConfiguration, StateNode,
};
