//! Registry state and its local republication
//!
//! - `node`: registry paths for state and configuration
//! - `model`: proxy configuration stored in the registry
//! - `service`: data source state inventory
//! - `event`: local event buses and domain events
//! - `listener`: watch registration and dispatch per listener context

mod event;
mod listener;
mod model;
mod node;
mod service;

pub use event::{EventBus, EventBuses, JdbcStateEvent, ProxyConfigEvent};
pub use listener::{DataSourceListenerManager, ListenerContext};
pub use model::{
    DataSourceParameter, MasterSlaveRuleConfiguration, ProxyConfiguration,
    ShardingRuleConfiguration, TableRuleConfiguration,
};
pub use node::{ConfigurationNode, StateNode};
pub use service::DataSourceService;
