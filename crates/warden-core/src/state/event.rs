// Local event buses
// Validated registry changes are republished here for in-process subscribers

use std::collections::{BTreeMap, BTreeSet};

use tokio::sync::broadcast;
use tracing::debug;

use super::model::{DataSourceParameter, ProxyConfiguration};

/// Data source state changed; carries the full disabled set
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct JdbcStateEvent {
    pub disabled_data_source_names: BTreeSet<String>,
}

/// Proxy configuration changed; carries the available configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyConfigEvent {
    pub data_sources: BTreeMap<String, DataSourceParameter>,
    pub configuration: ProxyConfiguration,
}

/// Named broadcast bus
pub struct EventBus<E> {
    name: String,
    sender: broadcast::Sender<E>,
}

impl<E: Clone> EventBus<E> {
    pub fn new(name: impl Into<String>, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            name: name.into(),
            sender,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Post an event to every current subscriber.
    ///
    /// Returns the number of subscribers reached; posting with no subscribers
    /// is not an error.
    pub fn post(&self, event: E) -> usize {
        match self.sender.send(event) {
            Ok(receivers) => {
                debug!(bus = %self.name, receivers, "Event posted");
                receivers
            }
            Err(_) => {
                debug!(bus = %self.name, "Event dropped, no subscribers");
                0
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<E> {
        self.sender.subscribe()
    }
}

/// The buses fed by data source state listeners
pub struct EventBuses {
    pub sharding_state: EventBus<JdbcStateEvent>,
    pub master_slave_state: EventBus<JdbcStateEvent>,
    pub proxy: EventBus<ProxyConfigEvent>,
}

impl EventBuses {
    pub fn new(capacity: usize) -> Self {
        Self {
            sharding_state: EventBus::new("sharding-state", capacity),
            master_slave_state: EventBus::new("master-slave-state", capacity),
            proxy: EventBus::new("proxy", capacity),
        }
    }
}

impl Default for EventBuses {
    fn default() -> Self {
        Self::new(64)
    }
}
