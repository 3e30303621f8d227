//! Data source state listeners
//!
//! Each listener context owns one watch registration on the data source state
//! path. Notifications flow through a single pipeline:
//!
//! ```text
//! registry watch channel -> on_change(context, event)
//!     ADDED             -> ignored
//!     UPDATED / DELETED -> derive (fresh registry read)
//!                       -> validate (per context)
//!                       -> publish (context's event bus)
//! ```
//!
//! A validation failure is fatal for that notification: nothing is published
//! and the error is returned. The dispatch loop logs it and keeps watching.

use std::sync::Arc;

use dashmap::DashSet;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use warden_common::{Result, WardenError};
use warden_consistency::{ClusterPersistRepository, DataChangedEvent, DataChangedType};

use super::event::{EventBuses, JdbcStateEvent, ProxyConfigEvent};
use super::node::StateNode;
use super::service::DataSourceService;

/// Subscriber context a watch registration dispatches for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerContext {
    /// Sharding data source: disabled set on the sharding-state bus
    Sharding,
    /// Read/write-split data source: disabled set on the master-slave-state bus
    MasterSlave,
    /// Proxy runtime: validated available configuration on the proxy bus
    Proxy,
}

impl std::fmt::Display for ListenerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListenerContext::Sharding => write!(f, "sharding"),
            ListenerContext::MasterSlave => write!(f, "master-slave"),
            ListenerContext::Proxy => write!(f, "proxy"),
        }
    }
}

/// State recomputed from the registry after a change
#[derive(Debug)]
enum DerivedState {
    Jdbc(JdbcStateEvent),
    Proxy(ProxyConfigEvent),
}

pub struct DataSourceListenerManager {
    state_node: StateNode,
    repository: Arc<dyn ClusterPersistRepository>,
    data_source_service: DataSourceService,
    buses: Arc<EventBuses>,
    started: DashSet<ListenerContext>,
}

impl DataSourceListenerManager {
    pub fn new(
        name: &str,
        repository: Arc<dyn ClusterPersistRepository>,
        buses: Arc<EventBuses>,
    ) -> Self {
        Self {
            state_node: StateNode::new(name),
            data_source_service: DataSourceService::new(name, repository.clone()),
            repository,
            buses,
            started: DashSet::new(),
        }
    }

    /// Register the watch for `context` and spawn its dispatch loop.
    ///
    /// Each context can be started once per manager.
    pub async fn start(self: &Arc<Self>, context: ListenerContext) -> Result<JoinHandle<()>> {
        let path = self.state_node.data_sources_node_full_path();
        if !self.started.insert(context) {
            return Err(WardenError::AlreadyWatching {
                path,
                context: context.to_string(),
            });
        }

        let mut receiver = match self.repository.watch(&path).await {
            Ok(receiver) => receiver,
            Err(e) => {
                self.started.remove(&context);
                return Err(e);
            }
        };
        info!(path = %path, context = %context, "Data source listener started");

        let manager = self.clone();
        Ok(tokio::spawn(async move {
            while let Some(event) = receiver.recv().await {
                if let Err(e) = manager.on_change(context, &event).await {
                    error!(
                        context = %context,
                        key = %event.key,
                        event_type = %event.event_type,
                        fatal = e.is_fatal(),
                        "Registry change rejected: {}",
                        e
                    );
                }
            }
            warn!(path = %path, context = %context, "Watch channel closed, listener stopped");
        }))
    }

    /// Handle one notification for `context`.
    ///
    /// Returns `Ok(true)` when an event was published, `Ok(false)` when the
    /// notification was ignored.
    pub async fn on_change(
        &self,
        context: ListenerContext,
        event: &DataChangedEvent,
    ) -> Result<bool> {
        match event.event_type {
            DataChangedType::Added => {
                debug!(context = %context, key = %event.key, "Ignoring ADDED notification");
                return Ok(false);
            }
            DataChangedType::Updated | DataChangedType::Deleted => {}
        }

        let state = self.derive(context).await?;
        validate(&state)?;
        self.publish(context, state);
        Ok(true)
    }

    async fn derive(&self, context: ListenerContext) -> Result<DerivedState> {
        match context {
            ListenerContext::Sharding | ListenerContext::MasterSlave => {
                Ok(DerivedState::Jdbc(JdbcStateEvent {
                    disabled_data_source_names: self
                        .data_source_service
                        .disabled_data_source_names()
                        .await?,
                }))
            }
            ListenerContext::Proxy => {
                let configuration = self
                    .data_source_service
                    .available_proxy_configuration()
                    .await?;
                Ok(DerivedState::Proxy(ProxyConfigEvent {
                    data_sources: configuration.data_sources.clone(),
                    configuration,
                }))
            }
        }
    }

    fn publish(&self, context: ListenerContext, state: DerivedState) {
        let receivers = match (context, state) {
            (ListenerContext::Sharding, DerivedState::Jdbc(event)) => {
                self.buses.sharding_state.post(event)
            }
            (ListenerContext::MasterSlave, DerivedState::Jdbc(event)) => {
                self.buses.master_slave_state.post(event)
            }
            (ListenerContext::Proxy, DerivedState::Proxy(event)) => self.buses.proxy.post(event),
            (context, state) => {
                warn!(context = %context, ?state, "Derived state does not belong to context");
                return;
            }
        };
        debug!(context = %context, receivers, "Data source state published");
    }
}

fn validate(state: &DerivedState) -> Result<()> {
    match state {
        DerivedState::Jdbc(_) => Ok(()),
        DerivedState::Proxy(event) if !event.configuration.has_routable_target() => {
            Err(WardenError::InvalidConfiguration(
                "No available slave datasource, can't apply the configuration!".to_string(),
            ))
        }
        DerivedState::Proxy(_) => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::time::Duration;

    use tokio::sync::broadcast::error::TryRecvError;
    use warden_consistency::MemoryClusterRepository;

    use super::*;
    use crate::state::model::{
        DataSourceParameter, MasterSlaveRuleConfiguration, ProxyConfiguration,
    };

    const NAME: &str = "demo";

    struct Fixture {
        repo: Arc<MemoryClusterRepository>,
        buses: Arc<EventBuses>,
        manager: Arc<DataSourceListenerManager>,
        service: DataSourceService,
    }

    async fn fixture(slaves: &[&str]) -> Fixture {
        let repo = Arc::new(MemoryClusterRepository::new());
        let buses = Arc::new(EventBuses::new(16));
        let manager = Arc::new(DataSourceListenerManager::new(
            NAME,
            repo.clone(),
            buses.clone(),
        ));
        let service = DataSourceService::new(NAME, repo.clone());

        let mut configuration = ProxyConfiguration {
            master_slave_rule: MasterSlaveRuleConfiguration {
                name: "ms".to_string(),
                master_data_source_name: "ds_master".to_string(),
                slave_data_source_names: slaves.iter().map(|s| s.to_string()).collect(),
            },
            ..Default::default()
        };
        for name in std::iter::once("ds_master").chain(slaves.iter().copied()) {
            configuration
                .data_sources
                .insert(name.to_string(), DataSourceParameter::default());
        }
        service
            .persist_proxy_configuration(&configuration)
            .await
            .unwrap();

        Fixture {
            repo,
            buses,
            manager,
            service,
        }
    }

    fn updated(key: &str) -> DataChangedEvent {
        DataChangedEvent::updated(key, "disabled")
    }

    #[tokio::test]
    async fn test_added_is_ignored() {
        let f = fixture(&["ds_slave_0"]).await;
        let mut sharding = f.buses.sharding_state.subscribe();
        let mut proxy = f.buses.proxy.subscribe();
        let event = DataChangedEvent::added("/demo/state/datasources/ds_slave_0", "");

        for context in [
            ListenerContext::Sharding,
            ListenerContext::MasterSlave,
            ListenerContext::Proxy,
        ] {
            assert!(!f.manager.on_change(context, &event).await.unwrap());
        }
        assert_eq!(sharding.try_recv(), Err(TryRecvError::Empty));
        assert!(matches!(proxy.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_sharding_publishes_fresh_disabled_set() {
        let f = fixture(&["ds_slave_0", "ds_slave_1"]).await;
        let mut sharding = f.buses.sharding_state.subscribe();
        let mut master_slave = f.buses.master_slave_state.subscribe();

        f.service.disable_data_source("ds_slave_1").await.unwrap();
        // Payload names a different source; the registry is the source of truth
        let event = updated("/demo/state/datasources/ds_slave_0");
        assert!(f
            .manager
            .on_change(ListenerContext::Sharding, &event)
            .await
            .unwrap());

        let published = sharding.try_recv().unwrap();
        assert_eq!(
            published.disabled_data_source_names,
            BTreeSet::from(["ds_slave_1".to_string()])
        );
        assert_eq!(master_slave.try_recv(), Err(TryRecvError::Empty));
    }

    #[tokio::test]
    async fn test_master_slave_publishes_on_delete() {
        let f = fixture(&["ds_slave_0"]).await;
        let mut master_slave = f.buses.master_slave_state.subscribe();

        let event = DataChangedEvent::deleted("/demo/state/datasources/ds_slave_0");
        assert!(f
            .manager
            .on_change(ListenerContext::MasterSlave, &event)
            .await
            .unwrap());
        assert!(master_slave.try_recv().unwrap().disabled_data_source_names.is_empty());
    }

    #[tokio::test]
    async fn test_proxy_publishes_available_configuration() {
        let f = fixture(&["ds_slave_0", "ds_slave_1"]).await;
        let mut proxy = f.buses.proxy.subscribe();
        f.service.disable_data_source("ds_slave_0").await.unwrap();

        assert!(f
            .manager
            .on_change(ListenerContext::Proxy, &updated("/demo/state/datasources/ds_slave_0"))
            .await
            .unwrap());

        let published = proxy.try_recv().unwrap();
        assert_eq!(
            published.configuration.master_slave_rule.slave_data_source_names,
            vec!["ds_slave_1"]
        );
        assert!(!published.data_sources.contains_key("ds_slave_0"));
        assert_eq!(published.data_sources, published.configuration.data_sources);
    }

    #[tokio::test]
    async fn test_proxy_rejects_configuration_without_targets() {
        let f = fixture(&["ds_slave_0"]).await;
        let mut proxy = f.buses.proxy.subscribe();
        f.service.disable_data_source("ds_slave_0").await.unwrap();

        let result = f
            .manager
            .on_change(ListenerContext::Proxy, &updated("/demo/state/datasources/ds_slave_0"))
            .await;

        assert!(matches!(result, Err(WardenError::InvalidConfiguration(_))));
        assert!(matches!(proxy.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_contexts_are_independent() {
        let f = fixture(&["ds_slave_0"]).await;
        let mut sharding = f.buses.sharding_state.subscribe();
        let mut proxy = f.buses.proxy.subscribe();
        f.service.disable_data_source("ds_slave_0").await.unwrap();
        let event = updated("/demo/state/datasources/ds_slave_0");

        assert!(f.manager.on_change(ListenerContext::Proxy, &event).await.is_err());
        assert!(f
            .manager
            .on_change(ListenerContext::Sharding, &event)
            .await
            .unwrap());

        assert!(matches!(proxy.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(
            sharding.try_recv().unwrap().disabled_data_source_names,
            BTreeSet::from(["ds_slave_0".to_string()])
        );
    }

    #[tokio::test]
    async fn test_start_twice_is_rejected() {
        let f = fixture(&["ds_slave_0"]).await;

        let handle = f.manager.start(ListenerContext::Proxy).await.unwrap();
        let second = f.manager.start(ListenerContext::Proxy).await;
        assert!(matches!(second, Err(WardenError::AlreadyWatching { .. })));
        assert_eq!(f.repo.watcher_count("/demo/state/datasources"), 1);

        f.manager.start(ListenerContext::Sharding).await.unwrap();
        assert_eq!(f.repo.watcher_count("/demo/state/datasources"), 2);
        handle.abort();
    }

    #[tokio::test]
    async fn test_start_failure_allows_retry() {
        let f = fixture(&["ds_slave_0"]).await;
        f.repo.set_online(false);
        assert!(f.manager.start(ListenerContext::Sharding).await.is_err());

        f.repo.set_online(true);
        assert!(f.manager.start(ListenerContext::Sharding).await.is_ok());
    }

    #[tokio::test]
    async fn test_dispatch_loop_survives_fatal_error() {
        let f = fixture(&["ds_slave_0"]).await;
        let mut proxy = f.buses.proxy.subscribe();
        f.manager.start(ListenerContext::Proxy).await.unwrap();

        // Last replica disabled: rejected, nothing published
        f.service.disable_data_source("ds_slave_0").await.unwrap();
        f.service.disable_data_source("ds_slave_0").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(matches!(proxy.try_recv(), Err(TryRecvError::Empty)));

        // Replica back: the same registration still dispatches
        f.service.enable_data_source("ds_slave_0").await.unwrap();
        let published = tokio::time::timeout(Duration::from_secs(2), proxy.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            published.configuration.master_slave_rule.slave_data_source_names,
            vec!["ds_slave_0"]
        );
    }
}
