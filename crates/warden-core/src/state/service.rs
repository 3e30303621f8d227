//! Data source state inventory
//!
//! Reads data source state and proxy configuration from the registry. Every
//! query goes to the registry, so callers always see its current contents.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::debug;
use warden_common::{DISABLED_STATE, Result, WardenError};
use warden_consistency::ClusterPersistRepository;

use super::model::{DataSourceParameter, ProxyConfiguration};
use super::node::{ConfigurationNode, StateNode};

#[derive(Clone)]
pub struct DataSourceService {
    state_node: StateNode,
    config_node: ConfigurationNode,
    repository: Arc<dyn ClusterPersistRepository>,
}

impl DataSourceService {
    pub fn new(name: &str, repository: Arc<dyn ClusterPersistRepository>) -> Self {
        Self {
            state_node: StateNode::new(name),
            config_node: ConfigurationNode::new(name),
            repository,
        }
    }

    /// Names of data sources whose state node is marked disabled
    pub async fn disabled_data_source_names(&self) -> Result<BTreeSet<String>> {
        let mut result = BTreeSet::new();
        for name in self
            .repository
            .get_children_keys(&self.state_node.data_sources_node_full_path())
            .await?
        {
            let state = self
                .repository
                .get(&self.state_node.data_source_node_full_path(&name))
                .await?;
            if state.is_some_and(|value| value.trim().eq_ignore_ascii_case(DISABLED_STATE)) {
                result.insert(name);
            }
        }
        Ok(result)
    }

    pub async fn disable_data_source(&self, name: &str) -> Result<()> {
        self.repository
            .persist(&self.state_node.data_source_node_full_path(name), DISABLED_STATE)
            .await
    }

    pub async fn enable_data_source(&self, name: &str) -> Result<()> {
        self.repository
            .persist(&self.state_node.data_source_node_full_path(name), "")
            .await
    }

    pub async fn persist_proxy_configuration(
        &self,
        configuration: &ProxyConfiguration,
    ) -> Result<()> {
        let json = serde_json::to_string(configuration)?;
        self.repository
            .persist(&self.config_node.proxy_config_path(), &json)
            .await
    }

    pub async fn load_proxy_configuration(&self) -> Result<ProxyConfiguration> {
        let path = self.config_node.proxy_config_path();
        let json = self.repository.get(&path).await?.ok_or_else(|| {
            WardenError::InvalidConfiguration(format!("no proxy configuration at '{}'", path))
        })?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Proxy configuration with every disabled data source removed
    pub async fn available_proxy_configuration(&self) -> Result<ProxyConfiguration> {
        let mut configuration = self.load_proxy_configuration().await?;
        for name in self.disabled_data_source_names().await? {
            debug!(data_source = %name, "Excluding disabled data source");
            configuration.remove_data_source(&name);
        }
        Ok(configuration)
    }

    pub async fn available_data_source_parameters(
        &self,
    ) -> Result<BTreeMap<String, DataSourceParameter>> {
        Ok(self.available_proxy_configuration().await?.data_sources)
    }
}
