use warden_common::join_path;

const STATE_NODE: &str = "state";
const DATA_SOURCES_NODE: &str = "datasources";
const CONFIG_NODE: &str = "config";
const PROXY_NODE: &str = "proxy";

/// State node paths under one orchestration name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateNode {
    name: String,
}

impl StateNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// `/<name>/state/datasources`
    pub fn data_sources_node_full_path(&self) -> String {
        join_path(
            &join_path(&format!("/{}", self.name), STATE_NODE),
            DATA_SOURCES_NODE,
        )
    }

    /// `/<name>/state/datasources/<data_source_name>`
    pub fn data_source_node_full_path(&self, data_source_name: &str) -> String {
        join_path(&self.data_sources_node_full_path(), data_source_name)
    }
}

/// Configuration node paths under one orchestration name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationNode {
    name: String,
}

impl ConfigurationNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// `/<name>/config/proxy`
    pub fn proxy_config_path(&self) -> String {
        join_path(&join_path(&format!("/{}", self.name), CONFIG_NODE), PROXY_NODE)
    }
}
