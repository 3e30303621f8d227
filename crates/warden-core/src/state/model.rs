//! Proxy configuration as stored in the registry (JSON, camelCase)

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Connection parameters of one data source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceParameter {
    pub url: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_maximum_pool_size")]
    pub maximum_pool_size: u32,
}

fn default_maximum_pool_size() -> u32 {
    50
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRuleConfiguration {
    #[serde(default)]
    pub actual_data_nodes: String,
    #[serde(default)]
    pub key_generator_column_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShardingRuleConfiguration {
    /// Logic table name -> rule
    #[serde(default)]
    pub tables: BTreeMap<String, TableRuleConfiguration>,
    #[serde(default)]
    pub default_data_source_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MasterSlaveRuleConfiguration {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub master_data_source_name: String,
    #[serde(default)]
    pub slave_data_source_names: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxyConfiguration {
    #[serde(default)]
    pub data_sources: BTreeMap<String, DataSourceParameter>,
    #[serde(default)]
    pub sharding_rule: ShardingRuleConfiguration,
    #[serde(default)]
    pub master_slave_rule: MasterSlaveRuleConfiguration,
}

impl ProxyConfiguration {
    /// Drop a data source from the data source map and the replica list
    pub fn remove_data_source(&mut self, name: &str) {
        self.data_sources.remove(name);
        self.master_slave_rule
            .slave_data_source_names
            .retain(|slave| slave != name);
    }

    /// At least one sharded table or one readable replica remains
    pub fn has_routable_target(&self) -> bool {
        !self.sharding_rule.tables.is_empty()
            || !self.master_slave_rule.slave_data_source_names.is_empty()
    }
}
