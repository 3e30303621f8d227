//! Cluster registry contract
//!
//! Every registry backend (consensus-backed or in-memory) implements
//! `ClusterPersistRepository`. Change notifications are delivered as
//! `DataChangedEvent` values on a channel owned by each watch registration.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use warden_common::Result;

use crate::lock::DistributedLock;

/// Kind of change reported by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataChangedType {
    /// Key written for the first time
    Added,
    /// Existing key overwritten
    Updated,
    /// Key removed
    Deleted,
}

impl std::fmt::Display for DataChangedType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataChangedType::Added => write!(f, "ADDED"),
            DataChangedType::Updated => write!(f, "UPDATED"),
            DataChangedType::Deleted => write!(f, "DELETED"),
        }
    }
}

/// Change notification for a single registry key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataChangedEvent {
    /// The key that changed
    pub key: String,
    /// The new value (`None` for deletions)
    pub value: Option<String>,
    /// Type of change
    pub event_type: DataChangedType,
}

impl DataChangedEvent {
    pub fn added(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            event_type: DataChangedType::Added,
        }
    }

    pub fn updated(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            event_type: DataChangedType::Updated,
        }
    }

    pub fn deleted(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
            event_type: DataChangedType::Deleted,
        }
    }
}

/// Registry operations used by the lock and watch layers
#[async_trait]
pub trait ClusterPersistRepository: Send + Sync {
    /// Look up a registry-native lock handle for `key`.
    ///
    /// `Ok(None)` means the registry has no native handle and the caller
    /// should construct a default one.
    async fn get_distributed_lock(&self, key: &str) -> Result<Option<Arc<dyn DistributedLock>>>;

    /// Take the lease on `key` for `owner` if nobody holds it
    async fn try_acquire_lock(&self, key: &str, owner: &str, ttl: Duration) -> Result<bool>;

    /// Extend the lease on `key` by `ttl` if `owner` still holds it.
    ///
    /// `Ok(false)` means the lease expired or passed to another owner.
    async fn renew_lock(&self, key: &str, owner: &str, ttl: Duration) -> Result<bool>;

    /// Release the lease on `key` if `owner` holds it
    async fn release_lock(&self, key: &str, owner: &str) -> Result<bool>;

    /// Current holder of the lease on `key`, if any
    async fn lock_holder(&self, key: &str) -> Result<Option<String>>;

    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Names of the direct children of `key`, sorted
    async fn get_children_keys(&self, key: &str) -> Result<Vec<String>>;

    async fn persist(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key` and everything below it
    async fn delete(&self, key: &str) -> Result<()>;

    /// Register a watch on `key` and all of its descendants.
    ///
    /// The registration lives until the returned receiver is dropped.
    async fn watch(&self, key: &str) -> Result<mpsc::UnboundedReceiver<DataChangedEvent>>;
}
