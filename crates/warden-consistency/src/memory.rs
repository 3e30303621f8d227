// In-memory cluster registry
// Standalone-mode backend and test double for the registry contract

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, info};
use warden_common::{PATH_SEPARATOR, Result, WardenError};

use crate::lock::{DistributedLock, LockLease};
use crate::repository::{ClusterPersistRepository, DataChangedEvent};

/// In-memory registry using DashMap
pub struct MemoryClusterRepository {
    data: DashMap<String, String>,
    locks: DashMap<String, LockLease>,
    native_locks: DashMap<String, Arc<dyn DistributedLock>>,
    watchers: DashMap<String, Vec<mpsc::UnboundedSender<DataChangedEvent>>>,
    online: AtomicBool,
}

impl Default for MemoryClusterRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryClusterRepository {
    pub fn new() -> Self {
        Self {
            data: DashMap::new(),
            locks: DashMap::new(),
            native_locks: DashMap::new(),
            watchers: DashMap::new(),
            online: AtomicBool::new(true),
        }
    }

    /// Switch the registry on or off. While offline every call fails with
    /// `WardenError::Repository`.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
        info!(online, "Memory registry availability changed");
    }

    /// Install a registry-native handle returned by `get_distributed_lock`
    pub fn register_lock(&self, lock: Arc<dyn DistributedLock>) {
        self.native_locks.insert(lock.key().to_string(), lock);
    }

    /// Number of live watch registrations on exactly `key`
    pub fn watcher_count(&self, key: &str) -> usize {
        self.watchers
            .get(key)
            .map(|senders| senders.iter().filter(|tx| !tx.is_closed()).count())
            .unwrap_or(0)
    }

    fn ensure_online(&self) -> Result<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(WardenError::Repository("registry is offline".to_string()))
        }
    }

    fn notify(&self, event: DataChangedEvent) {
        for mut entry in self.watchers.iter_mut() {
            if !is_self_or_descendant(&event.key, entry.key()) {
                continue;
            }
            // Closed receivers drop their registration here
            entry.value_mut().retain(|tx| tx.send(event.clone()).is_ok());
        }
    }
}

fn is_self_or_descendant(key: &str, ancestor: &str) -> bool {
    let ancestor = ancestor.trim_end_matches(PATH_SEPARATOR);
    key == ancestor
        || key
            .strip_prefix(ancestor)
            .is_some_and(|rest| rest.starts_with(PATH_SEPARATOR))
}

#[async_trait]
impl ClusterPersistRepository for MemoryClusterRepository {
    async fn get_distributed_lock(&self, key: &str) -> Result<Option<Arc<dyn DistributedLock>>> {
        self.ensure_online()?;
        Ok(self.native_locks.get(key).map(|lock| lock.value().clone()))
    }

    async fn try_acquire_lock(&self, key: &str, owner: &str, ttl: Duration) -> Result<bool> {
        self.ensure_online()?;
        let mut lease = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| LockLease::new(key));

        let acquired = lease.acquire(owner, ttl);
        if acquired {
            debug!(key = %key, owner = %owner, fence_token = lease.fence_token, "Lease acquired");
        }
        Ok(acquired)
    }

    async fn renew_lock(&self, key: &str, owner: &str, ttl: Duration) -> Result<bool> {
        self.ensure_online()?;
        Ok(self
            .locks
            .get_mut(key)
            .is_some_and(|mut lease| lease.renew(owner, ttl)))
    }

    async fn release_lock(&self, key: &str, owner: &str) -> Result<bool> {
        self.ensure_online()?;
        let released = self
            .locks
            .get_mut(key)
            .is_some_and(|mut lease| lease.release(owner));
        if released {
            debug!(key = %key, owner = %owner, "Lease released");
        }
        Ok(released)
    }

    async fn lock_holder(&self, key: &str) -> Result<Option<String>> {
        self.ensure_online()?;
        Ok(self
            .locks
            .get(key)
            .filter(|lease| lease.is_held())
            .and_then(|lease| lease.owner.clone()))
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.ensure_online()?;
        Ok(self.data.get(key).map(|value| value.value().clone()))
    }

    async fn get_children_keys(&self, key: &str) -> Result<Vec<String>> {
        self.ensure_online()?;
        let prefix = format!("{}{}", key.trim_end_matches(PATH_SEPARATOR), PATH_SEPARATOR);

        let children: BTreeSet<String> = self
            .data
            .iter()
            .filter_map(|entry| {
                entry
                    .key()
                    .strip_prefix(&prefix)
                    .and_then(|rest| rest.split(PATH_SEPARATOR).next())
                    .filter(|child| !child.is_empty())
                    .map(str::to_string)
            })
            .collect();

        Ok(children.into_iter().collect())
    }

    async fn persist(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_online()?;
        let previous = self.data.insert(key.to_string(), value.to_string());

        let event = match previous {
            Some(_) => DataChangedEvent::updated(key, value),
            None => DataChangedEvent::added(key, value),
        };
        debug!(key = %key, event_type = %event.event_type, "Registry key persisted");
        self.notify(event);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.ensure_online()?;
        let mut removed: Vec<String> = self
            .data
            .iter()
            .filter(|entry| is_self_or_descendant(entry.key(), key))
            .map(|entry| entry.key().clone())
            .collect();
        removed.sort();

        for removed_key in removed {
            if self.data.remove(&removed_key).is_some() {
                debug!(key = %removed_key, "Registry key deleted");
                self.notify(DataChangedEvent::deleted(removed_key));
            }
        }
        Ok(())
    }

    async fn watch(&self, key: &str) -> Result<mpsc::UnboundedReceiver<DataChangedEvent>> {
        self.ensure_online()?;
        let (tx, rx) = mpsc::unbounded_channel();
        self.watchers.entry(key.to_string()).or_default().push(tx);
        info!(key = %key, "Watch registered");
        Ok(rx)
    }
}
