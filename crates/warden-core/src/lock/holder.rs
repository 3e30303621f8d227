// Per-process lock handle cache
// Maps each lock key to exactly one handle, created lazily on first use

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::info;
use warden_common::{Result, WardenError};
use warden_consistency::DistributedLock;

type LockSlot = Arc<OnceCell<Arc<dyn DistributedLock>>>;

/// Process-wide cache of lock handles keyed by lock key.
///
/// Each key owns a slot that is initialised at most once. Concurrent first
/// callers wait on the same slot, so the factory runs once on success; a
/// failed factory leaves the slot empty and the next caller retries.
/// Entries are never evicted.
#[derive(Default)]
pub struct DistributedLockHolder {
    locks: DashMap<String, LockSlot>,
}

impl DistributedLockHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the handle cached for `key`, creating it with `factory` if absent
    pub async fn get_or_create<F, Fut>(
        &self,
        key: &str,
        factory: F,
    ) -> Result<Arc<dyn DistributedLock>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Arc<dyn DistributedLock>>>,
    {
        if key.is_empty() {
            return Err(WardenError::IllegalArgument(
                "lock key must not be empty".to_string(),
            ));
        }

        // Clone the slot out so no shard lock is held across the await
        let slot = self.locks.entry(key.to_string()).or_default().clone();

        let lock = slot
            .get_or_try_init(|| async {
                let lock = factory().await?;
                info!(key = %key, "Distributed lock handle created");
                Ok::<_, WardenError>(lock)
            })
            .await?;

        Ok(lock.clone())
    }

    /// Cached handle for `key`, without creating one
    pub fn get(&self, key: &str) -> Option<Arc<dyn DistributedLock>> {
        self.locks.get(key).and_then(|slot| slot.get().cloned())
    }

    /// Number of keys with a created handle
    pub fn len(&self) -> usize {
        self.locks.iter().filter(|slot| slot.initialized()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keys with a created handle, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .locks
            .iter()
            .filter(|entry| entry.value().initialized())
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        keys
    }
}
