//! Default lock handle built on the repository lease primitives

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};
use warden_common::Result;

use super::{DistributedLock, LockTypedProperties};
use crate::repository::ClusterPersistRepository;

/// Lock handle used when the registry offers no native one.
///
/// Each handle carries a process-unique owner id that the registry records as
/// the lease holder. The handle is not re-entrant.
///
/// While the lease is held a background task renews it every third of the
/// time-to-live, until `unlock` or drop.
pub struct DefaultDistributedLock {
    key: String,
    owner: String,
    repository: Arc<dyn ClusterPersistRepository>,
    props: LockTypedProperties,
    keep_alive: Mutex<Option<JoinHandle<()>>>,
}

impl DefaultDistributedLock {
    pub fn new(
        key: impl Into<String>,
        repository: Arc<dyn ClusterPersistRepository>,
        props: LockTypedProperties,
    ) -> Self {
        Self {
            key: key.into(),
            owner: uuid::Uuid::new_v4().to_string(),
            repository,
            props,
            keep_alive: Mutex::new(None),
        }
    }

    /// Owner id recorded by the registry while this handle holds the lease
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn properties(&self) -> &LockTypedProperties {
        &self.props
    }

    fn spawn_keep_alive(&self) -> JoinHandle<()> {
        let repository = self.repository.clone();
        let key = self.key.clone();
        let owner = self.owner.clone();
        let ttl = self.props.time_to_live();
        let period = (ttl / 3).max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                match repository.renew_lock(&key, &owner, ttl).await {
                    Ok(true) => {}
                    Ok(false) => {
                        warn!(key = %key, owner = %owner, "Lease lost, renewal refused");
                        break;
                    }
                    // The lease may still be valid once the registry is back
                    Err(e) => warn!(key = %key, owner = %owner, "Lease renewal failed: {}", e),
                }
            }
        })
    }
}

impl Drop for DefaultDistributedLock {
    fn drop(&mut self) {
        if let Some(task) = self.keep_alive.get_mut().take() {
            task.abort();
        }
    }
}

#[async_trait]
impl DistributedLock for DefaultDistributedLock {
    fn key(&self) -> &str {
        &self.key
    }

    async fn try_lock(&self, timeout: Duration) -> Result<bool> {
        let deadline = Instant::now() + timeout;
        let ttl = self.props.time_to_live();

        loop {
            if self
                .repository
                .try_acquire_lock(&self.key, &self.owner, ttl)
                .await?
            {
                debug!(key = %self.key, owner = %self.owner, "Lock acquired");
                let task = self.spawn_keep_alive();
                // A task left over from a lost lease is replaced
                if let Some(stale) = self.keep_alive.lock().await.replace(task) {
                    stale.abort();
                }
                return Ok(true);
            }

            let now = Instant::now();
            if now >= deadline {
                debug!(
                    key = %self.key,
                    timeout_ms = (timeout.as_millis() as u64),
                    "Lock acquisition timed out"
                );
                return Ok(false);
            }
            tokio::time::sleep(self.props.retry_interval().min(deadline - now)).await;
        }
    }

    async fn unlock(&self) -> Result<()> {
        let keep_alive = self.keep_alive.lock().await.take();
        let was_held = keep_alive.is_some();
        if let Some(task) = keep_alive {
            task.abort();
        }

        if self.repository.release_lock(&self.key, &self.owner).await? {
            debug!(key = %self.key, owner = %self.owner, "Lock released");
        } else if was_held {
            warn!(
                key = %self.key,
                owner = %self.owner,
                "Unlock found the lease already lost"
            );
        } else {
            debug!(
                key = %self.key,
                owner = %self.owner,
                "Unlock ignored, lease not held by this handle"
            );
        }
        Ok(())
    }
}
