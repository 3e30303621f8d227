//! Global lock persist service
//!
//! Resolves a lock definition to its key, fetches the per-process handle for
//! that key from the holder (creating it on first use), and drives it.

use std::sync::Arc;
use std::time::Duration;

use warden_common::{PATH_SEPARATOR, Result, WardenError};
use warden_consistency::{
    ClusterPersistRepository, DefaultDistributedLock, DistributedLock, LockTypedProperties,
};

use super::{DistributedLockHolder, LockDefinition};

pub struct GlobalLockPersistService {
    repository: Arc<dyn ClusterPersistRepository>,
    holder: Arc<DistributedLockHolder>,
    props: LockTypedProperties,
}

impl GlobalLockPersistService {
    pub fn new(
        repository: Arc<dyn ClusterPersistRepository>,
        holder: Arc<DistributedLockHolder>,
    ) -> Self {
        Self {
            repository,
            holder,
            props: LockTypedProperties::default(),
        }
    }

    /// Seed default handles created by this service with `props`
    pub fn with_properties(mut self, props: LockTypedProperties) -> Self {
        self.props = props;
        self
    }

    /// Try to acquire the cluster-wide lock named by `definition`.
    ///
    /// Returns `Ok(false)` when the lock is not acquired within
    /// `timeout_millis`; zero makes a single attempt. Negative timeouts are
    /// rejected before anything reaches the registry.
    pub async fn try_lock(
        &self,
        definition: &impl LockDefinition,
        timeout_millis: i64,
    ) -> Result<bool> {
        if timeout_millis < 0 {
            return Err(WardenError::IllegalArgument(format!(
                "lock timeout must not be negative, got {}",
                timeout_millis
            )));
        }
        let key = resolve_key(definition)?;
        let lock = self.distributed_lock(&key).await?;
        lock.try_lock(Duration::from_millis(timeout_millis as u64))
            .await
    }

    /// Release the cluster-wide lock named by `definition`
    pub async fn unlock(&self, definition: &impl LockDefinition) -> Result<()> {
        let key = resolve_key(definition)?;
        let lock = self.distributed_lock(&key).await?;
        lock.unlock().await
    }

    async fn distributed_lock(&self, key: &str) -> Result<Arc<dyn DistributedLock>> {
        self.holder
            .get_or_create(key, || async {
                match self.repository.get_distributed_lock(key).await? {
                    Some(lock) => Ok(lock),
                    None => Ok(Arc::new(DefaultDistributedLock::new(
                        key,
                        self.repository.clone(),
                        self.props.clone(),
                    )) as Arc<dyn DistributedLock>),
                }
            })
            .await
    }
}

fn resolve_key(definition: &impl LockDefinition) -> Result<String> {
    definition.validate()?;
    let key = definition.lock_key();
    if key.is_empty() || key.ends_with(PATH_SEPARATOR) {
        return Err(WardenError::IllegalArgument(format!(
            "invalid lock key '{}'",
            key
        )));
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use warden_consistency::MemoryClusterRepository;

    use super::*;
    use crate::lock::GlobalLockDefinition;

    fn service(repo: &Arc<MemoryClusterRepository>) -> GlobalLockPersistService {
        let props = LockTypedProperties::new(HashMap::from([(
            "retry-interval-millis".to_string(),
            "10".to_string(),
        )]))
        .unwrap();
        GlobalLockPersistService::new(repo.clone(), Arc::new(DistributedLockHolder::new()))
            .with_properties(props)
    }

    fn short_lease_service(repo: &Arc<MemoryClusterRepository>) -> GlobalLockPersistService {
        let props = LockTypedProperties::new(HashMap::from([
            ("time-to-live-millis".to_string(), "50".to_string()),
            ("retry-interval-millis".to_string(), "10".to_string()),
        ]))
        .unwrap();
        GlobalLockPersistService::new(repo.clone(), Arc::new(DistributedLockHolder::new()))
            .with_properties(props)
    }

    struct NativeLock {
        key: String,
    }

    #[async_trait]
    impl DistributedLock for NativeLock {
        fn key(&self) -> &str {
            &self.key
        }

        async fn try_lock(&self, _timeout: Duration) -> Result<bool> {
            Ok(true)
        }

        async fn unlock(&self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_try_lock_then_unlock() {
        let repo = Arc::new(MemoryClusterRepository::new());
        let service = service(&repo);
        let definition = GlobalLockDefinition::new("orders_table");
        let key = definition.lock_key();

        assert!(service.try_lock(&definition, 500).await.unwrap());
        assert!(repo.lock_holder(&key).await.unwrap().is_some());

        service.unlock(&definition).await.unwrap();
        assert!(repo.lock_holder(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_same_key_uses_cached_handle() {
        let repo = Arc::new(MemoryClusterRepository::new());
        let holder = Arc::new(DistributedLockHolder::new());
        let service = GlobalLockPersistService::new(repo.clone(), holder.clone());
        let definition = GlobalLockDefinition::new("orders_table");

        assert!(service.try_lock(&definition, 0).await.unwrap());
        let cached = holder.get(&definition.lock_key()).unwrap();
        service.unlock(&definition).await.unwrap();

        assert_eq!(holder.len(), 1);
        assert!(Arc::ptr_eq(
            &cached,
            &holder.get(&definition.lock_key()).unwrap()
        ));
    }

    #[tokio::test]
    async fn test_negative_timeout_rejected() {
        let repo = Arc::new(MemoryClusterRepository::new());
        let service = service(&repo);
        let definition = GlobalLockDefinition::new("orders_table");

        let result = service.try_lock(&definition, -1).await;
        assert!(matches!(result, Err(WardenError::IllegalArgument(_))));
        // Rejected before any handle or lease exists
        assert!(repo.lock_holder(&definition.lock_key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_lock_name_rejected() {
        let repo = Arc::new(MemoryClusterRepository::new());
        let service = service(&repo);
        let definition = GlobalLockDefinition::new("");

        assert!(matches!(
            service.try_lock(&definition, 0).await,
            Err(WardenError::IllegalArgument(_))
        ));
        assert!(matches!(
            service.unlock(&definition).await,
            Err(WardenError::IllegalArgument(_))
        ));
    }

    #[tokio::test]
    async fn test_contended_lock_timeouts() {
        let repo = Arc::new(MemoryClusterRepository::new());
        let definition = GlobalLockDefinition::new("orders_table");
        // Two services with separate holders stand in for two processes
        let node_a = Arc::new(service(&repo));
        let node_b = service(&repo);

        assert!(node_a.try_lock(&definition, 0).await.unwrap());
        assert!(!node_b.try_lock(&definition, 0).await.unwrap());

        let releaser = node_a.clone();
        let release_definition = definition.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            releaser.unlock(&release_definition).await.unwrap();
        });

        assert!(node_b.try_lock(&definition, 5_000).await.unwrap());
    }

    #[tokio::test]
    async fn test_held_lock_outlives_lease_length() {
        let repo = Arc::new(MemoryClusterRepository::new());
        let definition = GlobalLockDefinition::new("orders_table");
        let node_a = short_lease_service(&repo);
        let node_b = short_lease_service(&repo);

        assert!(node_a.try_lock(&definition, 0).await.unwrap());
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(!node_b.try_lock(&definition, 0).await.unwrap());

        node_a.unlock(&definition).await.unwrap();
        assert!(node_b.try_lock(&definition, 0).await.unwrap());
    }

    #[tokio::test]
    async fn test_nested_lock_name_rejected() {
        let repo = Arc::new(MemoryClusterRepository::new());
        let holder = Arc::new(DistributedLockHolder::new());
        let service = GlobalLockPersistService::new(repo.clone(), holder.clone());
        let definition = GlobalLockDefinition::new("a/b");

        assert!(matches!(
            service.try_lock(&definition, 0).await,
            Err(WardenError::IllegalArgument(_))
        ));
        assert!(matches!(
            service.unlock(&definition).await,
            Err(WardenError::IllegalArgument(_))
        ));
        assert!(holder.is_empty());
    }

    #[tokio::test]
    async fn test_unlock_without_lock_is_safe() {
        let repo = Arc::new(MemoryClusterRepository::new());
        let service = service(&repo);

        service
            .unlock(&GlobalLockDefinition::new("never_locked"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_registry_native_handle_preferred() {
        let repo = Arc::new(MemoryClusterRepository::new());
        let definition = GlobalLockDefinition::new("orders_table");
        let native: Arc<dyn DistributedLock> = Arc::new(NativeLock {
            key: definition.lock_key(),
        });
        repo.register_lock(native.clone());

        let holder = Arc::new(DistributedLockHolder::new());
        let service = GlobalLockPersistService::new(repo.clone(), holder.clone());

        assert!(service.try_lock(&definition, 0).await.unwrap());
        assert!(Arc::ptr_eq(
            &native,
            &holder.get(&definition.lock_key()).unwrap()
        ));
        // The native handle never touched the lease table
        assert!(repo.lock_holder(&definition.lock_key()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_registry_failure_propagates_and_recovers() {
        let repo = Arc::new(MemoryClusterRepository::new());
        let holder = Arc::new(DistributedLockHolder::new());
        let service = GlobalLockPersistService::new(repo.clone(), holder.clone());
        let definition = GlobalLockDefinition::new("orders_table");

        repo.set_online(false);
        assert!(matches!(
            service.try_lock(&definition, 0).await,
            Err(WardenError::Repository(_))
        ));
        assert!(holder.is_empty());

        repo.set_online(true);
        assert!(service.try_lock(&definition, 0).await.unwrap());
        assert_eq!(holder.len(), 1);
    }
}
