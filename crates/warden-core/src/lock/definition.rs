use warden_common::{GLOBAL_LOCKS_ROOT, Result, WardenError, is_valid_name, join_path};

/// Something that names a cluster-wide lock.
///
/// Equal keys name the same mutex across the whole cluster.
pub trait LockDefinition: Send + Sync {
    fn lock_key(&self) -> String;

    /// Reject definitions that cannot name a lock
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Global lock stored under `/lock/global/locks/<name>`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GlobalLockDefinition {
    lock_name: String,
}

impl GlobalLockDefinition {
    pub fn new(lock_name: impl Into<String>) -> Self {
        Self {
            lock_name: lock_name.into(),
        }
    }

    pub fn lock_name(&self) -> &str {
        &self.lock_name
    }
}

impl LockDefinition for GlobalLockDefinition {
    fn lock_key(&self) -> String {
        join_path(GLOBAL_LOCKS_ROOT, &self.lock_name)
    }

    /// The name must be a single node directly under the global locks root
    fn validate(&self) -> Result<()> {
        if is_valid_name(&self.lock_name) {
            Ok(())
        } else {
            Err(WardenError::IllegalArgument(format!(
                "invalid lock name '{}'",
                self.lock_name
            )))
        }
    }
}
