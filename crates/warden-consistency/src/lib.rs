//! Warden Consistency - the registry side of cluster coordination
//!
//! This crate provides:
//! - The `ClusterPersistRepository` contract every registry backend implements
//! - Change notifications delivered per watch registration
//! - Lease-based distributed locks and their typed properties
//! - An in-memory registry for standalone mode and tests

pub mod lock;
pub mod memory;
pub mod repository;

// Re-export lock types
pub use lock::{
    DefaultDistributedLock, DistributedLock, LockLease, LockPropertyKey, LockState,
    LockTypedProperties,
};

pub use memory::MemoryClusterRepository;
pub use repository::{ClusterPersistRepository, DataChangedEvent, DataChangedType};
