//! Cluster-wide locks
//!
//! - `holder`: one lock handle per key per process
//! - `definition`: how callers name a lock
//! - `persist`: `try_lock` / `unlock` routed through the holder

mod definition;
mod holder;
mod persist;

pub use definition::{GlobalLockDefinition, LockDefinition};
pub use holder::DistributedLockHolder;
pub use persist::GlobalLockPersistService;
