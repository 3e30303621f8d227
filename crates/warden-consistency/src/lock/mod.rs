//! Distributed lock handles
//!
//! This module provides:
//! - The lease model kept by the registry for each lock key
//! - Typed lock properties (lease duration, retry interval)
//! - The `DistributedLock` handle contract
//! - `DefaultDistributedLock`, built on the repository lease primitives

mod default;
mod model;
mod props;

pub use default::DefaultDistributedLock;
pub use model::*;
pub use props::*;

use std::time::Duration;

use async_trait::async_trait;
use warden_common::Result;

/// In-process handle for one cluster-wide mutex.
///
/// A handle is bound to a single lock key for its whole lifetime and owns
/// whatever session state the registry needs to hold and release the mutex.
#[async_trait]
pub trait DistributedLock: Send + Sync {
    /// The lock key this handle is bound to
    fn key(&self) -> &str;

    /// Try to acquire the mutex, waiting at most `timeout`.
    ///
    /// Returns `Ok(false)` when the timeout elapses; a zero timeout makes a
    /// single attempt.
    async fn try_lock(&self, timeout: Duration) -> Result<bool>;

    /// Release the mutex. Safe to call when this handle does not hold it.
    async fn unlock(&self) -> Result<()>;
}
