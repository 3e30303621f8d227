//! Warden Common - Shared types and utilities
//!
//! This crate provides the foundational pieces used across all Warden components:
//! - Error type and result alias
//! - Registry node path constants
//! - Validation helpers for lock names and orchestration names

pub mod error;
pub mod utils;

// Re-exports for convenience
pub use error::{Result, WardenError};
pub use utils::{is_valid_name, join_path};

/// Root node of all global locks in the registry
pub const GLOBAL_LOCKS_ROOT: &str = "/lock/global/locks";

/// Path separator used by registry keys
pub const PATH_SEPARATOR: &str = "/";

/// Value stored on a data source state node when the data source is disabled
pub const DISABLED_STATE: &str = "disabled";

/// Default orchestration name when none is configured
pub const DEFAULT_ORCHESTRATION_NAME: &str = "orchestration";
