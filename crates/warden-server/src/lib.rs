//! Warden server - process bootstrap
//!
//! Logging setup and domain event subscribers used by the `warden-server`
//! binary.

pub mod startup;
