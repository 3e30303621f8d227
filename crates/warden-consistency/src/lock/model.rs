//! Lock lease model kept by the registry

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Lock state enumeration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockState {
    /// Lock is available
    #[default]
    Unlocked,
    /// Lock is held by an owner
    Locked,
}

/// Lease record for a single lock key
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockLease {
    /// Lock key (registry path)
    pub key: String,
    /// Current lock state
    pub state: LockState,
    /// Current owner (handle owner id)
    #[serde(default)]
    pub owner: Option<String>,
    /// Fence token, incremented on every acquisition
    #[serde(default)]
    pub fence_token: u64,
    /// Lock acquisition timestamp (Unix millis)
    #[serde(default)]
    pub acquired_at: Option<i64>,
    /// Lease expiration timestamp (Unix millis)
    #[serde(default)]
    pub expires_at: Option<i64>,
}

impl LockLease {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            state: LockState::Unlocked,
            owner: None,
            fence_token: 0,
            acquired_at: None,
            expires_at: None,
        }
    }

    /// Check if the lease is currently held and not expired
    pub fn is_held(&self) -> bool {
        self.state == LockState::Locked && !self.is_expired()
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| current_timestamp() >= expires_at)
    }

    /// Check if the given owner holds this lease
    pub fn is_owned_by(&self, owner: &str) -> bool {
        self.is_held() && self.owner.as_deref() == Some(owner)
    }

    /// Acquire the lease for `owner`. Not re-entrant: a held lease is refused
    /// even for its current owner.
    pub fn acquire(&mut self, owner: impl Into<String>, ttl: Duration) -> bool {
        if self.is_held() {
            return false;
        }

        let now = current_timestamp();
        self.state = LockState::Locked;
        self.owner = Some(owner.into());
        self.acquired_at = Some(now);
        self.expires_at = Some(now.saturating_add(ttl.as_millis() as i64));
        self.fence_token += 1;
        true
    }

    /// Extend a held lease by `ttl` from now. Refused once the lease has
    /// expired or passed to another owner.
    pub fn renew(&mut self, owner: &str, ttl: Duration) -> bool {
        if !self.is_owned_by(owner) {
            return false;
        }

        self.expires_at = Some(current_timestamp().saturating_add(ttl.as_millis() as i64));
        true
    }

    /// Release the lease if `owner` holds it
    pub fn release(&mut self, owner: &str) -> bool {
        if !self.is_owned_by(owner) {
            return false;
        }

        self.state = LockState::Unlocked;
        self.owner = None;
        self.acquired_at = None;
        self.expires_at = None;
        true
    }
}

fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
