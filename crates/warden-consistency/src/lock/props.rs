//! Typed lock properties

use std::collections::HashMap;
use std::time::Duration;

use tracing::warn;
use warden_common::{Result, WardenError};

/// Recognised lock property keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockPropertyKey {
    /// Lease duration granted by the registry on acquisition
    TimeToLiveMillis,
    /// Pause between registry attempts while waiting for a lock
    RetryIntervalMillis,
}

impl LockPropertyKey {
    pub const ALL: [LockPropertyKey; 2] = [
        LockPropertyKey::TimeToLiveMillis,
        LockPropertyKey::RetryIntervalMillis,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            LockPropertyKey::TimeToLiveMillis => "time-to-live-millis",
            LockPropertyKey::RetryIntervalMillis => "retry-interval-millis",
        }
    }

    pub fn default_value(&self) -> u64 {
        match self {
            LockPropertyKey::TimeToLiveMillis => 30_000,
            LockPropertyKey::RetryIntervalMillis => 100,
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.key() == key)
    }
}

impl std::fmt::Display for LockPropertyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Tuning options attached to a lock handle at creation.
///
/// Missing keys take their defaults, so an empty bag is always valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockTypedProperties {
    props: HashMap<String, String>,
    time_to_live: Duration,
    retry_interval: Duration,
}

impl Default for LockTypedProperties {
    fn default() -> Self {
        Self {
            props: HashMap::new(),
            time_to_live: Duration::from_millis(LockPropertyKey::TimeToLiveMillis.default_value()),
            retry_interval: Duration::from_millis(
                LockPropertyKey::RetryIntervalMillis.default_value(),
            ),
        }
    }
}

impl LockTypedProperties {
    pub fn new(props: HashMap<String, String>) -> Result<Self> {
        let mut result = Self::default();

        for (key, value) in &props {
            let Some(property_key) = LockPropertyKey::from_key(key) else {
                warn!(key = %key, "Ignoring unrecognised lock property");
                continue;
            };
            let millis = parse_positive_millis(property_key, value)?;
            match property_key {
                LockPropertyKey::TimeToLiveMillis => result.time_to_live = millis,
                LockPropertyKey::RetryIntervalMillis => result.retry_interval = millis,
            }
        }

        result.props = props;
        Ok(result)
    }

    pub fn time_to_live(&self) -> Duration {
        self.time_to_live
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    /// The raw property bag this instance was built from
    pub fn props(&self) -> &HashMap<String, String> {
        &self.props
    }
}

fn parse_positive_millis(key: LockPropertyKey, value: &str) -> Result<Duration> {
    match value.trim().parse::<u64>() {
        Ok(millis) if millis > 0 => Ok(Duration::from_millis(millis)),
        _ => Err(WardenError::IllegalArgument(format!(
            "lock property '{}' must be a positive integer, got '{}'",
            key, value
        ))),
    }
}
