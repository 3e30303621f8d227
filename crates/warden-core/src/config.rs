//! Configuration management for Warden
//!
//! Sources are layered: built-in defaults, then a YAML/TOML file, then
//! `WARDEN_*` environment variables (`__` separates nested keys, e.g.
//! `WARDEN_LOCK__TIME_TO_LIVE_MS=5000`).

use std::collections::HashMap;
use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use warden_common::{DEFAULT_ORCHESTRATION_NAME, Result, WardenError, is_valid_name};
use warden_consistency::{LockPropertyKey, LockTypedProperties};

/// Config file looked up when no explicit path is given (optional)
pub const DEFAULT_CONFIG_FILE: &str = "conf/warden";

const ENV_PREFIX: &str = "WARDEN";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    pub time_to_live_ms: u64,
    pub retry_interval_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            time_to_live_ms: LockPropertyKey::TimeToLiveMillis.default_value(),
            retry_interval_ms: LockPropertyKey::RetryIntervalMillis.default_value(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Buffered events per local bus before slow subscribers lag
    pub event_bus_capacity: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            event_bus_capacity: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            ansi: true,
        }
    }
}

/// Application configuration loaded from config files and environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WardenConfig {
    /// Orchestration name; roots every state and config path in the registry
    pub name: String,
    pub lock: LockConfig,
    pub watch: WatchConfig,
    pub logging: LoggingConfig,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_ORCHESTRATION_NAME.to_string(),
            lock: LockConfig::default(),
            watch: WatchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl WardenConfig {
    /// Load configuration from `path` (required if given, otherwise the
    /// optional default file) and the environment, then validate it.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config: WardenConfig = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|config| config.try_deserialize())
            .map_err(|e| {
                WardenError::IllegalArgument(format!("failed to load configuration: {}", e))
            })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !is_valid_name(&self.name) {
            return Err(WardenError::IllegalArgument(format!(
                "invalid orchestration name '{}'",
                self.name
            )));
        }
        if self.watch.event_bus_capacity == 0 {
            return Err(WardenError::IllegalArgument(
                "watch.event_bus_capacity must be positive".to_string(),
            ));
        }
        self.lock_properties().map(|_| ())
    }

    /// Lock settings as the typed property bag handed to new lock handles
    pub fn lock_properties(&self) -> Result<LockTypedProperties> {
        LockTypedProperties::new(HashMap::from([
            (
                LockPropertyKey::TimeToLiveMillis.key().to_string(),
                self.lock.time_to_live_ms.to_string(),
            ),
            (
                LockPropertyKey::RetryIntervalMillis.key().to_string(),
                self.lock.retry_interval_ms.to_string(),
            ),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Duration;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = WardenConfig::default();
        assert_eq!(config.name, "orchestration");
        assert_eq!(config.lock.time_to_live_ms, 30_000);
        assert_eq!(config.lock.retry_interval_ms, 100);
        assert_eq!(config.watch.event_bus_capacity, 64);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let file = write_config(
            "name: demo\nlock:\n  time_to_live_ms: 5000\nlogging:\n  level: debug\n",
        );
        let config = WardenConfig::load(Some(file.path())).unwrap();

        assert_eq!(config.name, "demo");
        assert_eq!(config.lock.time_to_live_ms, 5000);
        // Unset keys keep their defaults
        assert_eq!(config.lock.retry_interval_ms, 100);
        assert_eq!(config.logging.level, "debug");

        let props = config.lock_properties().unwrap();
        assert_eq!(props.time_to_live(), Duration::from_millis(5000));
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let result = WardenConfig::load(Some(Path::new("/nonexistent/warden.yaml")));
        assert!(matches!(result, Err(WardenError::IllegalArgument(_))));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let file = write_config("name: \"bad/name\"\n");
        assert!(WardenConfig::load(Some(file.path())).is_err());

        let file = write_config("lock:\n  retry_interval_ms: 0\n");
        assert!(WardenConfig::load(Some(file.path())).is_err());

        let file = write_config("watch:\n  event_bus_capacity: 0\n");
        assert!(WardenConfig::load(Some(file.path())).is_err());
    }
}
