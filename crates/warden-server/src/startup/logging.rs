//! Console logging setup.
//!
//! `RUST_LOG` wins over the configured level when set; a malformed value is
//! an error rather than silently ignored.

use std::env::{self, VarError};

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};
use warden_core::config::LoggingConfig;

/// Filter from `RUST_LOG`, falling back to the configured level
pub fn build_filter(config: &LoggingConfig) -> anyhow::Result<EnvFilter> {
    match env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) => filter_from(Some(&directives), config),
        Err(VarError::NotPresent) => filter_from(None, config),
        Err(e) => Err(e).context("RUST_LOG is not valid unicode"),
    }
}

fn filter_from(
    env_directives: Option<&str>,
    config: &LoggingConfig,
) -> anyhow::Result<EnvFilter> {
    match env_directives {
        Some(directives) => EnvFilter::try_new(directives)
            .with_context(|| format!("invalid RUST_LOG directives '{}'", directives)),
        None => EnvFilter::try_new(&config.level)
            .with_context(|| format!("invalid logging.level '{}'", config.level)),
    }
}

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_ansi(config.ansi)
        .with_filter(build_filter(config)?);

    tracing_subscriber::registry().with(console_layer).try_init()?;
    Ok(())
}
