//! Shared setup for the curriplan binaries.

use curriplan_core::config::{Config, Settings};
use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber; `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let config = Config::load().map_err(|e| {
        tracing::error!(error = %e, "failed to load configuration");
        e
    })?;
    Ok(config.settings()?)
}
