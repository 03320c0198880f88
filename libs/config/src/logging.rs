//! Tracing subscriber installation

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use crate::settings::LoggingConfig;

/// Install the global subscriber
///
/// `RUST_LOG` wins over `config.level` when set.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| anyhow!("Invalid log level '{}': {}", config.level, e))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| anyhow!("Failed to install tracing subscriber: {}", e))
}
