//! Logging setup.

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::LoggingConfig;

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` wins over `[logging].level` when set. Output goes to stderr
/// so command output on stdout stays clean for piping.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| anyhow::anyhow!("invalid logging.level '{}': {}", config.level, e))?,
    };

    let console_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    Registry::default()
        .with(env_filter)
        .with(console_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))?;

    Ok(())
}
