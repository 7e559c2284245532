//! Tracing subscriber installation

use planora_domain::{LoggingConfig, PlanoraError, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// Build the event filter: `RUST_LOG` when set, otherwise the configured level.
///
/// # Errors
/// `PlanoraError::Config` if the configured level is not a valid directive.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level).map_err(|e| {
            PlanoraError::Config(format!("Invalid log level {:?}: {}", config.level, e))
        }),
    }
}

/// Install the global subscriber.
///
/// Calling this again after a subscriber is installed is a no-op.
///
/// # Errors
/// `PlanoraError::Config` if the level directive is invalid.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;
    let registry = Registry::default().with(filter);

    let installed = if config.json {
        registry.with(fmt::layer().json().with_current_span(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()
    };

    match installed {
        Ok(()) => {
            tracing::info!(level = %config.level, json = config.json, "tracing initialized");
            Ok(())
        }
        Err(err) => {
            tracing::debug!(error = %err, "tracing subscriber already installed");
            Ok(())
        }
    }
}
