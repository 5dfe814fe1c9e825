use std::sync::Arc;

use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, reload, EnvFilter};

/// Type alias for the reload handle returned by tracing initialization.
pub type ReloadHandle = Arc<dyn Fn(EnvFilter) -> Result<(), String> + Send + Sync>;

/// Initialize tracing from configuration. `RUST_LOG` wins over `cfg.level`.
///
/// Returns a reload handle that can be used to update the log level at runtime.
pub fn install_tracing_from_config(
    cfg: &healthgate_config::LoggingConfig,
) -> anyhow::Result<ReloadHandle> {
    let env_filter_str = std::env::var("RUST_LOG").unwrap_or_else(|_| cfg.level.clone());
    let (filter_layer, reload_handle) = reload::Layer::new(EnvFilter::new(&env_filter_str));
    let registry = tracing_subscriber::registry().with(filter_layer);

    if cfg.json {
        registry
            .with(fmt::layer().json().with_timer(ChronoUtc::rfc_3339()))
            .try_init()?;
    } else {
        registry.with(fmt::layer()).try_init()?;
    }

    Ok(Arc::new(move |filter| {
        reload_handle
            .reload(filter)
            .map_err(|e| format!("reload failed: {e}"))
    }))
}
