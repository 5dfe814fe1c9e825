use std::sync::Arc;
use std::time::Duration;

use healthgate_backend::auth_builder::build_authorizer_from_config;
use healthgate_backend::state::AppState;
use tokio::sync::RwLock;

use crate::tracing_setup::ReloadHandle;

/// Spawn the background configuration reloader task.
///
/// This task periodically re-reads the configuration and hot-reloads:
/// - Log level
/// - Authorizer
pub fn spawn_config_reloader(
    config_path: Option<String>,
    interval: Duration,
    shared_config: Arc<RwLock<healthgate_config::Config>>,
    reload_handle: ReloadHandle,
    app_state: Arc<AppState>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately; the startup config is already loaded.
        ticker.tick().await;

        loop {
            ticker.tick().await;

            let new_cfg = match healthgate_config::load_config(config_path.as_deref()) {
                Ok(cfg) => cfg,
                Err(e) => {
                    tracing::error!(%e, "failed to reload config file");
                    continue;
                }
            };
            if let Err(e) = healthgate_config::validate_config(&new_cfg) {
                tracing::error!(%e, "loaded config failed validation, ignoring");
                continue;
            }

            let mut guard = shared_config.write().await;
            if *guard == new_cfg {
                continue;
            }
            let old = std::mem::replace(&mut *guard, new_cfg.clone());
            drop(guard);

            tracing::info!("configuration changed, applying");
            reload_log_level(&old, &new_cfg, &reload_handle);
            reload_authorizer(&old, &new_cfg, &app_state);

            if old.server != new_cfg.server
                || old.auth.timeout_ms != new_cfg.auth.timeout_ms
                || old.reload != new_cfg.reload
            {
                tracing::warn!("server, timeout or reload settings changed; restart to apply");
            }
        }
    })
}

fn reload_log_level(
    old: &healthgate_config::Config,
    new: &healthgate_config::Config,
    reload_handle: &ReloadHandle,
) {
    if old.logging.level == new.logging.level {
        return;
    }
    match reload_handle(tracing_subscriber::EnvFilter::new(&new.logging.level)) {
        Ok(()) => tracing::info!(level = %new.logging.level, "log level reloaded"),
        Err(e) => tracing::error!(%e, "failed to reload log level"),
    }
}

fn reload_authorizer(
    old: &healthgate_config::Config,
    new: &healthgate_config::Config,
    state: &AppState,
) {
    if old.auth.username == new.auth.username
        && old.auth.password == new.auth.password
        && old.auth.password_hash == new.auth.password_hash
    {
        return;
    }
    match build_authorizer_from_config(new) {
        Ok((authorizer, info)) => {
            state.swap_authorizer(authorizer);
            tracing::info!(
                auth_mode = info.mode,
                auth_username = %info.username,
                key_fingerprint = %info.fingerprint,
                "authorizer reloaded"
            );
        }
        Err(reason) => {
            tracing::error!(%reason, "keeping previous authorizer");
        }
    }
}
