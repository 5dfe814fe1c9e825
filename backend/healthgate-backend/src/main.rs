//! healthgate server
//!
//! Entry point with configuration loading, tracing setup and HTTP server startup.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;

use healthgate_backend::auth_builder::build_authorizer_from_config;
use healthgate_backend::state::AppState;

mod cli;
mod config_reloader;
mod tracing_setup;

use cli::{CliArgs, Command};
use tracing_setup::install_tracing_from_config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse_args();

    if let Some(Command::HashPassword { password }) = &args.command {
        let hash = healthgate_auth::hash_password(password)
            .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?;
        println!("{hash}");
        return Ok(());
    }

    eprintln!("[STARTUP] Loading config from: {:?}", args.config_path);
    let config = healthgate_config::load_config(args.config_path.as_deref())
        .context("failed to load configuration")?;
    healthgate_config::validate_config(&config).context("invalid configuration")?;

    let reload_handle = install_tracing_from_config(&config.logging)?;
    tracing::info!(
        config = %serde_json::to_string(&config).unwrap_or_default(),
        "configuration loaded"
    );

    let (authorizer, info) =
        build_authorizer_from_config(&config).map_err(|reason| anyhow::anyhow!(reason))?;
    tracing::info!(
        auth_mode = info.mode,
        auth_username = %info.username,
        key_fingerprint = %info.fingerprint,
        "authorization configured"
    );
    if info.mode == "plaintext" && info.username == "admin" {
        tracing::warn!("using the built-in admin identity; set auth.password_hash for production");
    }

    let state = Arc::new(AppState::new(
        authorizer,
        Duration::from_millis(config.auth.timeout_ms),
    ));

    if config.reload.enabled {
        let shared_config = Arc::new(tokio::sync::RwLock::new(config.clone()));
        config_reloader::spawn_config_reloader(
            args.config_path.clone(),
            Duration::from_secs(config.reload.interval_secs),
            shared_config,
            reload_handle,
            state.clone(),
        );
        tracing::info!(
            interval_secs = config.reload.interval_secs,
            "config reloader spawned"
        );
    }

    let app = healthgate_backend::build_router_with_body_limit(
        state,
        config.server.body_limit_bytes,
    );

    let listener = TcpListener::bind((config.server.host.as_str(), config.server.port))
        .await
        .with_context(|| {
            format!(
                "failed to bind {}:{}",
                config.server.host, config.server.port
            )
        })?;
    tracing::info!(addr = %listener.local_addr()?, "server listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(%e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
