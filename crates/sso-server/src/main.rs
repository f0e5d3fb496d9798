use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sso_auth::{Argon2Verifier, AuthService, JwtSigner};
use sso_db::SurrealStorage;
use sso_db::memory::{MemoryAppRepository, MemoryRefreshSessionStore, MemoryUserRepository};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sso_server::api::AuthApi;
use sso_server::background;
use sso_server::bootstrap::provision_apps;
use sso_server::config::{LogFormat, ServerConfig, StorageBackend};
use sso_server::router::build_app_router;
use sso_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Configuration ---
    let config = ServerConfig::from_env().context("Invalid configuration")?;

    // --- Tracing ---
    init_tracing(config.log_format);
    tracing::info!(
        host = %config.host,
        port = config.port,
        storage = ?config.storage,
        "Loaded server configuration"
    );

    // --- Storage + engine ---
    let verifier = Argon2Verifier::from_config(&config.auth);

    match config.storage {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; all data is lost on restart");
            let apps = MemoryAppRepository::new();
            provision_apps(&apps, &config.bootstrap_apps)
                .await
                .context("Failed to provision bootstrap apps")?;

            let engine = AuthService::new(
                MemoryUserRepository::new(),
                apps,
                MemoryRefreshSessionStore::new(),
                verifier,
                JwtSigner,
                config.auth.clone(),
            );
            serve(Arc::new(engine), &config).await
        }
        StorageBackend::Surreal => {
            let storage = SurrealStorage::connect(&config.db)
                .await
                .context("Failed to open SurrealDB storage")?;

            let apps = storage.apps();
            provision_apps(&apps, &config.bootstrap_apps)
                .await
                .context("Failed to provision bootstrap apps")?;

            let engine = AuthService::new(
                storage.users(),
                apps,
                storage.sessions(),
                verifier,
                JwtSigner,
                config.auth.clone(),
            );
            serve(Arc::new(engine), &config).await
        }
    }
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "sso=info,tower_http=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .init(),
    }
}

/// Bind, serve until a shutdown signal arrives, then stop the sweeper.
async fn serve<E: AuthApi>(engine: Arc<E>, config: &ServerConfig) -> anyhow::Result<()> {
    // --- Sweeper ---
    let sweep_cancel = CancellationToken::new();
    let sweep_handle = (config.sweep_interval_secs > 0).then(|| {
        tokio::spawn(background::sweeper::run(
            Arc::clone(&engine),
            Duration::from_secs(config.sweep_interval_secs),
            sweep_cancel.clone(),
        ))
    });

    // --- Router ---
    let app = build_app_router(
        AppState::new(engine),
        Duration::from_secs(config.request_timeout_secs),
    );

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().context("Invalid SSO_HOST address")?,
        config.port,
    );
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    tracing::info!(%addr, "Starting server");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    sweep_cancel.cancel();
    if let Some(handle) = sweep_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
    }

    tracing::info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl-C, starting graceful shutdown"),
        () = terminate => tracing::info!("Received SIGTERM, starting graceful shutdown"),
    }
}
