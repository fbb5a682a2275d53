//! # routerdeskd: routerdesk daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (`routerdesk.toml`, env vars)
//! - Install the `tracing` subscriber
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct repository implementations (adapters)
//! - Construct the configuration backend, injecting repositories via port traits
//! - Build the axum router around the backend
//! - Bind to a TCP port and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer: no domain logic belongs here.

mod config;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use routerdesk_adapter_http_axum::state::AppState;
use routerdesk_adapter_storage_sqlite_sqlx::{
    Config as DatabaseConfig, SqliteBlockedNetworkRepository, SqliteDhcpServerRepository,
    SqliteLeaseRepository, SqliteServiceConfigRepository, SqliteStaticMappingRepository,
};
use routerdesk_app::backend::AdminBackend;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading routerdesk.toml")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Database
    let db = DatabaseConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await
    .with_context(|| format!("opening database {}", config.database_url()))?;
    let pool = db.pool().clone();

    // Repositories
    let servers = SqliteDhcpServerRepository::new(pool.clone());
    let mappings = SqliteStaticMappingRepository::new(pool.clone());
    let leases = SqliteLeaseRepository::new(pool.clone());
    let configs = SqliteServiceConfigRepository::new(pool.clone());
    let blocked = SqliteBlockedNetworkRepository::new(pool);

    // HTTP
    let backend = AdminBackend::new(servers, mappings, leases, configs, blocked);
    let state = AppState::new(backend, config.interfaces.known.clone());
    let app = routerdesk_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!(address = %bind_addr, "routerdeskd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("routerdeskd stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or on SIGTERM where available.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
