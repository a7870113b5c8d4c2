//! # habridged — habridge daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Load configuration (`habridge.toml` and environment variables)
//! - Initialize logging
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct the hub client, event stream and catalog
//! - Start the ingestion loop in the background
//! - Build the axum router and serve it
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::Notify;
use tracing_subscriber::EnvFilter;

use habridge_adapter_hass::{HassClient, HassEventStream};
use habridge_adapter_http_axum::state::AppState;
use habridge_adapter_storage_sqlite_sqlx::SqliteEntityRepository;
use habridge_app::broadcaster::Broadcaster;
use habridge_app::ingestion::IngestionLoop;
use habridge_app::services::catalog::StateCatalog;
use habridge_app::services::dispatcher::CommandDispatcher;
use habridge_app::services::service_registry::ServiceRegistry;

use crate::config::Config;

/// How long open connections (event streams included) get to finish once
/// shutdown starts.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Database
    let db = habridge_adapter_storage_sqlite_sqlx::Config {
        database_url: config.database.url.clone(),
        max_connections: config.database.max_connections,
    }
    .build()
    .await
    .context("failed to open database")?;
    let entity_repo = SqliteEntityRepository::new(db.pool().clone());

    // Hub
    let hub = Arc::new(HassClient::new(&config.hub).context("failed to build hub client")?);
    let events = HassEventStream::from_config(&config.hub).context("invalid hub url")?;

    // Shared services
    let catalog = Arc::new(StateCatalog::new(entity_repo));
    let broadcaster = Arc::new(Broadcaster::new(config.broadcast.capacity));
    let services = Arc::new(ServiceRegistry::new());

    let ingestion = IngestionLoop::new(
        Arc::clone(&hub),
        events,
        Arc::clone(&catalog),
        Arc::clone(&broadcaster),
        Arc::clone(&services),
    )
    .with_backoff(config.ingestion.backoff())
    .start();

    // HTTP
    let state = AppState::new(catalog, CommandDispatcher::new(hub), broadcaster, services);
    let app = habridge_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(hub = %config.hub.url, "habridged listening on http://{bind_addr}");

    let stop = Arc::new(Notify::new());
    let graceful = {
        let stop = Arc::clone(&stop);
        async move { stop.notified().await }
    };
    let server = axum::serve(listener, app).with_graceful_shutdown(graceful);
    let mut server = std::pin::pin!(server.into_future());

    tokio::select! {
        result = &mut server => result.context("server error")?,
        () = shutdown_signal() => {
            tracing::info!("shutdown requested, draining connections");
            stop.notify_one();
            match tokio::time::timeout(SHUTDOWN_GRACE, server).await {
                Ok(result) => result.context("server error")?,
                Err(_) => tracing::warn!("connections still open after grace period, closing"),
            }
        }
    }

    ingestion.abort();
    tracing::info!("habridged stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(%err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
