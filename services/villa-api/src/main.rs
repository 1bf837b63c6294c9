//! Villa API server
//!
//! Serves the villa resource over HTTP, backed by either an in-memory
//! collection or a Postgres table.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use villa_api::{
    api,
    config::{self, StoreBackend},
    db::Database,
    service::VillaService,
    state::AppState,
    store::{MemoryVillaStore, VillaStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = config::Config::from_env()?;

    // Initialize tracing (prefer RUST_LOG, fallback to VILLA_LOG_LEVEL)
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting villa API");
    info!(
        listen_addr = %config.listen_addr,
        store = ?config.store,
        unique_names_on_update = config.service.unique_names_on_update,
        "Configuration loaded"
    );

    let store = build_store(&config).await?;
    let service = VillaService::new(store, config.service.clone());
    let app = api::create_router(AppState::new(service));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Listening for connections");

    let mut server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let mut shutdown_rx = shutdown_rx;
                loop {
                    if *shutdown_rx.borrow() {
                        break;
                    }
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
    });

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received shutdown signal");
            let _ = shutdown_tx.send(true);

            let drain_timeout = std::time::Duration::from_secs(10);
            if tokio::time::timeout(drain_timeout, &mut server_handle).await.is_err() {
                warn!("HTTP server did not drain in time");
            }
        }
        result = &mut server_handle => {
            match result {
                Ok(Ok(())) => info!("Server exited normally"),
                Ok(Err(e)) => error!(error = %e, "Server error"),
                Err(e) => error!(error = %e, "Server task panicked"),
            }
        }
    }

    info!("Villa API shutdown complete");
    Ok(())
}

/// Construct the configured storage backend.
async fn build_store(config: &config::Config) -> Result<Arc<dyn VillaStore>> {
    match config.store {
        StoreBackend::Memory => {
            let store = if config.seed {
                info!("Seeding in-memory store");
                MemoryVillaStore::seeded()
            } else {
                MemoryVillaStore::new()
            };
            Ok(Arc::new(store))
        }
        StoreBackend::Postgres => {
            let db = match Database::connect(&config.database).await {
                Ok(db) => {
                    info!("Database connection established");
                    db
                }
                Err(e) => {
                    error!(error = %e, "Failed to connect to database");
                    return Err(e.into());
                }
            };

            if config.run_migrations {
                if let Err(e) = db.run_migrations().await {
                    error!(error = %e, "Failed to run migrations");
                    return Err(e.into());
                }
            }

            Ok(Arc::new(db.villa_store()))
        }
    }
}
