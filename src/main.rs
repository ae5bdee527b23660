//! Listing router service.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────┐
//!                          │                LISTING ROUTER                │
//!                          │                                              │
//!     listing operation    │  ┌────────────┐    ┌──────────────┐          │
//!     ─────────────────────┼─▶│  service   │───▶│   routing    │          │
//!                          │  │  facade    │    │   policy     │          │
//!                          │  └─────┬──────┘    └──────────────┘          │
//!                          │        │                                     │
//!                          │        ▼                                     │
//!                          │  ┌────────────┐    ┌──────────────┐          │
//!                          │  │  circuit   │───▶│   remote     │──────────┼──▶ listings
//!                          │  │  breaker   │    │   (reqwest)  │          │    service
//!                          │  └─────┬──────┘    └──────────────┘          │
//!                          │        │ fallback                            │
//!                          │        ▼                                     │
//!                          │  ┌────────────┐    ┌──────────────┐          │
//!                          │  │   local    │───▶│   search     │          │
//!                          │  │   store    │    │   index      │          │
//!                          │  └────────────┘    └──────────────┘          │
//!                          │                                              │
//!                          │  config (+watcher) · observability · admin   │
//!                          └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::net::TcpListener;

use listing_router::admin::{setup_admin_router, AdminState};
use listing_router::backend::{HttpRemoteBackend, MemoryListingStore};
use listing_router::config::watcher::ConfigWatcher;
use listing_router::config::{apply_env_overrides, load_config, RouterConfig};
use listing_router::observability::{init_logging, init_metrics, RouteMetrics};
use listing_router::search::MemorySearchIndex;
use listing_router::ServiceFacade;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("LISTINGS_CONFIG").ok())
        .map(PathBuf::from);

    let mut config = match &config_path {
        Some(path) => load_config(path)?,
        None => RouterConfig::default(),
    };

    init_logging(&config.observability)?;
    apply_env_overrides(&mut config);

    tracing::info!("listing-router v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        config_path = ?config_path,
        remote_enabled = config.routing.remote_enabled,
        canary_percentage = config.routing.canary_percentage,
        remote_url = %config.remote.base_url,
        timeout_ms = config.remote.timeout_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let index = Arc::new(MemorySearchIndex::new());
    let local = Arc::new(MemoryListingStore::new(index.clone()));
    let remote = Arc::new(HttpRemoteBackend::new(&config.remote)?);
    let metrics = Arc::new(RouteMetrics::new());
    let facade = Arc::new(ServiceFacade::new(
        local,
        remote,
        index,
        metrics.clone(),
        &config,
    ));

    // The notify handle must outlive the reload task.
    let _watcher = match &config_path {
        Some(path) => {
            let (watcher, mut updates) = ConfigWatcher::new(path);
            let handle = watcher.run()?;
            let facade = facade.clone();
            tokio::spawn(async move {
                while let Some(new_config) = updates.recv().await {
                    facade.reload_routing(&new_config);
                }
            });
            Some(handle)
        }
        None => None,
    };

    if !config.admin.enabled {
        tracing::info!("Admin API disabled");
        shutdown_signal().await;
        tracing::info!("Shutdown complete");
        return Ok(());
    }

    let listener = TcpListener::bind(&config.admin.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Admin API listening");

    let app = setup_admin_router(AdminState::new(facade, metrics, &config.admin.api_key));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
