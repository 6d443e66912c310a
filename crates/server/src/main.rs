use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use helpdesk_core::{
    load_config, ticket::seed_if_empty, validate_config, Config, DocumentTicketStore,
    SqliteTicketStore, StorageBackend, TicketStore,
};
use helpdesk_server::{create_router, AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("HELPDESK_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Invalid configuration")?;

    info!("Helpdesk v{} starting", VERSION);

    let ticket_store = open_ticket_store(&config)?;
    info!(
        backend = ticket_store.backend_name(),
        path = %config.database.path.display(),
        "Ticket store ready"
    );

    if config.database.seed {
        let seeded = seed_if_empty(ticket_store.as_ref()).context("Failed to seed ticket store")?;
        if seeded == 0 {
            info!("Ticket store already populated, skipping seed data");
        }
    }

    let addr = SocketAddr::new(config.server.host, config.server.port);
    let state = Arc::new(AppState::new(config, ticket_store));
    let app = create_router(state);

    // Start server
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

fn open_ticket_store(config: &Config) -> Result<Arc<dyn TicketStore>> {
    let path = &config.database.path;
    let store: Arc<dyn TicketStore> = match config.database.backend {
        StorageBackend::Relational => Arc::new(
            SqliteTicketStore::new(path)
                .with_context(|| format!("Failed to open relational store at {:?}", path))?,
        ),
        StorageBackend::Document => Arc::new(
            DocumentTicketStore::new(path)
                .with_context(|| format!("Failed to open document store at {:?}", path))?,
        ),
    };
    Ok(store)
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
