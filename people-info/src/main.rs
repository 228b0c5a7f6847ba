//! people-info - Main entry point
//!
//! Loads configuration, opens the person database, wires the enrichment
//! clients and serves the REST API until Ctrl+C / SIGTERM.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use people_common::config::ServiceConfig;
use people_common::db::init_database;
use people_info::{build_router, AppState, EnrichmentOrchestrator, SqlitePersonStore};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use url::Url;

/// Command-line arguments for people-info
#[derive(Parser, Debug)]
#[command(name = "people-info")]
#[command(about = "Person profile service with attribute enrichment")]
#[command(version)]
struct Args {
    /// TOML config file (default: <config dir>/people-info/config.toml)
    #[arg(short, long, env = "PEOPLE_INFO_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:8080
    #[arg(short, long, env = "PEOPLE_INFO_BIND")]
    bind: Option<String>,

    /// SQLite database file
    #[arg(short, long, env = "PEOPLE_INFO_DATABASE")]
    database: Option<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(long, env = "PEOPLE_INFO_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServiceConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }
    if let Some(database) = args.database {
        config.database.path = database;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting people-info v{}", env!("CARGO_PKG_VERSION"));
    match &config.source {
        Some(path) => info!("Configuration: {}", path.display()),
        None => warn!("No config file found, using compiled defaults"),
    }

    config.validate().context("Invalid configuration")?;

    info!("Database path: {}", config.database.path.display());
    let pool = init_database(&config.database.path, config.database.max_connections)
        .await
        .context("Failed to open database")?;

    let enrichment = EnrichmentOrchestrator::from_config(&config.enrichment)
        .context("Failed to build enrichment clients")?;
    info!(
        age = %config.enrichment.age_url,
        gender = %config.enrichment.gender_url,
        nationality = %config.enrichment.nationality_url,
        call_timeout_ms = config.enrichment.call_timeout_ms,
        "Enrichment services configured"
    );

    let public_base_url = config
        .server
        .public_base_url
        .as_deref()
        .map(Url::parse)
        .transpose()
        .context("Invalid public base URL")?;

    let store = SqlitePersonStore::new(pool.clone(), config.pagination);
    let state = AppState::new(Arc::new(store), Arc::new(enrichment), config.pagination)
        .with_public_base_url(public_base_url)
        .with_request_timeout(Duration::from_secs(config.server.request_timeout_secs));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.server.bind_address.as_str())
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.bind_address))?;
    info!("people-info listening on http://{}", config.server.bind_address);
    info!("Health check: http://{}/health", config.server.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    pool.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
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
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
