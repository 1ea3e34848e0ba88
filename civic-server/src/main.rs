//! civic-server - civic feedback ingestion and analytics service
//!
//! Accepts free-text feedback and CSV/TXT uploads, enriches each submission
//! in the background (translation, sentiment, inclusive rewrite, demographic
//! tags) and serves dashboard analytics and CSV export.

use anyhow::{Context, Result};
use civic_common::config::{
    load_toml_config, locate_config_file, CliOverrides, ServiceConfig, StoragePreference,
    TomlConfig,
};
use civic_server::services::OpenAiClient;
use civic_server::storage::select_store;
use civic_server::{build_router, AppState};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Command-line arguments for civic-server
#[derive(Parser, Debug)]
#[command(name = "civic-server")]
#[command(about = "Civic feedback ingestion, enrichment and analytics service")]
#[command(version)]
struct Args {
    /// Path to TOML config file
    #[arg(short, long, env = "CIVIC_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address (overrides HOST and config file)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT and config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Storage backend: auto, memory, sql or hosted
    #[arg(long)]
    storage: Option<StoragePreference>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional
    let dotenv_path = dotenvy::dotenv().ok();

    let args = Args::parse();

    let config_path = locate_config_file(args.config.as_deref())?;
    let toml_config = match &config_path {
        Some(path) => load_toml_config(path)?,
        None => TomlConfig::default(),
    };

    // RUST_LOG wins over the configured level
    let default_filter = toml_config.logging.level_or_default();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting civic-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    if let Some(path) = &dotenv_path {
        info!("Loaded environment from {}", path.display());
    }
    match &config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file found, using environment and defaults"),
    }

    let cli = CliOverrides {
        host: args.host,
        port: args.port,
        storage: args.storage,
    };
    let config = ServiceConfig::resolve(&cli, &toml_config).context("Invalid configuration")?;
    info!(log_level = %config.log_level, max_upload_bytes = config.max_upload_bytes, "Configuration resolved");

    let store = select_store(&config).await;
    info!(backend = %store.backend(), "Storage ready");

    let language_model = OpenAiClient::new(&config.language_model)
        .context("Failed to build language model client")?;
    if language_model.is_configured() {
        info!(
            model = %config.language_model.model,
            timeout_secs = config.language_model.timeout_secs,
            "Language model client configured"
        );
    } else {
        warn!("OPENAI_API_KEY not set; enrichment will use fallback values");
    }

    let state = AppState::new(store, Arc::new(language_model), config.max_upload_bytes);
    let app = build_router(state);

    let bind_address = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!("civic-server listening on http://{}", bind_address);
    info!("Health check: http://{}/health", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("civic-server stopped");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
