use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use creel::catalog::CatalogClient;
use creel::config::Config;
use creel::AppState;

#[derive(Parser, Debug)]
#[command(name = "creel")]
#[command(author, version, about = "A small self-hosted fish-catch tracker", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "creel.toml")]
    config: PathBuf,

    /// Override log level
    #[arg(short, long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;

    let log_level = cli
        .log_level
        .as_ref()
        .unwrap_or(&config.logging.level)
        .clone();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Creel v{}", env!("CARGO_PKG_VERSION"));

    std::fs::create_dir_all(&config.server.data_dir)?;

    let db = creel::db::init(&config.server.data_dir).await?;

    // Seed the fish catalog once. A failed fetch is fatal to the load
    // only; the server still starts and a restart retries the seed.
    if config.catalog.seed_on_startup {
        let client = CatalogClient::new(config.catalog.source_url.clone());
        if let Err(e) = creel::catalog::load_catalog(&db, &client).await {
            tracing::warn!(error = %e, "Catalog seed failed; continuing without it");
        }
    }

    let state = Arc::new(AppState::new(config.clone(), db));

    let app = creel::api::create_router(state)
        .nest_service("/static", ServeDir::new("static"));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
