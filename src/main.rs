//! Book Club Server
//!
//! Starts the store and the HTTP server, then stops both on Ctrl+C or SIGTERM.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookclub_server::{
    config::AppConfig,
    database::Database,
    runtime::{shutdown_signal, RunState},
    server::WebServer,
    services::Services,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("bookclub_server={},tower_http=debug", config.logging.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Starting Book Club Server v{}", env!("CARGO_PKG_VERSION"));

    let state = RunState::new();

    // Stop reconnecting as soon as a signal arrives, even before serving
    let signal_state = state.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        signal_state.stop();
    });

    let mut database = Database::new(config.database.clone());
    let repository = database.start(&state).await?;

    let services = Services::new(repository, config.auth.clone());
    let mut server = WebServer::new(AppState {
        config: Arc::new(config),
        services: Arc::new(services),
    });
    server.start().await?;

    state.stopped().await;

    server.stop().await?;
    database.stop().await;

    tracing::info!("Shutdown complete");
    Ok(())
}
