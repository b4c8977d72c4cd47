pub mod api;
pub mod app_state;
pub mod config;
pub mod db;
pub mod models;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::api::server::ServerError;
use crate::app_state::PortalState;
use crate::config::AppConfig;

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("Database unavailable: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Server failed to start: {0}")]
    Server(#[from] ServerError),
}

/// Serve the portal API until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::from_env();
    tracing::info!(
        db_path = %config.db_path.display(),
        bind_addr = %config.bind_addr,
        ranking_url = %config.ranking.api_url,
        ranking_model = %config.ranking.model,
        "Configuration loaded"
    );
    if !config.ranking.is_configured() {
        tracing::warn!("RANKING_API_KEY not set; recommendation requests will answer 503");
    }

    // Fail fast on an unusable database; migrations run here.
    db::open_database(&config.db_path)?;

    let bind_addr = config.bind_addr;
    let portal = Arc::new(PortalState::new(config));
    let mut server = api::start_server(portal, bind_addr).await?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
    server.shutdown();
    server.stopped().await;
    Ok(())
}
