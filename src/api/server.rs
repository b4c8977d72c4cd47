//! API server lifecycle: binds, serves `portal_router()` in a background
//! task, and returns a handle with a shutdown channel.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::portal_router;
use crate::app_state::PortalState;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("Failed to get server address: {0}")]
    LocalAddr(std::io::Error),
}

/// Handle to a running API server.
pub struct PortalServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PortalServer {
    /// Signal graceful shutdown. In-flight requests are allowed to finish.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }

    /// Wait for the server task to exit.
    pub async fn stopped(self) {
        if let Err(e) = self.task.await {
            tracing::error!("API server task failed: {e}");
        }
    }
}

/// Bind `addr` (port 0 for ephemeral) and start serving in a background task.
pub async fn start_server(
    portal: Arc<PortalState>,
    addr: SocketAddr,
) -> Result<PortalServer, ServerError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;
    let addr = listener.local_addr().map_err(ServerError::LocalAddr)?;

    let app = portal_router(portal);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(%addr, "API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
    });

    Ok(PortalServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn test_portal(dir: &tempfile::TempDir) -> Arc<PortalState> {
        let db_path = dir.path().join("portal.db");
        let config = AppConfig::from_lookup(|key| match key {
            "MEDPORTAL_DB_PATH" => Some(db_path.display().to_string()),
            _ => None,
        });
        Arc::new(PortalState::new(config))
    }

    #[tokio::test]
    async fn server_starts_and_answers_health() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = start_server(test_portal(&dir), "127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        assert_ne!(server.addr.port(), 0);

        let url = format!("http://{}/api/health", server.addr);
        let json: serde_json::Value = reqwest::get(&url).await.unwrap().json().await.unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["ranking_configured"], false);

        server.shutdown();
        server.stopped().await;
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = start_server(test_portal(&dir), "127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        server.shutdown();
        server.shutdown();
        server.stopped().await;
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut first = start_server(test_portal(&dir), "127.0.0.1:0".parse().unwrap())
            .await
            .unwrap();
        let result = start_server(test_portal(&dir), first.addr).await;
        assert!(matches!(result, Err(ServerError::Bind { .. })));
        first.shutdown();
        first.stopped().await;
    }
}
