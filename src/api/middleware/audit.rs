//! Audit logging middleware.
//!
//! Logs every API request with user_id, role, method, path, status and
//! latency. Runs innermost (after auth has injected `SessionUser`).
//! Request bodies are never logged.

use std::time::Instant;

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::db::SessionUser;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let user = req.extensions().get::<SessionUser>().cloned();
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let elapsed_ms = start.elapsed().as_millis() as u64;
    match user {
        Some(user) => tracing::info!(
            user_id = %user.user_id,
            role = %user.role,
            %method,
            %path,
            status,
            elapsed_ms,
            "API access"
        ),
        None => tracing::info!(%method, %path, status, elapsed_ms, "API access"),
    }

    response
}
