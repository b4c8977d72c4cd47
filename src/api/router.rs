//! Portal API router.
//!
//! Returns a composable `Router` with every route under `/api/`.
//!
//! Middleware stack on protected routes (outermost → innermost):
//! 1. Auth validator → 2. Audit logger

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::types::ApiContext;
use crate::app_state::PortalState;

/// Build the portal API router.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
pub fn portal_router(portal: Arc<PortalState>) -> Router {
    let ctx = ApiContext::new(portal);

    // Layers are applied from bottom (innermost) to top (outermost).
    // NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
    let protected = Router::new()
        .route("/doctors", get(endpoints::doctors::list))
        .route("/recommendations", post(endpoints::recommendations::recommend))
        .route(
            "/recommendations/state",
            get(endpoints::recommendations::state),
        )
        .route(
            "/patients/:id/recommendations",
            post(endpoints::recommendations::recommend_for_patient),
        )
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx.clone()));

    let public = Router::new()
        .route("/health", get(endpoints::health::check))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::Extension(ctx));

    Router::new()
        .nest("/api", protected.merge(public))
        .layer(CorsLayer::permissive())
}
