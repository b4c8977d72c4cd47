//! API error types with structured JSON responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::app_state::PortalError;
use crate::db::DatabaseError;
use crate::pipeline::recommendation::RecommendationError;

/// Structured error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Ranking service not configured")]
    RankingUnavailable,
    #[error("Ranking service error: {0}")]
    Upstream(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                "Authentication required".to_string(),
            ),
            ApiError::Forbidden(detail) => (StatusCode::FORBIDDEN, "FORBIDDEN", detail.clone()),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone()),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone()),
            ApiError::InvalidInput(detail) => {
                (StatusCode::BAD_REQUEST, "INVALID_INPUT", detail.clone())
            }
            ApiError::RankingUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "RANKING_NOT_CONFIGURED",
                "Doctor recommendations are not available: ranking service is not configured"
                    .to_string(),
            ),
            ApiError::Upstream(detail) => {
                tracing::warn!(detail, "Ranking service error reached API");
                (
                    StatusCode::BAD_GATEWAY,
                    "UPSTREAM_ERROR",
                    "Ranking service error".to_string(),
                )
            }
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            error: ErrorDetail { code, message },
        };
        (status, Json(body)).into_response()
    }
}

impl From<RecommendationError> for ApiError {
    fn from(err: RecommendationError) -> Self {
        match err {
            RecommendationError::InvalidInput(detail) => ApiError::InvalidInput(detail),
            RecommendationError::Configuration(_) => ApiError::RankingUnavailable,
            e @ RecommendationError::Upstream { .. } => ApiError::Upstream(e.to_string()),
            RecommendationError::Database(e) => ApiError::Internal(e.to_string()),
            RecommendationError::Internal(detail) => ApiError::Internal(detail),
        }
    }
}

impl From<PortalError> for ApiError {
    fn from(err: PortalError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        ApiError::Internal(err.to_string())
    }
}
