//! Doctor recommendation endpoints.
//!
//! - `POST /api/recommendations`: rank doctors for explicit conditions
//! - `POST /api/patients/:id/recommendations`: rank for a patient's stored conditions
//! - `GET /api/recommendations/state`: the caller's request lifecycle snapshot
//!
//! Each call runs through the caller's own `RecommendationRequester`.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::{get_patient, SessionUser};
use crate::models::AppRole;
use crate::pipeline::recommendation::{RecommendationOutcome, RequestSnapshot, RequestState};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendRequest {
    #[serde(default)]
    pub patient_conditions: Vec<String>,
    #[serde(default)]
    pub is_rare_case: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecommendRequest {
    #[serde(default)]
    pub is_rare_case: bool,
}

/// `POST /api/recommendations`
pub async fn recommend(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<SessionUser>,
    Json(body): Json<RecommendRequest>,
) -> Result<Json<RecommendationOutcome>, ApiError> {
    let requester = ctx.portal.requester_for(&user.user_id)?;
    let outcome = requester
        .trigger(body.patient_conditions, body.is_rare_case)
        .await?;
    Ok(Json(outcome))
}

/// `POST /api/patients/:id/recommendations`
///
/// Patients may only request their own record; doctors and admins any.
pub async fn recommend_for_patient(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<SessionUser>,
    Path(patient_id): Path<String>,
    Json(body): Json<PatientRecommendRequest>,
) -> Result<Json<RecommendationOutcome>, ApiError> {
    let patient_id = Uuid::parse_str(&patient_id)
        .map_err(|e| ApiError::BadRequest(format!("Invalid patient ID: {e}")))?;

    let patient = ctx
        .with_db(move |conn| get_patient(conn, &patient_id))
        .await?
        .ok_or_else(|| ApiError::NotFound("Patient not found".into()))?;

    if user.role == AppRole::Patient && patient.user_id != user.user_id {
        tracing::warn!(user_id = %user.user_id, %patient_id, "Patient requested another patient's recommendations");
        return Err(ApiError::Forbidden(
            "Patients may only request recommendations for themselves".into(),
        ));
    }

    let requester = ctx.portal.requester_for(&user.user_id)?;
    let outcome = requester
        .trigger(patient.current_conditions, body.is_rare_case)
        .await?;
    Ok(Json(outcome))
}

/// `GET /api/recommendations/state`
pub async fn state(
    State(ctx): State<ApiContext>,
    Extension(user): Extension<SessionUser>,
) -> Result<Json<RequestSnapshot>, ApiError> {
    let snapshot = match ctx.portal.existing_requester(&user.user_id)? {
        Some(requester) => requester.snapshot(),
        None => RequestSnapshot {
            generation: 0,
            state: RequestState::Idle,
        },
    };
    Ok(Json(snapshot))
}
