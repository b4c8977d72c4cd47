//! Doctor directory endpoint.

use axum::extract::State;
use axum::{Extension, Json};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::SessionUser;
use crate::models::DoctorRecord;

#[derive(Serialize)]
pub struct DoctorsResponse {
    pub doctors: Vec<DoctorRecord>,
}

/// `GET /api/doctors`: every doctor, in the order recommendations index them.
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(_user): Extension<SessionUser>,
) -> Result<Json<DoctorsResponse>, ApiError> {
    let doctors = ctx
        .blocking(|portal| Ok(portal.pipeline().store().load_doctors()?))
        .await?;
    Ok(Json(DoctorsResponse { doctors }))
}
