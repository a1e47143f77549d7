//! Volunteer API endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;

use super::{ApiJson, ApiResult};
use crate::db::Store;
use crate::errors::AppError;
use crate::matching::VolunteerFilter;
use crate::models::{CreateVolunteerRequest, Volunteer};
use crate::AppState;

/// Response body of `POST /api/volunteers/match`.
#[derive(Debug, Serialize)]
pub struct MatchVolunteersResponse {
    pub volunteers: Vec<Volunteer>,
}

/// GET /api/volunteers - List volunteers, newest first.
pub async fn list_volunteers(State(state): State<AppState>) -> ApiResult<Vec<Volunteer>> {
    Ok(Json(state.store.list_volunteers().await?))
}

/// GET /api/volunteers/{id} - Get a single volunteer.
pub async fn get_volunteer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Volunteer> {
    match state.store.get_volunteer(&id).await? {
        Some(volunteer) => Ok(Json(volunteer)),
        None => Err(AppError::NotFound("Volunteer not found".to_string())),
    }
}

/// POST /api/volunteers - Register a volunteer.
pub async fn create_volunteer(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateVolunteerRequest>,
) -> ApiResult<Volunteer> {
    request.validate()?;

    let created = state.store.insert_volunteer(&request.into_volunteer()).await?;
    tracing::info!("Registered volunteer {}", created.id);
    Ok(Json(created))
}

/// DELETE /api/volunteers/{id} - Remove a volunteer.
pub async fn delete_volunteer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.store.delete_volunteer(&id).await?;
    tracing::info!("Deleted volunteer {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/volunteers/match - Volunteers satisfying every provided criterion.
pub async fn match_volunteers(
    State(state): State<AppState>,
    ApiJson(filter): ApiJson<VolunteerFilter>,
) -> ApiResult<MatchVolunteersResponse> {
    if filter.is_unfiltered() {
        tracing::debug!("Match request without criteria, returning every volunteer");
    }

    let volunteers = state
        .store
        .match_volunteers(&filter)
        .await
        .map_err(|e| e.or_generic(|| AppError::Upstream("Error matching volunteers".to_string())))?;

    tracing::debug!("Matched {} volunteers", volunteers.len());
    Ok(Json(MatchVolunteersResponse { volunteers }))
}
