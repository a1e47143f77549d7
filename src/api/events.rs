//! Event API endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::{ApiJson, ApiQuery, ApiResult};
use crate::db::Store;
use crate::errors::AppError;
use crate::models::{
    CreateEventRequest, Event, EventSort, ImpactMetric, Task, TaskFilter, UpdateEventRequest,
};
use crate::AppState;

/// Query parameters for `GET /api/events`.
#[derive(Debug, Default, Deserialize)]
pub struct ListEventsQuery {
    #[serde(default)]
    pub sort: Option<EventSort>,
    /// Case-insensitive substring of title, description or location
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

/// GET /api/events - List events.
pub async fn list_events(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListEventsQuery>,
) -> ApiResult<Vec<Event>> {
    let mut events = state
        .store
        .list_events(query.sort.unwrap_or_default())
        .await?;

    if let Some(needle) = query.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        events.retain(|event| event.matches_search(needle));
    }
    if let Some(limit) = query.limit {
        events.truncate(limit);
    }

    Ok(Json(events))
}

/// GET /api/events/{id} - Get a single event.
pub async fn get_event(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Event> {
    match state.store.get_event(&id).await? {
        Some(event) => Ok(Json(event)),
        None => Err(AppError::NotFound("Event not found".to_string())),
    }
}

/// POST /api/events - Create a new event.
pub async fn create_event(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateEventRequest>,
) -> ApiResult<Event> {
    if request.created_by.trim().is_empty() {
        return Err(AppError::Validation("created_by is required".to_string()));
    }

    let event = request.into_event();
    event.validate()?;

    let created = state.store.insert_event(&event).await?;
    tracing::info!("Created event {}", created.id);
    Ok(Json(created))
}

/// PUT /api/events/{id} - Update an event.
pub async fn update_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateEventRequest>,
) -> ApiResult<Event> {
    let existing = state
        .store
        .get_event(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    let event = request.apply_to(&existing);
    event.validate()?;

    Ok(Json(state.store.update_event(&event).await?))
}

/// DELETE /api/events/{id} - Delete an event.
///
/// Tasks and metrics pointing at the event are left in place.
pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.store.delete_event(&id).await?;
    tracing::info!("Deleted event {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/events/{id}/tasks - Tasks attached to an event.
pub async fn list_event_tasks(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Vec<Task>> {
    let filter = TaskFilter {
        event_id: Some(id),
        status: None,
    };
    Ok(Json(state.store.list_tasks(&filter).await?))
}

/// GET /api/events/{id}/impact - The impact metric recorded for an event.
pub async fn get_event_impact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ImpactMetric> {
    match state.store.get_event_impact(&id).await? {
        Some(metric) => Ok(Json(metric)),
        None => Err(AppError::NotFound(
            "No impact metrics recorded for this event".to_string(),
        )),
    }
}
