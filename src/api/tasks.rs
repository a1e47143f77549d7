//! Task API endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use super::{ApiJson, ApiQuery, ApiResult};
use crate::db::Store;
use crate::errors::AppError;
use crate::models::{
    CreateTaskRequest, SetReminderRequest, Task, TaskFilter, TaskReminder, UpdateTaskRequest,
};
use crate::AppState;

/// GET /api/tasks - List tasks, newest first.
pub async fn list_tasks(
    State(state): State<AppState>,
    ApiQuery(mut filter): ApiQuery<TaskFilter>,
) -> ApiResult<Vec<Task>> {
    filter.event_id = filter.event_id.filter(|id| !id.is_empty());
    Ok(Json(state.store.list_tasks(&filter).await?))
}

/// GET /api/tasks/{id} - Get a single task.
pub async fn get_task(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Task> {
    match state.store.get_task(&id).await? {
        Some(task) => Ok(Json(task)),
        None => Err(AppError::NotFound("Task not found".to_string())),
    }
}

/// POST /api/tasks - Create a new task.
pub async fn create_task(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateTaskRequest>,
) -> ApiResult<Task> {
    let task = request.into_task();
    task.validate()?;

    let created = state.store.insert_task(&task).await?;
    tracing::info!("Created task {}", created.id);
    Ok(Json(created))
}

/// PUT /api/tasks/{id} - Update a task.
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<UpdateTaskRequest>,
) -> ApiResult<Task> {
    let existing = state
        .store
        .get_task(&id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".to_string()))?;

    let task = request.apply_to(&existing);
    task.validate()?;

    Ok(Json(state.store.update_task(&task).await?))
}

/// DELETE /api/tasks/{id} - Delete a task.
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.store.delete_task(&id).await?;
    tracing::info!("Deleted task {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/tasks/{id}/reminder - Set or replace the reminder of a task.
pub async fn set_task_reminder(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<SetReminderRequest>,
) -> ApiResult<TaskReminder> {
    if state.store.get_task(&id).await?.is_none() {
        return Err(AppError::NotFound("Task not found".to_string()));
    }

    let reminder = request.into_reminder(&id)?;
    Ok(Json(state.store.upsert_task_reminder(&reminder).await?))
}
