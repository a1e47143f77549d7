//! Impact metric API endpoints.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use super::{ApiJson, ApiQuery, ApiResult};
use crate::db::Store;
use crate::errors::AppError;
use crate::impact::ImpactSummary;
use crate::models::{CreateImpactMetricRequest, ImpactMetric};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListImpactQuery {
    #[serde(default)]
    pub event_id: Option<String>,
}

/// GET /api/impact - List impact metric rows.
pub async fn list_impact_metrics(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ListImpactQuery>,
) -> ApiResult<Vec<ImpactMetric>> {
    let event_id = query.event_id.as_deref().filter(|id| !id.is_empty());
    Ok(Json(state.store.list_impact_metrics(event_id).await?))
}

/// POST /api/impact - Record impact for an event.
pub async fn create_impact_metric(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateImpactMetricRequest>,
) -> ApiResult<ImpactMetric> {
    request.validate()?;

    let created = state
        .store
        .insert_impact_metric(&request.into_metric())
        .await?;
    tracing::info!("Recorded impact {} for event {}", created.id, created.event_id);
    Ok(Json(created))
}

/// DELETE /api/impact/{id} - Delete an impact metric row.
pub async fn delete_impact_metric(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.store.delete_impact_metric(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/impact/summary - Organization-wide totals and the per-event breakdown.
pub async fn impact_summary(State(state): State<AppState>) -> ApiResult<ImpactSummary> {
    let events = state.store.list_events(Default::default()).await?;
    let metrics = state.store.list_impact_metrics(None).await?;
    Ok(Json(ImpactSummary::build(&events, &metrics)))
}
