//! Dashboard API endpoint.

use axum::{extract::State, Json};
use serde::Serialize;

use super::ApiResult;
use crate::db::Store;
use crate::impact::ImpactTotals;
use crate::models::{Event, EventSort, Task, TaskFilter, TaskStatus};
use crate::AppState;

const DASHBOARD_ROWS: usize = 5;

/// Everything the dashboard renders in one response.
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    /// Earliest events by start date
    pub upcoming_events: Vec<Event>,
    /// Newest tasks
    pub recent_tasks: Vec<Task>,
    /// Tasks not yet done
    pub open_tasks: usize,
    pub volunteer_count: u64,
    pub impact: ImpactTotals,
}

/// GET /api/dashboard - Dashboard snapshot.
pub async fn get_dashboard(State(state): State<AppState>) -> ApiResult<DashboardResponse> {
    let mut upcoming_events = state.store.list_events(EventSort::Date).await?;
    upcoming_events.truncate(DASHBOARD_ROWS);

    let tasks = state.store.list_tasks(&TaskFilter::default()).await?;
    let open_tasks = tasks
        .iter()
        .filter(|task| task.status != TaskStatus::Done)
        .count();
    let recent_tasks = tasks.into_iter().take(DASHBOARD_ROWS).collect();

    let volunteer_count = state.store.count_volunteers().await?;
    let metrics = state.store.list_impact_metrics(None).await?;

    Ok(Json(DashboardResponse {
        upcoming_events,
        recent_tasks,
        open_tasks,
        volunteer_count,
        impact: ImpactTotals::aggregate(&metrics),
    }))
}
