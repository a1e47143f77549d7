//! AI generation endpoints.

use axum::{extract::State, Json};
use serde::Deserialize;

use super::{ApiJson, ApiResult};
use crate::ai::{self, Generated};
use crate::errors::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct GenerateIdeaRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateSummaryRequest {
    #[serde(default)]
    pub event_id: String,
}

/// POST /api/ai/generate-idea - Forward a prompt for CSR event ideas.
pub async fn generate_idea(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GenerateIdeaRequest>,
) -> ApiResult<Generated> {
    ai::generate_idea(&state.ai, &request.prompt)
        .await
        .map(Json)
        .map_err(|e| e.or_generic(|| AppError::Generation("Error generating content".to_string())))
}

/// POST /api/ai/generate-summary - Summarize an event with its tasks and impact.
pub async fn generate_summary(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<GenerateSummaryRequest>,
) -> ApiResult<Generated> {
    ai::generate_summary(state.store.as_ref(), &state.ai, &request.event_id)
        .await
        .map(Json)
        .map_err(|e| e.or_generic(|| AppError::Generation("Error generating summary".to_string())))
}
