//! Axum route handlers for the Matchmaker API.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::errors::AppError;
use crate::matchmaker::pipeline::{MatchSummary, DEFAULT_MIN_MATCH_PERCENTAGE};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    pub jd_id: i64,
    /// Defaults to 60 when absent or null. Range-checked by the pipeline.
    pub min_match_percentage: Option<i64>,
}

/// POST /api/matchmaker/jd-to-cv
///
/// Matches eligible CVs against a job description and returns the ranked
/// qualifying matches with their score breakdown.
pub async fn handle_match_jd_to_cv(
    State(state): State<AppState>,
    payload: Result<Json<MatchRequest>, JsonRejection>,
) -> Result<Json<MatchSummary>, AppError> {
    let Json(request) =
        payload.map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    let threshold = request
        .min_match_percentage
        .unwrap_or(DEFAULT_MIN_MATCH_PERCENTAGE);
    info!(
        "Matchmaking request: JD {}, min threshold {}%",
        request.jd_id, threshold
    );

    let summary = state
        .matchmaker
        .run_match(request.jd_id, threshold, Some(state.config.match_timeout))
        .await?;

    Ok(Json(summary))
}

/// GET /api/matchmaker/health
pub async fn handle_matchmaker_health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "matchmaker",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
