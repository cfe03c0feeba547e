//! Axum route handlers for the Analysis API.

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    Json,
};
use serde::{Deserialize, Serialize};

use crate::analysis::orchestrator::{AnalysisError, AnalysisFailure};
use crate::analysis::result::AnalysisResult;
use crate::errors::AppError;
use crate::models::resume_score::ResumeScoreRow;
use crate::state::AppState;

const DEFAULT_HISTORY_LIMIT: i64 = 50;
const MAX_HISTORY_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    pub file_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub ats_score: Option<u8>,
    pub feedback: Option<String>,
    /// False when persistence is disabled or the write failed.
    pub persisted: bool,
}

impl AnalyzeResponse {
    fn new(result: AnalysisResult, persisted: bool) -> Self {
        Self {
            ats_score: result.ats_score,
            feedback: result.feedback,
            persisted,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub user_id: String,
    pub limit: Option<i64>,
}

/// POST /api/v1/analyze-resume
///
/// Runs the pipeline for `{ "file_url": "<owner>/<timestamp>.<ext>" }`.
/// A store failure after a successful score still answers 200 with the score
/// and `persisted: false`; the write error is logged server-side.
pub async fn handle_analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let Json(request) = payload.map_err(|e| AppError::Validation(e.body_text()))?;

    let file_url = request
        .file_url
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("file_url is required".to_string()))?;

    match state.analyzer.analyze(file_url).await {
        Ok(result) => Ok(Json(AnalyzeResponse::new(result, state.analyzer.persists()))),
        Err(AnalysisFailure {
            error: AnalysisError::Persistence(_),
            result: Some(result),
            ..
        }) => Ok(Json(AnalyzeResponse::new(result, false))),
        Err(failure) => Err(failure.into()),
    }
}

/// GET /api/v1/resume-scores?user_id=...&limit=...
///
/// The owner's analysis history, newest first.
///
/// No authentication happens here: any caller that knows a `user_id` can read
/// that user's history. Deployments must put this route behind their own auth.
pub async fn handle_history(
    State(state): State<AppState>,
    params: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Vec<ResumeScoreRow>>, AppError> {
    let store = state.store.as_ref().ok_or(AppError::NotImplemented)?;
    let Query(params) = params.map_err(|e| AppError::Validation(e.body_text()))?;

    let user_id = params.user_id.trim();
    if user_id.is_empty() {
        return Err(AppError::Validation("user_id cannot be empty".to_string()));
    }
    let limit = params
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);

    let rows = store.history(user_id, limit).await?;
    Ok(Json(rows))
}
