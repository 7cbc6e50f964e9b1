use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::analysis::pipeline::{run_analysis, AnalyzeRequest};
use crate::errors::AppError;
use crate::models::report::Report;
use crate::state::AppState;

/// POST /api/v1/analyze
pub async fn handle_analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<Report>, AppError> {
    let Json(req) = payload.map_err(|rejection| AppError::InvalidRequest(rejection.body_text()))?;

    let report = run_analysis(
        &state.matcher,
        state.generator.clone(),
        state.config.analysis_settings(),
        req,
    )
    .await?;
    Ok(Json(report))
}
