//! Analysis route: the single entry point of the pipeline.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::CurrentUser;
use crate::models::request::AnalyzeRequest;
use crate::services::{analysis, llm, settings as settings_service};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub id: i64,
}

/// POST /api/v1/analyze
pub async fn analyze(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(body): Json<AnalyzeRequest>,
) -> Result<Json<ApiResponse<AnalyzeResponse>>, AppError> {
    let settings = settings_service::get(&state.db).await?;
    let model = llm::resolve(&settings)?;
    let id = analysis::run(&state.db, body, model.as_ref()).await?;
    Ok(ApiResponse::success(AnalyzeResponse { id }))
}
