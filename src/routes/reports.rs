//! Report routes: listing, retrieval, deletion, and JSON export.

use axum::extract::{Path, Query, State};
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::Json;
use serde::Deserialize;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::CurrentUser;
use crate::models::report::{Report, ReportSummary};
use crate::services::report as report_service;
use crate::AppState;

const DEFAULT_LIST_LIMIT: i64 = 20;
const MAX_LIST_LIMIT: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
}

/// GET /api/v1/reports
pub async fn list(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<ReportSummary>>>, AppError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    let summaries = report_service::list_recent(&state.db, limit).await?;
    Ok(ApiResponse::success(summaries))
}

/// GET /api/v1/reports/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<Report>>, AppError> {
    let report = report_service::get(&state.db, id).await?;
    Ok(ApiResponse::success(report))
}

/// DELETE /api/v1/reports/{id}
pub async fn delete(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<&'static str>>, AppError> {
    if !report_service::delete(&state.db, id).await? {
        return Err(AppError::NotFound(format!("Report {id} not found")));
    }
    Ok(ApiResponse::success("Report deleted"))
}

/// GET /api/v1/reports/{id}/export — full report as a JSON download.
pub async fn export(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(id): Path<i64>,
) -> Result<(HeaderMap, Json<Report>), AppError> {
    let report = report_service::get(&state.db, id).await?;

    let mut headers = HeaderMap::new();
    let disposition = format!("attachment; filename=\"report-{id}.json\"");
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .map_err(|e| AppError::Internal(format!("Invalid export header: {e}")))?,
    );

    Ok((headers, Json(report)))
}
