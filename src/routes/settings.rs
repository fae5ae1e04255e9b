//! Provider settings routes.

use axum::{extract::State, Json};

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::CurrentUser;
use crate::models::settings::{Settings, UpdateSettings};
use crate::services::settings as settings_service;
use crate::AppState;

/// GET /api/v1/settings
pub async fn get(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> Result<Json<ApiResponse<Settings>>, AppError> {
    let settings = settings_service::get(&state.db).await?;
    Ok(ApiResponse::success(settings))
}

/// PUT /api/v1/settings
pub async fn update(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(body): Json<UpdateSettings>,
) -> Result<Json<ApiResponse<Settings>>, AppError> {
    let settings = settings_service::update(&state.db, body).await?;
    Ok(ApiResponse::success(settings))
}
