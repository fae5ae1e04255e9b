//! Authentication routes: login, logout, profile.

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::errors::{ApiResponse, AppError};
use crate::middleware::auth::CurrentUser;
use crate::models::user::{User, UserResponse};
use crate::services::auth as auth_service;
use crate::services::auth::SessionToken;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// POST /api/v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<ApiResponse<SessionToken>>, AppError> {
    let session = auth_service::login(
        &state.db,
        &body.username,
        &body.password,
        &state.config.session_secret,
        state.config.session_expiry_secs,
    )
    .await?;

    Ok(ApiResponse::success(session))
}

/// POST /api/v1/auth/logout — client-side token discard (stateless session)
pub async fn logout() -> Json<ApiResponse<&'static str>> {
    // With stateless tokens, logout is handled client-side by discarding
    // the token.
    ApiResponse::success("Logged out successfully")
}

/// GET /api/v1/auth/me — current user profile
pub async fn me(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> Result<Json<ApiResponse<UserResponse>>, AppError> {
    let user = sqlx::query_as::<_, User>(
        "SELECT id, username, password_hash FROM users WHERE username = ?",
    )
    .bind(&current_user.username)
    .fetch_optional(&state.db)
    .await?
    .ok_or(AppError::Unauthorized)?;

    Ok(ApiResponse::success(UserResponse::from(user)))
}
