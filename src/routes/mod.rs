//! Route definitions for the ReqLens API.

pub mod analyze;
pub mod auth;
pub mod health;
pub mod reports;
pub mod settings;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

/// Assemble the full application router.
pub fn router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me));

    let analysis_routes = Router::new().route("/analyze", post(analyze::analyze));

    let report_routes = Router::new()
        .route("/reports", get(reports::list))
        .route("/reports/{id}", get(reports::get_by_id).delete(reports::delete))
        .route("/reports/{id}/export", get(reports::export));

    let settings_routes = Router::new()
        .route("/settings", get(settings::get).put(settings::update));

    Router::new()
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready))
        .nest("/api/v1", auth_routes)
        .nest("/api/v1", analysis_routes)
        .nest("/api/v1", report_routes)
        .nest("/api/v1", settings_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
