pub mod config;
pub mod db;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod parsers;
pub mod routes;
pub mod services;

use sqlx::SqlitePool;

/// Shared application state passed to all Axum handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: config::AppConfig,
}
