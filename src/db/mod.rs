//! SQLite connection pool and idempotent schema initialization.

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::errors::AppError;
use crate::services::auth;

/// Create a SQLite connection pool, creating the database file if missing.
pub async fn create_pool(
    database_url: &str,
    max_connections: u32,
) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await
}

/// Create tables if absent, ensure the single settings row, and seed the
/// default admin user. Safe to run on every startup.
pub async fn init_schema(pool: &SqlitePool, admin_password: &str) -> Result<(), AppError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            provider TEXT NOT NULL DEFAULT 'xai',
            model TEXT,
            xai_api_key TEXT,
            openai_api_key TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS reports (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            created_at TEXT NOT NULL,
            method TEXT NOT NULL,
            url TEXT NOT NULL,
            raw TEXT NOT NULL,
            summary TEXT NOT NULL,
            ai_json TEXT NOT NULL,
            model TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("INSERT OR IGNORE INTO settings (id) VALUES (1)")
        .execute(pool)
        .await?;

    let admin_exists: Option<(i64,)> =
        sqlx::query_as("SELECT id FROM users WHERE username = 'admin'")
            .fetch_optional(pool)
            .await?;

    if admin_exists.is_none() {
        let hash = auth::hash_password(admin_password)?;
        sqlx::query("INSERT INTO users (username, password_hash) VALUES ('admin', ?)")
            .bind(&hash)
            .execute(pool)
            .await?;
        tracing::info!("Seeded default admin user");
    }

    Ok(())
}
