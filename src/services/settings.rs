//! Settings access. The table holds exactly one row (id = 1), seeded at
//! schema init; updates merge partial input over the current values.

use sqlx::{Row, SqlitePool};

use crate::errors::AppError;
use crate::models::settings::{Provider, Settings, UpdateSettings};

pub async fn get(pool: &SqlitePool) -> Result<Settings, AppError> {
    let row = sqlx::query(
        "SELECT provider, model, xai_api_key, openai_api_key FROM settings WHERE id = 1",
    )
    .fetch_one(pool)
    .await?;

    Ok(Settings {
        provider: Provider::parse(row.get::<String, _>("provider").as_str()),
        model: row.get("model"),
        xai_api_key: row.get("xai_api_key"),
        openai_api_key: row.get("openai_api_key"),
    })
}

/// Apply a partial update and return the merged result. Absent fields keep
/// their current value; empty strings clear optional fields.
pub async fn update(pool: &SqlitePool, changes: UpdateSettings) -> Result<Settings, AppError> {
    let current = get(pool).await?;

    let merged = Settings {
        provider: changes.provider.unwrap_or(current.provider),
        model: merge_optional(changes.model, current.model),
        xai_api_key: merge_optional(changes.xai_api_key, current.xai_api_key),
        openai_api_key: merge_optional(changes.openai_api_key, current.openai_api_key),
    };

    sqlx::query(
        "UPDATE settings SET provider = ?, model = ?, xai_api_key = ?, openai_api_key = ? WHERE id = 1",
    )
    .bind(merged.provider.as_str())
    .bind(&merged.model)
    .bind(&merged.xai_api_key)
    .bind(&merged.openai_api_key)
    .execute(pool)
    .await?;

    Ok(merged)
}

fn merge_optional(incoming: Option<String>, current: Option<String>) -> Option<String> {
    match incoming {
        Some(value) if value.is_empty() => None,
        Some(value) => Some(value),
        None => current,
    }
}
