//! Report persistence. Ids are the table's AUTOINCREMENT rowid, so they are
//! strictly increasing across the lifetime of the database file.

use sqlx::SqlitePool;

use crate::errors::AppError;
use crate::models::report::{NewReport, Report, ReportRow, ReportSummary};

/// Persist a finished analysis and return its id.
pub async fn save(pool: &SqlitePool, report: &NewReport) -> Result<i64, AppError> {
    let ai_json = serde_json::to_string(&report.ai_json)
        .map_err(|e| AppError::Internal(format!("Failed to serialize analysis: {e}")))?;

    let result = sqlx::query(
        r#"
        INSERT INTO reports (created_at, method, url, raw, summary, ai_json, model)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&report.created_at)
    .bind(&report.method)
    .bind(&report.url)
    .bind(&report.raw)
    .bind(&report.summary)
    .bind(&ai_json)
    .bind(&report.model)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Fetch a full report by id.
pub async fn get(pool: &SqlitePool, id: i64) -> Result<Report, AppError> {
    let row = sqlx::query_as::<_, ReportRow>(
        "SELECT id, created_at, method, url, raw, summary, ai_json, model FROM reports WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Report {id} not found")))?;

    Report::try_from(row)
}

/// Most recent reports first, full documents omitted.
pub async fn list_recent(pool: &SqlitePool, limit: i64) -> Result<Vec<ReportSummary>, AppError> {
    let rows = sqlx::query_as::<_, ReportSummary>(
        "SELECT id, created_at, method, url, summary, model FROM reports ORDER BY id DESC LIMIT ?",
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Delete a report; `Ok(false)` when the id does not exist.
pub async fn delete(pool: &SqlitePool, id: i64) -> Result<bool, AppError> {
    let result = sqlx::query("DELETE FROM reports WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
