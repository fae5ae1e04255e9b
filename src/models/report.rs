//! Persisted report records.

use serde::Serialize;
use sqlx::FromRow;

use crate::errors::AppError;
use crate::models::analysis::StoredAnalysis;

/// A persisted analysis report. Owned by the store once created; immutable
/// thereafter except for deletion.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub id: i64,
    pub created_at: String,
    pub method: String,
    pub url: String,
    pub raw: String,
    pub summary: String,
    pub ai_json: StoredAnalysis,
    pub model: String,
}

/// Listing entry without the full analysis document.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ReportSummary {
    pub id: i64,
    pub created_at: String,
    pub method: String,
    pub url: String,
    pub summary: String,
    pub model: String,
}

/// Report fields as they are inserted; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewReport {
    pub created_at: String,
    pub method: String,
    pub url: String,
    pub raw: String,
    pub summary: String,
    pub ai_json: StoredAnalysis,
    pub model: String,
}

/// Raw row shape with the analysis document still serialized.
#[derive(Debug, FromRow)]
pub struct ReportRow {
    pub id: i64,
    pub created_at: String,
    pub method: String,
    pub url: String,
    pub raw: String,
    pub summary: String,
    pub ai_json: String,
    pub model: String,
}

impl TryFrom<ReportRow> for Report {
    type Error = AppError;

    fn try_from(row: ReportRow) -> Result<Self, Self::Error> {
        let ai_json: StoredAnalysis = serde_json::from_str(&row.ai_json)
            .map_err(|e| AppError::Internal(format!("Corrupt report document: {e}")))?;
        Ok(Report {
            id: row.id,
            created_at: row.created_at,
            method: row.method,
            url: row.url,
            raw: row.raw,
            summary: row.summary,
            ai_json,
            model: row.model,
        })
    }
}
