//! The analysis pipeline: normalize, optionally replay, prompt, generate,
//! persist. Each stage consumes only the previous stage's output.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::errors::AppError;
use crate::models::analysis::StoredAnalysis;
use crate::models::report::NewReport;
use crate::models::request::{AnalyzeRequest, CanonicalRequest};
use crate::services::llm::GenerativeModel;
use crate::services::{prompt, report, snapshot};

/// Run the full pipeline and return the persisted report id. Nothing is
/// written unless generation succeeded; a storage failure after generation
/// surfaces as a database error and saves nothing.
pub async fn run(
    pool: &SqlitePool,
    input: AnalyzeRequest,
    model: &dyn GenerativeModel,
) -> Result<i64, AppError> {
    let request = CanonicalRequest::from_input(&input);

    let response = if input.fetch_response {
        Some(snapshot::capture(&request).await)
    } else {
        None
    };

    let prompt = prompt::build(&request, response.as_ref(), input.analyze_headers_only);
    let mut analysis = model.generate(&prompt).await?;
    // Enforced here as well so the invariant holds for every model impl.
    analysis.normalize();

    let document = StoredAnalysis {
        analysis,
        http_response: response,
    };

    let new_report = NewReport {
        created_at: Utc::now().to_rfc3339(),
        method: request.method.to_string(),
        url: request.url.clone(),
        raw: request.raw_or_rendered(),
        summary: document.analysis.summary.clone(),
        ai_json: document,
        model: model.label(),
    };

    let id = report::save(pool, &new_report).await?;
    tracing::info!(
        report_id = id,
        method = %request.method,
        url = %request.url,
        model = %new_report.model,
        "Analysis report saved"
    );
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::analysis::{AnalysisResult, HttpInsights};
    use crate::models::request::KeyValue;
    use async_trait::async_trait;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::Mutex;

    /// Stub model recording the prompt it received.
    struct StubModel {
        seen_prompt: Mutex<Option<String>>,
    }

    impl StubModel {
        fn new() -> Self {
            Self {
                seen_prompt: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl GenerativeModel for StubModel {
        async fn generate(&self, prompt: &str) -> Result<AnalysisResult, AppError> {
            *self.seen_prompt.lock().unwrap() = Some(prompt.to_string());
            Ok(AnalysisResult {
                summary: "Low risk".into(),
                overall_risk_score: 150.0,
                severity_counts: None,
                findings: Vec::new(),
                http_insights: HttpInsights::default(),
                next_steps: Vec::new(),
            })
        }

        fn label(&self) -> String {
            "stub:model".into()
        }
    }

    async fn pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        db::init_schema(&pool, "pw").await.unwrap();
        pool
    }

    #[tokio::test]
    async fn pipeline_without_replay_persists_a_report() {
        let pool = pool().await;
        let model = StubModel::new();
        let input = AnalyzeRequest {
            method: "GET".into(),
            url: "https://example.com/a?x=1".into(),
            headers: vec![KeyValue::new("X-Test", "1")],
            ..Default::default()
        };

        let id = run(&pool, input, &model).await.unwrap();
        assert!(id > 0);

        let prompt = model.seen_prompt.lock().unwrap().clone().unwrap();
        assert!(prompt.contains(r#"[{"key":"x","value":"1"}]"#));
        assert!(prompt.contains(r#"[{"key":"X-Test","value":"1"}]"#));
        assert!(!prompt.contains("Response snapshot"));

        let stored = report::get(&pool, id).await.unwrap();
        assert_eq!(stored.method, "GET");
        assert_eq!(stored.model, "stub:model");
        assert_eq!(stored.summary, "Low risk");
        // No replay requested, so the document carries no response.
        assert!(stored.ai_json.http_response.is_none());
        // A synthesized raw rendering stands in for missing raw input.
        assert!(stored.raw.starts_with("GET /a?x=1 HTTP/1.1"));
    }

    #[tokio::test]
    async fn generation_failure_saves_nothing() {
        struct FailingModel;

        #[async_trait]
        impl GenerativeModel for FailingModel {
            async fn generate(&self, _prompt: &str) -> Result<AnalysisResult, AppError> {
                Err(AppError::Generation("model unavailable".into()))
            }
            fn label(&self) -> String {
                "stub:failing".into()
            }
        }

        let pool = pool().await;
        let input = AnalyzeRequest {
            url: "https://example.com/".into(),
            ..Default::default()
        };
        let err = run(&pool, input, &FailingModel).await.unwrap_err();
        assert!(matches!(err, AppError::Generation(_)));

        let reports = report::list_recent(&pool, 10).await.unwrap();
        assert!(reports.is_empty());
    }

    #[tokio::test]
    async fn score_is_clamped_before_persistence() {
        let pool = pool().await;
        let model = StubModel::new();
        let input = AnalyzeRequest {
            url: "https://example.com/".into(),
            ..Default::default()
        };
        let id = run(&pool, input, &model).await.unwrap();
        let stored = report::get(&pool, id).await.unwrap();
        assert_eq!(stored.ai_json.analysis.overall_risk_score, 100.0);
    }
}
