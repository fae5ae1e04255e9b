//! Schema-constrained analysis output model and the replay response
//! snapshot. Field names serialize in camelCase to match the stored report
//! document shape.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Fixed five-label severity scale. Absent severities default to Info;
/// anything outside the set is a schema violation handled by the
/// generation layer's retry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    #[default]
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
            Self::Info => "Info",
        }
    }
}

/// A single security finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finding {
    pub title: String,
    #[serde(default)]
    pub severity: Severity,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub commands: Vec<String>,
    #[serde(default)]
    pub references: Vec<String>,
    #[serde(default)]
    pub related_headers: Vec<String>,
    #[serde(default)]
    pub related_params: Vec<String>,
    #[serde(default)]
    pub related_cookies: Vec<String>,
    #[serde(default)]
    pub related_body_keys: Vec<String>,
}

/// Per-header insight: purpose, standardness, and remediation guidance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderInsight {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    #[serde(default = "default_true")]
    pub is_standard: bool,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub example_commands: Vec<String>,
}

/// Insight attached to a named cookie or query parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryInsight {
    pub name: String,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub example_commands: Vec<String>,
}

/// Insight attached to a request body key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyInsight {
    pub key: String,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub example_commands: Vec<String>,
}

/// Structured per-part insights over the HTTP exchange.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpInsights {
    #[serde(default)]
    pub headers: Vec<HeaderInsight>,
    #[serde(default)]
    pub cookies: Vec<EntryInsight>,
    #[serde(default)]
    pub params: Vec<EntryInsight>,
    #[serde(default)]
    pub body_findings: Vec<BodyInsight>,
}

/// The full schema-validated generative-model output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub summary: String,
    pub overall_risk_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity_counts: Option<BTreeMap<String, u32>>,
    pub findings: Vec<Finding>,
    pub http_insights: HttpInsights,
    #[serde(default)]
    pub next_steps: Vec<String>,
}

impl AnalysisResult {
    /// Apply semantic invariants on top of structural deserialization:
    /// clamp the risk score to [0, 100] and recompute severity counts from
    /// findings when the model omitted them. When both are present the
    /// model's counts stand, even if inconsistent.
    pub fn normalize(&mut self) {
        self.overall_risk_score = self.overall_risk_score.clamp(0.0, 100.0);
        if self.severity_counts.is_none() {
            let mut counts: BTreeMap<String, u32> = BTreeMap::new();
            for finding in &self.findings {
                *counts.entry(finding.severity.as_str().to_string()).or_default() += 1;
            }
            self.severity_counts = Some(counts);
        }
    }
}

/// Captured, bounded representation of a real HTTP response. On network
/// failure `status` is 0, `status_text` is `NETWORK_ERROR`, and
/// `body_preview` carries the error message; the snapshot remains
/// structurally valid and flows into the prompt unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSnapshot {
    pub url: String,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<HeaderPair>,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub body_preview: String,
    pub fetched_at: String,
}

/// A response header as name/value, preserving order and duplicates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeaderPair {
    pub name: String,
    pub value: String,
}

/// The document persisted as a report's `ai_json`: the analysis result,
/// optionally augmented with the response snapshot under `httpResponse`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredAnalysis {
    #[serde(flatten)]
    pub analysis: AnalysisResult,
    #[serde(
        rename = "httpResponse",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub http_response: Option<ResponseSnapshot>,
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn finding(severity: Severity) -> Finding {
        Finding {
            title: "t".into(),
            severity,
            description: "d".into(),
            evidence: None,
            recommendations: vec![],
            commands: vec![],
            references: vec![],
            related_headers: vec![],
            related_params: vec![],
            related_cookies: vec![],
            related_body_keys: vec![],
        }
    }

    #[test]
    fn minimal_object_deserializes_with_defaults() {
        let value = json!({
            "summary": "ok",
            "overallRiskScore": 42,
            "findings": [
                { "title": "Missing CSP", "description": "No Content-Security-Policy" }
            ],
            "httpInsights": {}
        });
        let result: AnalysisResult = serde_json::from_value(value).unwrap();
        assert_eq!(result.findings[0].severity, Severity::Info);
        assert!(result.findings[0].recommendations.is_empty());
        assert!(result.http_insights.headers.is_empty());
        assert!(result.next_steps.is_empty());
        assert!(result.severity_counts.is_none());
    }

    #[test]
    fn unknown_severity_is_rejected() {
        let value = json!({
            "summary": "ok",
            "overallRiskScore": 10,
            "findings": [
                { "title": "x", "severity": "Catastrophic", "description": "y" }
            ],
            "httpInsights": {}
        });
        assert!(serde_json::from_value::<AnalysisResult>(value).is_err());
    }

    #[test]
    fn header_insight_is_standard_defaults_true() {
        let insight: HeaderInsight =
            serde_json::from_value(json!({ "name": "X-Custom" })).unwrap();
        assert!(insight.is_standard);
    }

    #[test]
    fn normalize_recomputes_counts_and_sums_to_findings_len() {
        let mut result = AnalysisResult {
            summary: "s".into(),
            overall_risk_score: 130.0,
            severity_counts: None,
            findings: vec![
                finding(Severity::High),
                finding(Severity::High),
                finding(Severity::Info),
            ],
            http_insights: HttpInsights::default(),
            next_steps: vec![],
        };
        result.normalize();
        assert_eq!(result.overall_risk_score, 100.0);
        let counts = result.severity_counts.unwrap();
        assert_eq!(counts.get("High"), Some(&2));
        assert_eq!(counts.get("Info"), Some(&1));
        assert_eq!(counts.values().sum::<u32>() as usize, 3);
    }

    #[test]
    fn normalize_keeps_model_supplied_counts() {
        let mut counts = BTreeMap::new();
        counts.insert("Critical".to_string(), 9);
        let mut result = AnalysisResult {
            summary: "s".into(),
            overall_risk_score: -5.0,
            severity_counts: Some(counts),
            findings: vec![finding(Severity::Low)],
            http_insights: HttpInsights::default(),
            next_steps: vec![],
        };
        result.normalize();
        assert_eq!(result.overall_risk_score, 0.0);
        // Last-write-wins on presence: no reconciliation with findings.
        assert_eq!(result.severity_counts.unwrap().get("Critical"), Some(&9));
    }

    #[test]
    fn stored_analysis_flattens_and_embeds_snapshot() {
        let stored = StoredAnalysis {
            analysis: AnalysisResult {
                summary: "s".into(),
                overall_risk_score: 1.0,
                severity_counts: None,
                findings: vec![],
                http_insights: HttpInsights::default(),
                next_steps: vec![],
            },
            http_response: Some(ResponseSnapshot {
                url: "https://example.com/".into(),
                status: 0,
                status_text: "NETWORK_ERROR".into(),
                headers: vec![],
                content_type: None,
                content_length: None,
                body_preview: "connection refused".into(),
                fetched_at: "2025-01-01T00:00:00Z".into(),
            }),
        };
        let value = serde_json::to_value(&stored).unwrap();
        assert_eq!(value["summary"], "s");
        assert_eq!(value["httpResponse"]["statusText"], "NETWORK_ERROR");

        let without = StoredAnalysis {
            http_response: None,
            ..stored
        };
        let value = serde_json::to_value(&without).unwrap();
        assert!(value.get("httpResponse").is_none());
    }
}
