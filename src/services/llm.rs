//! Schema-constrained generative backend.
//!
//! Both supported providers speak the OpenAI-compatible chat-completions
//! protocol and differ only in endpoint and credential, so a single client
//! implementation serves both; selection is a configuration-driven factory
//! lookup. The output contract (defaults applied, enums constrained) is
//! enforced here by strict deserialization plus normalization — schema
//! violations are retried inside this layer and never leak to callers.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::analysis::AnalysisResult;
use crate::models::settings::{Provider, Settings};

const XAI_API_URL: &str = "https://api.x.ai/v1/chat/completions";
const OPENAI_API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Additional attempts after the first when the model output fails the
/// schema contract.
const MAX_SCHEMA_RETRIES: usize = 2;

const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(120);

/// System message pinning the exact output document shape.
const SYSTEM_PROMPT: &str = "\
You are a security analysis engine. Respond with a single JSON object and nothing else, \
using exactly these fields: summary (string), overallRiskScore (number 0-100), \
severityCounts (object of severity label to count, optional), findings (array of objects \
with title, severity one of Critical|High|Medium|Low|Info, description, evidence?, \
recommendations[], commands[], references[], relatedHeaders[], relatedParams[], \
relatedCookies[], relatedBodyKeys[]), httpInsights (object with headers[], cookies[], \
params[], bodyFindings[]; header entries carry name, purpose, isStandard, issues[], \
recommendations[], exampleCommands[]; cookie/param entries carry name plus the same \
arrays; body entries carry key plus the same arrays), nextSteps (array of strings). \
Every array must be present, possibly empty.";

/// Capability interface for a configured generative model.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Produce an analysis conforming to every structural invariant of
    /// [`AnalysisResult`], or fail with `AppError::Generation`.
    async fn generate(&self, prompt: &str) -> Result<AnalysisResult, AppError>;

    /// `provider:model` label recorded on persisted reports.
    fn label(&self) -> String;
}

impl std::fmt::Debug for dyn GenerativeModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GenerativeModel({})", self.label())
    }
}

/// Resolve the configured provider into a model handle. Fails with a
/// configuration error when the selected provider has no credential.
pub fn resolve(settings: &Settings) -> Result<Box<dyn GenerativeModel>, AppError> {
    let model_name = settings.model_name();
    let (api_key, base_url) = match settings.provider {
        Provider::Xai => (
            settings.xai_api_key.clone().filter(|k| !k.is_empty()).ok_or_else(|| {
                AppError::Configuration(
                    "Set XAI_API_KEY in Settings or switch the provider".to_string(),
                )
            })?,
            XAI_API_URL,
        ),
        Provider::OpenAi => (
            settings.openai_api_key.clone().filter(|k| !k.is_empty()).ok_or_else(|| {
                AppError::Configuration(
                    "Set OPENAI_API_KEY in Settings or switch the provider".to_string(),
                )
            })?,
            OPENAI_API_URL,
        ),
    };

    Ok(Box::new(ChatCompletionsModel::new(
        settings.provider,
        base_url.to_string(),
        api_key,
        model_name,
    )?))
}

/// OpenAI-compatible chat-completions client used for both providers.
pub struct ChatCompletionsModel {
    client: Client,
    provider: Provider,
    base_url: String,
    api_key: String,
    model: String,
}

impl ChatCompletionsModel {
    pub fn new(
        provider: Provider,
        base_url: String,
        api_key: String,
        model: String,
    ) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            provider,
            base_url,
            api_key,
            model,
        })
    }

    async fn complete(&self, prompt: &str) -> Result<String, AppError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt.to_string(),
                },
            ],
            response_format: ResponseFormat { kind: "json_object" },
        };

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Generation(format!("Model API request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::Generation(format!(
                "Model API error ({status}): {detail}"
            )));
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::Generation(format!("Failed to parse model API response: {e}")))?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::Generation("Model API returned no choices".to_string()))
    }
}

#[async_trait]
impl GenerativeModel for ChatCompletionsModel {
    async fn generate(&self, prompt: &str) -> Result<AnalysisResult, AppError> {
        let mut last_violation = String::new();
        for attempt in 0..=MAX_SCHEMA_RETRIES {
            let text = self.complete(prompt).await?;
            match parse_analysis(&text) {
                Ok(mut analysis) => {
                    analysis.normalize();
                    return Ok(analysis);
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        model = %self.model,
                        error = %e,
                        "Model output failed schema validation; retrying"
                    );
                    last_violation = e.to_string();
                }
            }
        }
        Err(AppError::Generation(format!(
            "Model output failed schema validation after {} attempts: {last_violation}",
            MAX_SCHEMA_RETRIES + 1
        )))
    }

    fn label(&self) -> String {
        format!("{}:{}", self.provider, self.model)
    }
}

/// Parse model output into the analysis schema, tolerating code fences.
fn parse_analysis(text: &str) -> Result<AnalysisResult, serde_json::Error> {
    serde_json::from_str(strip_code_fences(text))
}

fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: String,
}
