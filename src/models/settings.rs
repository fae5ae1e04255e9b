//! Provider/model configuration stored as a single settings row.

use serde::{Deserialize, Serialize};

/// Supported generative-model providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    #[default]
    Xai,
    OpenAi,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Xai => "xai",
            Self::OpenAi => "openai",
        }
    }

    /// Parse the stored provider label, defaulting to xai.
    pub fn parse(s: &str) -> Self {
        match s {
            "openai" => Self::OpenAi,
            _ => Self::Xai,
        }
    }

    /// Model used when none is configured.
    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Xai => "grok-3",
            Self::OpenAi => "gpt-4o",
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current provider configuration.
#[derive(Debug, Clone, Serialize)]
pub struct Settings {
    pub provider: Provider,
    pub model: Option<String>,
    pub xai_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

impl Settings {
    /// The configured model name, or the provider default.
    pub fn model_name(&self) -> String {
        self.model
            .clone()
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| self.provider.default_model().to_string())
    }
}

/// Partial settings update; absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSettings {
    pub provider: Option<Provider>,
    pub model: Option<String>,
    pub xai_api_key: Option<String>,
    pub openai_api_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_parse_defaults_to_xai() {
        assert_eq!(Provider::parse("openai"), Provider::OpenAi);
        assert_eq!(Provider::parse("xai"), Provider::Xai);
        assert_eq!(Provider::parse("something-else"), Provider::Xai);
    }

    #[test]
    fn model_name_falls_back_to_provider_default() {
        let settings = Settings {
            provider: Provider::OpenAi,
            model: None,
            xai_api_key: None,
            openai_api_key: None,
        };
        assert_eq!(settings.model_name(), "gpt-4o");

        let settings = Settings {
            model: Some("grok-4".into()),
            provider: Provider::Xai,
            xai_api_key: None,
            openai_api_key: None,
        };
        assert_eq!(settings.model_name(), "grok-4");
    }
}
