//! AI provider configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// AI provider configuration.
///
/// Two model identifiers are recognized: a chat model for open-ended
/// conversation and an extraction model for strict-JSON calls (intent
/// classification, entity extraction, model-assisted actions).
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// API key for the provider.
    pub api_key: Option<String>,

    /// Base URL for the OpenAI-compatible API.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for open-ended chat completions.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,

    /// Model used for structured extraction calls.
    #[serde(default = "default_extraction_model")]
    pub extraction_model: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Whether the model-assisted action tier is enabled.
    /// The deterministic fallback tier is always available.
    #[serde(default)]
    pub enable_model_actions: bool,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if an API key is configured
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_ref().is_some_and(|k| !k.is_empty())
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.has_api_key() {
            return Err(ValidationError::MissingRequired("AURELIUS_AI__API_KEY"));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            chat_model: default_chat_model(),
            extraction_model: default_extraction_model(),
            timeout_secs: default_timeout(),
            enable_model_actions: false,
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_chat_model() -> String {
    "gpt-4o".to_string()
}

fn default_extraction_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout() -> u64 {
    30
}
