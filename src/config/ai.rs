//! Language-model settings.

use secrecy::Secret;
use serde::Deserialize;

use super::ValidationError;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// API key for the hosted model. Absent means the language-model
    /// extraction pass is disabled and only deterministic passes run.
    pub api_key: Option<Secret<String>>,
    pub model: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            timeout_secs: 15,
        }
    }
}

impl AiConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.model.trim().is_empty() {
            return Err(ValidationError::new("ai.model", "must not be empty"));
        }
        if !self.base_url.starts_with("http") {
            return Err(ValidationError::new(
                "ai.base_url",
                "must be an http(s) URL",
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::new("ai.timeout_secs", "must be at least 1"));
        }
        Ok(())
    }
}
