//! Language-model port.

use async_trait::async_trait;
use thiserror::Error;

/// Failure talking to a language model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model request timed out")]
    Timeout,
    #[error("model rate limited")]
    RateLimited,
    #[error("model request failed: {0}")]
    Request(String),
    #[error("model returned an unusable response: {0}")]
    BadResponse(String),
}

/// A chat-completion style language model.
///
/// The extractor treats every error as "nothing extracted"; a model outage
/// degrades the system to its deterministic passes rather than failing turns.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Completes one system + user prompt pair into raw text.
    async fn complete(&self, system: &str, user: &str) -> Result<String, ModelError>;
}
