//! Provider-agnostic chat-completion types.

use async_trait::async_trait;
use thiserror::Error;

use crate::core::session::Message;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur while requesting a chat completion.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LlmError {
    /// No API key configured
    #[error("Missing API key")]
    MissingApiKey,

    /// Credentials rejected by the provider
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Too many requests; the account may recover shortly
    #[error("Rate limit exceeded: {message}")]
    RateLimited {
        message: String,
        retry_after_ms: Option<u64>,
    },

    /// Account quota or billing limit exhausted
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Request rejected as malformed (unknown model, bad parameters, ...)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// 5xx from the provider
    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },

    /// Transport failure before a response arrived
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The request exceeded the configured timeout
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// The response did not contain a usable reply
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Any other provider error
    #[error("Provider error: {0}")]
    ProviderError(String),
}

impl LlmError {
    /// Transient failures worth retrying on the same model.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::NetworkError(_) | LlmError::Timeout(_) | LlmError::ServerError { .. }
        )
    }

    pub fn is_rate_limited(&self) -> bool {
        matches!(self, LlmError::RateLimited { .. })
    }
}

pub type LlmResult<T> = Result<T, LlmError>;

// =============================================================================
// Request
// =============================================================================

/// A chat-completion request over a call transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    /// Upper bound on reply length
    pub max_tokens: u32,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens,
        }
    }

    /// Same transcript and cap on a different model.
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: self.messages.clone(),
            max_tokens: self.max_tokens,
        }
    }
}

// =============================================================================
// Trait
// =============================================================================

/// A chat-completion backend.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Text of the first reply choice.
    async fn complete(&self, request: &ChatRequest) -> LlmResult<String>;

    /// Whether credentials are present. Does not contact the provider.
    fn is_configured(&self) -> bool;

    /// Short provider name for logs.
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(LlmError::NetworkError("reset".into()).is_retryable());
        assert!(LlmError::Timeout(30_000).is_retryable());
        assert!(
            LlmError::ServerError {
                status: 503,
                message: "busy".into()
            }
            .is_retryable()
        );
        assert!(
            !LlmError::RateLimited {
                message: "slow down".into(),
                retry_after_ms: None
            }
            .is_retryable()
        );
        assert!(!LlmError::QuotaExceeded("billing".into()).is_retryable());
        assert!(!LlmError::MissingApiKey.is_retryable());
    }

    #[test]
    fn test_with_model_keeps_transcript() {
        let request = ChatRequest::new("gpt-4o", vec![Message::user("hi")], 200);
        let fallback = request.with_model("gpt-3.5-turbo");
        assert_eq!(fallback.model, "gpt-3.5-turbo");
        assert_eq!(fallback.messages, request.messages);
        assert_eq!(fallback.max_tokens, 200);
    }
}
