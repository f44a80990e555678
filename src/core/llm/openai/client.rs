use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

use super::messages::{ChatCompletionRequest, ChatCompletionResponse, OpenAIErrorResponse};
use crate::core::llm::base::{ChatCompletion, ChatRequest, LlmError, LlmResult};

// =============================================================================
// Constants
// =============================================================================

/// Default API root; `/chat/completions` is appended.
pub const OPENAI_API_BASE_URL: &str = "https://api.openai.com/v1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 6;

/// Default connect timeout in seconds.
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Base delay for exponential backoff (milliseconds).
const BASE_RETRY_DELAY_MS: u64 = 250;

/// Ceiling for a single backoff sleep (milliseconds).
const MAX_RETRY_DELAY_MS: u64 = 2_000;

/// User-Agent header value for API requests.
const USER_AGENT: &str = concat!("voicebot-gateway/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Configuration
// =============================================================================

#[derive(Debug, Clone)]
pub struct OpenAIChatConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub timeout: Duration,
    /// Extra attempts after a transient failure (network, timeout, 5xx).
    pub max_retries: u32,
}

impl Default for OpenAIChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: OPENAI_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: 1,
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// Chat-completion client for OpenAI-compatible APIs.
pub struct OpenAIChat {
    http_client: Client,
    config: OpenAIChatConfig,
}

impl OpenAIChat {
    pub fn new(config: OpenAIChatConfig) -> Self {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build OpenAI HTTP client, using defaults: {}", e);
                Client::new()
            });

        Self {
            http_client,
            config,
        }
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// One HTTP round trip, classified into [`LlmError`] on failure.
    async fn send_request(&self, api_key: &str, request: &ChatRequest) -> LlmResult<String> {
        let body = ChatCompletionRequest {
            model: &request.model,
            messages: &request.messages,
            max_tokens: request.max_tokens,
        };

        let response = self
            .http_client
            .post(self.completions_url())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let retry_after_ms = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse::<f64>().ok())
            .map(|secs| (secs * 1000.0) as u64);

        let response_text = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &response_text, retry_after_ms));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&response_text)
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {e}")))?;

        parsed
            .first_content()
            .ok_or_else(|| LlmError::InvalidResponse("Response contained no choices".to_string()))
    }

    fn map_transport_error(&self, error: reqwest::Error) -> LlmError {
        if error.is_timeout() {
            LlmError::Timeout(self.config.timeout.as_millis() as u64)
        } else {
            LlmError::NetworkError(format!("Request failed: {error}"))
        }
    }
}

/// Backoff before retry number `attempt + 1`, doubling from 250 ms up to 2 s.
pub fn retry_delay(attempt: u32) -> Duration {
    let factor = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
    Duration::from_millis(
        BASE_RETRY_DELAY_MS
            .saturating_mul(factor)
            .min(MAX_RETRY_DELAY_MS),
    )
}

/// Longest a single `complete` call can take: every attempt timing out plus
/// the sleeps between them.
pub fn worst_case_latency(timeout: Duration, max_retries: u32) -> Duration {
    let attempts = timeout.saturating_mul(max_retries.saturating_add(1));
    (0..max_retries).fold(attempts, |total, attempt| {
        total.saturating_add(retry_delay(attempt))
    })
}

/// Map a non-success response to an error variant.
pub(crate) fn classify_error(status: u16, body: &str, retry_after_ms: Option<u64>) -> LlmError {
    let parsed = serde_json::from_str::<OpenAIErrorResponse>(body).ok();
    let message = parsed
        .as_ref()
        .map(|e| e.error.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {status}: {body}"));

    match status {
        401 | 403 => LlmError::AuthenticationFailed(message),
        429 => {
            if parsed.as_ref().is_some_and(|e| e.error.is_quota_exhausted()) {
                LlmError::QuotaExceeded(message)
            } else {
                LlmError::RateLimited {
                    message,
                    retry_after_ms,
                }
            }
        }
        400 | 404 | 422 => LlmError::InvalidRequest(message),
        500..=599 => LlmError::ServerError { status, message },
        _ => LlmError::ProviderError(message),
    }
}

#[async_trait]
impl ChatCompletion for OpenAIChat {
    async fn complete(&self, request: &ChatRequest) -> LlmResult<String> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        let mut attempt = 0;
        loop {
            match self.send_request(api_key, request).await {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = retry_delay(attempt).as_millis() as u64;
                    warn!(
                        model = %request.model,
                        attempt = attempt + 1,
                        delay_ms = delay,
                        "Transient chat completion failure, retrying: {}",
                        e
                    );
                    tokio::time::sleep(Duration::from_millis(delay)).await;
                    attempt += 1;
                }
                Err(e) => {
                    debug!(model = %request.model, "Chat completion failed: {}", e);
                    return Err(e);
                }
            }
        }
    }

    fn is_configured(&self) -> bool {
        self.config.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }

    fn provider_name(&self) -> &'static str {
        "openai"
    }
}
