//! Wire types for the OpenAI `/chat/completions` endpoint.

use serde::{Deserialize, Serialize};

use crate::core::session::Message;

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub max_tokens: u32,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Content of the first choice, if any.
    pub fn first_content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
    }
}

/// Error envelope: `{"error": {"message", "type", "code"}}`.
#[derive(Debug, Deserialize)]
pub struct OpenAIErrorResponse {
    pub error: OpenAIErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct OpenAIErrorBody {
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<serde_json::Value>,
}

impl OpenAIErrorBody {
    /// `code` as text; the API sends strings but older proxies send numbers.
    pub fn code_str(&self) -> Option<String> {
        match &self.code {
            Some(serde_json::Value::String(s)) => Some(s.clone()),
            Some(serde_json::Value::Number(n)) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Whether the error reports an exhausted account quota rather than a
    /// transient rate limit.
    pub fn is_quota_exhausted(&self) -> bool {
        self.code_str().as_deref() == Some("insufficient_quota")
            || self.error_type.as_deref() == Some("insufficient_quota")
            || self.message.to_lowercase().contains("exceeded your current quota")
    }
}
