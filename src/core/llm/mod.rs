//! Chat-completion backends.
//!
//! The voice agent talks to a [`ChatCompletion`] implementation; the only
//! concrete backend is the OpenAI-compatible [`OpenAIChat`] client.

mod base;
pub mod openai;

pub use base::{ChatCompletion, ChatRequest, LlmError, LlmResult};
pub use openai::{OPENAI_API_BASE_URL, OpenAIChat, OpenAIChatConfig};
