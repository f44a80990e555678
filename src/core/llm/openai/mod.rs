//! OpenAI chat-completion backend.
//!
//! # API Reference
//!
//! - Endpoint: `POST {base_url}/chat/completions`
//! - Auth: `Authorization: Bearer <key>`
//! - 429 responses carry either a transient rate limit or, with
//!   `code = "insufficient_quota"`, an exhausted account quota.
//!
//! The base URL is configurable so any OpenAI-compatible server (or a test
//! double) can be used.

mod client;
mod messages;

pub use client::{
    OPENAI_API_BASE_URL, OpenAIChat, OpenAIChatConfig, retry_delay, worst_case_latency,
};
