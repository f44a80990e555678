//! Domain logic: conversation flow, transcripts, and provider clients.

pub mod agent;
pub mod llm;
pub mod session;
pub mod telephony;
pub mod twiml;

// Re-export commonly used types for convenience
pub use agent::{AgentSettings, RateLimitPolicy, VoiceAgent};
pub use llm::{ChatCompletion, ChatRequest, LlmError, LlmResult, OpenAIChat, OpenAIChatConfig};
pub use session::{CallSession, InMemorySessionStore, Message, Role, SessionError, SessionStore};
pub use telephony::{
    OutboundCallRequest, PlacedCall, TelephonyClient, TelephonyError, TwilioClient,
};
pub use twiml::{Gather, VoiceResponse};
