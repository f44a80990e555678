//! Conversation turn handling for phone calls.
//!
//! [`VoiceAgent`] turns call-lifecycle events into TwiML. It owns no state
//! itself: transcripts live in the injected [`SessionStore`] and replies come
//! from the injected [`ChatCompletion`] backend.
//!
//! Turn flow:
//! 1. Call start seeds the transcript with the system instruction, greets the
//!    caller and gathers speech.
//! 2. Each recognized utterance is appended, the whole transcript is sent for
//!    completion, and the reply is appended, spoken, and followed by another
//!    gather.
//! 3. Call end drops the transcript.
//!
//! Completion failures never crash a call; they degrade to spoken apologies
//! according to [`RateLimitPolicy`].

mod health;
mod policy;
pub mod prompts;

pub use health::{ApiHealth, HealthReport, check_health};
pub use policy::RateLimitPolicy;

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::ServerConfig;
use crate::core::llm::{ChatCompletion, ChatRequest, LlmError};
use crate::core::session::{Message, SessionResult, SessionStore};
use crate::core::twiml::{Gather, VoiceResponse};

/// Call-start webhook path; also the redirect target when a gather times out.
pub const VOICE_PATH: &str = "/voice";
/// Speech-turn webhook path; the gather action.
pub const PROCESS_SPEECH_PATH: &str = "/process_speech";
/// Call-end webhook path.
pub const END_CALL_PATH: &str = "/end_call";

/// Tunables for the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSettings {
    pub system_prompt: String,
    /// TwiML `<Say voice>`
    pub voice: String,
    /// Speech recognition language
    pub language: String,
    /// `<Gather speechTimeout>`
    pub speech_timeout: String,
    pub model: String,
    pub fallback_model: Option<String>,
    pub max_tokens: u32,
    pub rate_limit_policy: RateLimitPolicy,
    pub rate_limit_pause_seconds: u32,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            system_prompt: prompts::DEFAULT_SYSTEM_PROMPT.to_string(),
            voice: "alice".to_string(),
            language: "en-US".to_string(),
            speech_timeout: "auto".to_string(),
            model: "gpt-4o".to_string(),
            fallback_model: Some("gpt-3.5-turbo".to_string()),
            max_tokens: 200,
            rate_limit_policy: RateLimitPolicy::default(),
            rate_limit_pause_seconds: 3,
        }
    }
}

impl AgentSettings {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            system_prompt: config.agent.system_prompt.clone(),
            voice: config.agent.voice.clone(),
            language: config.agent.language.clone(),
            speech_timeout: config.agent.speech_timeout.clone(),
            model: config.llm.model.clone(),
            fallback_model: config.llm.fallback_model.clone(),
            max_tokens: config.llm.max_tokens,
            rate_limit_policy: config.llm.rate_limit_policy,
            rate_limit_pause_seconds: config.llm.rate_limit_pause_seconds,
        }
    }
}

/// Generated reply and the model that produced it.
struct Reply {
    text: String,
    model: String,
}

/// Answers call-lifecycle webhooks.
pub struct VoiceAgent {
    sessions: Arc<dyn SessionStore>,
    chat: Arc<dyn ChatCompletion>,
    settings: AgentSettings,
}

impl VoiceAgent {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        chat: Arc<dyn ChatCompletion>,
        settings: AgentSettings,
    ) -> Self {
        Self {
            sessions,
            chat,
            settings,
        }
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Call-start webhook.
    ///
    /// A new call is greeted; a call that already has a transcript (the
    /// provider redirecting back after a gather timeout) only gets a fresh
    /// gather.
    pub async fn start_call(&self, call_sid: &str) -> VoiceResponse {
        match self
            .sessions
            .create(call_sid, &self.settings.system_prompt)
            .await
        {
            Ok(true) => {
                info!(call_sid = %call_sid, "New call received");
                VoiceResponse::new()
                    .say(prompts::GREETING, &self.settings.voice)
                    .gather(self.capture())
                    .redirect(VOICE_PATH)
            }
            Ok(false) => {
                debug!(call_sid = %call_sid, "Call re-entered, gathering again");
                self.reprompt(VoiceResponse::new())
            }
            Err(e) => {
                error!(call_sid = %call_sid, "Failed to create call session: {}", e);
                self.reprompt(VoiceResponse::new())
            }
        }
    }

    /// Speech-turn webhook.
    pub async fn handle_speech(&self, call_sid: &str, speech: Option<&str>) -> VoiceResponse {
        let Some(utterance) = speech.map(str::trim).filter(|s| !s.is_empty()) else {
            debug!(call_sid = %call_sid, "No speech detected");
            return self.reprompt(VoiceResponse::new().say(prompts::NO_SPEECH, &self.settings.voice));
        };

        debug!(call_sid = %call_sid, "User said: {}", utterance);

        let transcript = match self.record_utterance(call_sid, utterance).await {
            Ok(transcript) => transcript,
            Err(e) => {
                error!(call_sid = %call_sid, "Failed to record utterance: {}", e);
                return self.reprompt(
                    VoiceResponse::new().say(prompts::GENERIC_FAILURE, &self.settings.voice),
                );
            }
        };

        let started = Instant::now();
        match self.generate_reply(transcript).await {
            Ok(reply) => {
                debug!(
                    call_sid = %call_sid,
                    model = %reply.model,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "AI replied: {}",
                    reply.text
                );
                if let Err(e) = self
                    .sessions
                    .append(call_sid, Message::assistant(reply.text.clone()))
                    .await
                {
                    warn!(call_sid = %call_sid, "Failed to record reply: {}", e);
                }
                VoiceResponse::new()
                    .say(reply.text, &self.settings.voice)
                    .say(prompts::FOLLOW_UP, &self.settings.voice)
                    .gather(self.capture())
                    .redirect(PROCESS_SPEECH_PATH)
            }
            Err(e) => {
                error!(call_sid = %call_sid, "Error generating response: {}", e);
                self.failure_response(&e)
            }
        }
    }

    /// Call-end webhook. Idempotent.
    pub async fn end_call(&self, call_sid: &str) -> VoiceResponse {
        let snapshot = self.sessions.get(call_sid).await.ok().flatten();
        match self.sessions.delete(call_sid).await {
            Ok(true) => {
                let (turns, secs) = snapshot
                    .map(|s| (s.len().saturating_sub(1), s.age().as_secs()))
                    .unwrap_or_default();
                info!(
                    call_sid = %call_sid,
                    messages = turns,
                    duration_secs = secs,
                    "Call ended and conversation removed"
                );
            }
            Ok(false) => debug!(call_sid = %call_sid, "Call ended without a conversation"),
            Err(e) => error!(call_sid = %call_sid, "Failed to remove conversation: {}", e),
        }
        VoiceResponse::new()
    }

    /// Answer for a webhook that arrived without a call identifier.
    pub fn unidentified_call(&self) -> VoiceResponse {
        warn!("Webhook without CallSid, ending call");
        VoiceResponse::new()
            .say(prompts::UNIDENTIFIED_CALL, &self.settings.voice)
            .hangup()
    }

    /// Health of the completion backend for the status endpoint.
    pub async fn health(&self, live: bool) -> HealthReport {
        check_health(self.chat.as_ref(), &self.settings, live).await
    }

    fn capture(&self) -> Gather {
        Gather::speech(PROCESS_SPEECH_PATH)
            .speech_timeout(self.settings.speech_timeout.clone())
            .language(self.settings.language.clone())
    }

    /// Append a gather, and a redirect back to call start for when it times out.
    fn reprompt(&self, response: VoiceResponse) -> VoiceResponse {
        response.gather(self.capture()).redirect(VOICE_PATH)
    }

    async fn record_utterance(&self, call_sid: &str, utterance: &str) -> SessionResult<Vec<Message>> {
        if self
            .sessions
            .create(call_sid, &self.settings.system_prompt)
            .await?
        {
            debug!(call_sid = %call_sid, "Speech arrived before call start, session created");
        }
        self.sessions
            .append(call_sid, Message::user(utterance))
            .await
    }

    async fn generate_reply(&self, transcript: Vec<Message>) -> Result<Reply, LlmError> {
        let request = ChatRequest::new(
            self.settings.model.clone(),
            transcript,
            self.settings.max_tokens,
        );

        match self.chat.complete(&request).await {
            Ok(text) => Ok(Reply {
                text,
                model: request.model,
            }),
            Err(e) if e.is_rate_limited() => match self.fallback_model(&request.model) {
                Some(fallback) => {
                    warn!(
                        model = %request.model,
                        fallback = %fallback,
                        "Primary model rate limited, retrying on fallback model"
                    );
                    let retry = request.with_model(fallback);
                    let text = self.chat.complete(&retry).await?;
                    Ok(Reply {
                        text,
                        model: retry.model,
                    })
                }
                None => Err(e),
            },
            Err(e) => Err(e),
        }
    }

    fn fallback_model(&self, current: &str) -> Option<String> {
        if self.settings.rate_limit_policy != RateLimitPolicy::FallbackModel {
            return None;
        }
        self.settings
            .fallback_model
            .as_deref()
            .filter(|m| *m != current)
            .map(str::to_string)
    }

    fn failure_response(&self, error: &LlmError) -> VoiceResponse {
        let voice = self.settings.voice.as_str();
        match error {
            LlmError::QuotaExceeded(_) => VoiceResponse::new()
                .say(prompts::QUOTA_EXHAUSTED, voice)
                .hangup(),
            LlmError::RateLimited { .. } => match self.settings.rate_limit_policy {
                RateLimitPolicy::Hangup => {
                    VoiceResponse::new().say(prompts::AT_CAPACITY, voice).hangup()
                }
                RateLimitPolicy::PauseAndReprompt | RateLimitPolicy::FallbackModel => self
                    .reprompt(
                        VoiceResponse::new()
                            .say(prompts::HIGH_DEMAND, voice)
                            .pause(self.settings.rate_limit_pause_seconds),
                    ),
            },
            _ => self.reprompt(VoiceResponse::new().say(prompts::GENERIC_FAILURE, voice)),
        }
    }
}
