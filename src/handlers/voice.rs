//! Call-lifecycle webhooks posted by Twilio.
//!
//! Every handler answers `text/xml` TwiML, failures included: a missing
//! `CallSid` ends the call with an apology, completion and storage failures
//! become spoken apologies.

use axum::{Form, extract::State};
use serde::Deserialize;
use std::sync::Arc;

use crate::core::twiml::VoiceResponse;
use crate::state::AppState;

/// Fields shared by all call webhooks. Twilio sends many more; they are ignored.
#[derive(Debug, Deserialize)]
pub struct CallWebhook {
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SpeechWebhook {
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
    #[serde(rename = "SpeechResult")]
    pub speech_result: Option<String>,
}

fn present(call_sid: Option<String>) -> Option<String> {
    call_sid.filter(|sid| !sid.trim().is_empty())
}

/// `POST /voice`
pub async fn voice(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CallWebhook>,
) -> VoiceResponse {
    let Some(call_sid) = present(form.call_sid) else {
        return state.agent.unidentified_call();
    };
    state.agent.start_call(&call_sid).await
}

/// `POST /process_speech`
pub async fn process_speech(
    State(state): State<Arc<AppState>>,
    Form(form): Form<SpeechWebhook>,
) -> VoiceResponse {
    let Some(call_sid) = present(form.call_sid) else {
        return state.agent.unidentified_call();
    };
    state
        .agent
        .handle_speech(&call_sid, form.speech_result.as_deref())
        .await
}

/// `POST /end_call`
pub async fn end_call(
    State(state): State<Arc<AppState>>,
    Form(form): Form<CallWebhook>,
) -> VoiceResponse {
    match present(form.call_sid) {
        Some(call_sid) => state.agent.end_call(&call_sid).await,
        None => VoiceResponse::new(),
    }
}
