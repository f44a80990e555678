use axum::{Router, middleware, routing::post};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::core::agent::{END_CALL_PATH, PROCESS_SPEECH_PATH, VOICE_PATH};
use crate::handlers::voice;
use crate::middleware::twilio_signature_middleware;
use crate::state::AppState;

/// Twilio call-lifecycle webhooks (signature-checked when enabled)
pub fn create_webhook_router(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(VOICE_PATH, post(voice::voice))
        .route(PROCESS_SPEECH_PATH, post(voice::process_speech))
        .route(END_CALL_PATH, post(voice::end_call))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            twilio_signature_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}
