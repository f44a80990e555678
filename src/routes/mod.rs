pub mod api;
pub mod webhooks;

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// Every route group with its own middleware, state applied.
///
/// Process-wide layers (CORS, rate limiting, security headers) are added by
/// the binary.
pub fn create_app_router(state: Arc<AppState>) -> Router {
    api::create_api_router()
        .merge(api::create_outbound_router(&state))
        .merge(webhooks::create_webhook_router(&state))
        .with_state(state)
}
