use axum::{Router, middleware, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::{api, outbound};
use crate::middleware::auth_middleware;
use crate::state::AppState;

/// Public routes: status page and status probe
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(api::index))
        .route("/status", get(api::status))
        .layer(TraceLayer::new_for_http())
}

/// Outbound call trigger (auth required when AUTH_REQUIRED=true)
pub fn create_outbound_router(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/callme", get(outbound::call_me))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}
