use axum::{Json, extract::State, response::Html};
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

use crate::core::agent::ApiHealth;
use crate::state::AppState;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Service status
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StatusResponse {
    /// Always `running` while the process answers
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "running"))]
    pub status: &'static str,
    /// Completion API health label
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "OK"))]
    pub openai_api: ApiHealth,
    /// Model that answers the next turn
    #[cfg_attr(feature = "openapi", schema(example = "gpt-4o"))]
    pub model: String,
    /// Calls with a live conversation
    pub active_calls: usize,
}

/// Status dashboard
pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Service status and completion API health
#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        get,
        path = "/status",
        responses(
            (status = 200, description = "Service status", body = StatusResponse)
        ),
        tag = "status"
    )
)]
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusResponse> {
    let report = state.agent.health(state.config.llm.status_probe).await;
    let active_calls = state.sessions.len().await.unwrap_or_else(|e| {
        warn!("Failed to count sessions: {}", e);
        0
    });

    Json(StatusResponse {
        status: "running",
        openai_api: report.health,
        model: report.model,
        active_calls,
    })
}
