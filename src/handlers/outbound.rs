use axum::{
    Extension, Json,
    extract::{Query, State},
    http::HeaderMap,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use crate::auth::Auth;
use crate::core::agent::VOICE_PATH;
use crate::core::telephony::OutboundCallRequest;
use crate::errors::app_error::{AppError, AppResult};
use crate::state::AppState;
use crate::utils::{public_origin, validate_phone_number};

#[derive(Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::IntoParams))]
pub struct CallMeQuery {
    /// E.164 destination; the configured default when absent
    pub number: Option<String>,
}

#[derive(Debug, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CallMeResponse {
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "success"))]
    pub status: &'static str,
    #[cfg_attr(feature = "openapi", schema(example = "Calling +15005550006 now..."))]
    pub message: String,
    pub call_sid: String,
}

/// Place an outbound call that connects to the voice agent
#[cfg_attr(
    feature = "openapi",
    utoipa::path(
        get,
        path = "/callme",
        params(CallMeQuery),
        responses(
            (status = 200, description = "Call placed", body = CallMeResponse),
            (status = 400, description = "Invalid or unverified destination number"),
            (status = 401, description = "Missing or invalid API secret"),
            (status = 500, description = "Provider failure")
        ),
        security(
            ("bearer_auth" = [])
        ),
        tag = "calls"
    )
)]
pub async fn call_me(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<Auth>,
    headers: HeaderMap,
    Query(query): Query<CallMeQuery>,
) -> AppResult<Json<CallMeResponse>> {
    let telephony = &state.config.telephony;

    let requested = query
        .number
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(&telephony.default_destination);
    let to = validate_phone_number(requested).map_err(AppError::InvalidNumber)?;

    let origin = public_origin(&headers, telephony.public_base_url.as_deref()).ok_or_else(|| {
        AppError::CallFailed("cannot build callback URL without a Host header".to_string())
    })?;
    let request = OutboundCallRequest {
        to: to.clone(),
        from: telephony.phone_number.clone().unwrap_or_default(),
        url: format!("{origin}{VOICE_PATH}"),
    };

    let placed = state.telephony.place_call(&request).await.map_err(|e| {
        error!(to = %request.to, "Error making outbound call: {}", e);
        AppError::from(e)
    })?;

    info!(
        to = %request.to,
        call_sid = %placed.call_sid,
        auth_id = ?auth.id,
        "Outbound call initiated"
    );

    Ok(Json(CallMeResponse {
        status: "success",
        message: format!("Calling {to} now..."),
        call_sid: placed.call_sid,
    }))
}
