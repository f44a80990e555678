use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http_body_util::LengthLimitError;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::telephony::twilio::{SIGNATURE_HEADER, validate_signature};
use crate::errors::app_error::AppError;
use crate::state::AppState;
use crate::utils::public_origin;

/// Largest webhook body buffered for signature checking. Twilio form posts
/// are a few KB.
pub const MAX_WEBHOOK_BODY_BYTES: usize = 64 * 1024;

/// Reject call-lifecycle webhooks without a valid `X-Twilio-Signature`
///
/// No-op unless `telephony.validate_signatures` is set. The signed URL is the
/// public origin plus the request path and query; the form body is buffered,
/// checked, and handed on unchanged.
pub async fn twilio_signature_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let telephony = &state.config.telephony;
    if !telephony.validate_signatures {
        return Ok(next.run(request).await);
    }
    let auth_token = telephony.auth_token.as_deref().ok_or_else(|| {
        AppError::Internal("Signature validation enabled without an auth token".to_string())
    })?;

    let (parts, body) = request.into_parts();

    let signature = parts
        .headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let Some(signature) = signature else {
        warn!(path = %parts.uri.path(), "Webhook without signature rejected");
        return Err(AppError::InvalidSignature);
    };

    let origin = public_origin(&parts.headers, telephony.public_base_url.as_deref())
        .ok_or(AppError::InvalidSignature)?;
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| parts.uri.path());
    let url = format!("{origin}{path_and_query}");

    let body_bytes = axum::body::to_bytes(body, MAX_WEBHOOK_BODY_BYTES)
        .await
        .map_err(|e| {
            let e = e.into_inner();
            if e.downcast_ref::<LengthLimitError>().is_some() {
                warn!(path = %parts.uri.path(), "Webhook body over size limit rejected");
                AppError::PayloadTooLarge(MAX_WEBHOOK_BODY_BYTES)
            } else {
                AppError::Internal(format!("Failed to read request body: {e}"))
            }
        })?;
    let params: Vec<(String, String)> = url::form_urlencoded::parse(&body_bytes)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if !validate_signature(auth_token, &url, &params, &signature) {
        warn!(url = %url, "Webhook signature mismatch");
        return Err(AppError::InvalidSignature);
    }
    debug!(url = %url, "Webhook signature verified");

    let request = Request::from_parts(parts, Body::from(body_bytes));
    Ok(next.run(request).await)
}
