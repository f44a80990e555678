use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::core::telephony::TelephonyError;

const VERIFICATION_REQUIRED_MESSAGE: &str = "This phone number is not verified with your Twilio \
trial account. Please verify it in your Twilio console first.";

/// Request-level failures for JSON and webhook endpoints
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidNumber(String),

    #[error("Invalid webhook signature")]
    InvalidSignature,

    #[error("Request body exceeds {0} bytes")]
    PayloadTooLarge(usize),

    #[error("{0}")]
    VerificationRequired(String),

    #[error("Failed to make call: {0}")]
    CallFailed(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidNumber(_) | Self::VerificationRequired(_) => StatusCode::BAD_REQUEST,
            Self::InvalidSignature => StatusCode::FORBIDDEN,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::CallFailed(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine-readable code; absent for generic failures.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::InvalidNumber(_) => Some("invalid_number"),
            Self::InvalidSignature => Some("invalid_signature"),
            Self::PayloadTooLarge(_) => Some("payload_too_large"),
            Self::VerificationRequired(_) => Some("verification_required"),
            Self::CallFailed(_) | Self::Internal(_) => None,
        }
    }
}

impl From<TelephonyError> for AppError {
    fn from(err: TelephonyError) -> Self {
        match err {
            TelephonyError::UnverifiedDestination(_) => {
                Self::VerificationRequired(VERIFICATION_REQUIRED_MESSAGE.to_string())
            }
            other => Self::CallFailed(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut body = json!({
            "status": "error",
            "message": self.to_string(),
        });
        if let Some(code) = self.code() {
            body["code"] = json!(code);
        }
        (status, Json(body)).into_response()
    }
}
