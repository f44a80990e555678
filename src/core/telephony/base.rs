//! Provider-agnostic outbound calling types.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while placing an outbound call.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TelephonyError {
    /// Account credentials or the source number are missing
    #[error("Telephony not configured: {0}")]
    NotConfigured(String),

    /// Trial accounts may only dial verified numbers
    #[error("Destination is unverified: {0}")]
    UnverifiedDestination(String),

    /// Credentials rejected by the provider
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Transport failure before a response arrived
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The request exceeded the configured timeout
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// Any other provider-reported failure
    #[error("{message}")]
    ProviderError {
        status: u16,
        code: Option<u32>,
        message: String,
    },
}

pub type TelephonyResult<T> = Result<T, TelephonyError>;

/// A call to place: dial `to` from `from`, fetching call instructions from `url`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundCallRequest {
    pub to: String,
    pub from: String,
    pub url: String,
}

/// Provider acknowledgement of a queued call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedCall {
    pub call_sid: String,
    pub status: Option<String>,
}

/// A telephony provider able to originate calls.
#[async_trait]
pub trait TelephonyClient: Send + Sync {
    async fn place_call(&self, request: &OutboundCallRequest) -> TelephonyResult<PlacedCall>;

    /// Whether account credentials are present. Does not contact the provider.
    fn is_configured(&self) -> bool;
}
