use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{info, warn};

use super::messages::{CallResource, TwilioErrorResponse};
use crate::core::telephony::base::{
    OutboundCallRequest, PlacedCall, TelephonyClient, TelephonyError, TelephonyResult,
};

/// Default Twilio REST API root.
pub const TWILIO_API_BASE_URL: &str = "https://api.twilio.com";

/// Default connect timeout in seconds.
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Account SID and auth token.
#[derive(Debug, Clone)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: String,
}

/// Twilio REST client for originating calls.
pub struct TwilioClient {
    http_client: Client,
    base_url: String,
    credentials: Option<TwilioCredentials>,
    timeout: Duration,
}

impl TwilioClient {
    pub fn new(
        credentials: Option<TwilioCredentials>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let http_client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|e| {
                warn!("Failed to build Twilio HTTP client, using defaults: {}", e);
                Client::new()
            });

        Self {
            http_client,
            base_url: base_url.into(),
            credentials,
            timeout,
        }
    }

    fn calls_url(&self, account_sid: &str) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Calls.json",
            self.base_url.trim_end_matches('/'),
            account_sid
        )
    }

    fn map_transport_error(&self, error: reqwest::Error) -> TelephonyError {
        if error.is_timeout() {
            TelephonyError::Timeout(self.timeout.as_millis() as u64)
        } else {
            TelephonyError::NetworkError(format!("Request failed: {error}"))
        }
    }
}

/// Map a non-success Calls response to an error variant.
pub(crate) fn classify_error(status: u16, body: &str) -> TelephonyError {
    let parsed = serde_json::from_str::<TwilioErrorResponse>(body).ok();

    match parsed {
        Some(err) if err.is_unverified_destination() => {
            TelephonyError::UnverifiedDestination(err.message)
        }
        Some(err) if status == 401 => TelephonyError::AuthenticationFailed(err.message),
        Some(err) => TelephonyError::ProviderError {
            status,
            code: err.code,
            message: if err.message.is_empty() {
                format!("HTTP {status}")
            } else {
                err.message
            },
        },
        None if status == 401 => {
            TelephonyError::AuthenticationFailed(format!("HTTP {status}: {body}"))
        }
        None => TelephonyError::ProviderError {
            status,
            code: None,
            message: format!("HTTP {status}: {body}"),
        },
    }
}

#[async_trait]
impl TelephonyClient for TwilioClient {
    async fn place_call(&self, request: &OutboundCallRequest) -> TelephonyResult<PlacedCall> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            TelephonyError::NotConfigured(
                "TWILIO_ACCOUNT_SID and TWILIO_AUTH_TOKEN must be set".to_string(),
            )
        })?;
        if request.from.is_empty() {
            return Err(TelephonyError::NotConfigured(
                "TWILIO_PHONE_NUMBER must be set".to_string(),
            ));
        }

        let response = self
            .http_client
            .post(self.calls_url(&credentials.account_sid))
            .basic_auth(&credentials.account_sid, Some(&credentials.auth_token))
            .form(&[
                ("To", request.to.as_str()),
                ("From", request.from.as_str()),
                ("Url", request.url.as_str()),
            ])
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !status.is_success() {
            return Err(classify_error(status.as_u16(), &body));
        }

        let call: CallResource = serde_json::from_str(&body).map_err(|e| {
            TelephonyError::ProviderError {
                status: status.as_u16(),
                code: None,
                message: format!("Failed to parse call resource: {e}"),
            }
        })?;

        info!(
            call_sid = %call.sid,
            to = %request.to,
            status = ?call.status,
            "Outbound call queued"
        );

        Ok(PlacedCall {
            call_sid: call.sid,
            status: call.status,
        })
    }

    fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calls_url() {
        let client = TwilioClient::new(None, "http://127.0.0.1:1234/", Duration::from_secs(5));
        assert_eq!(
            client.calls_url("AC123"),
            "http://127.0.0.1:1234/2010-04-01/Accounts/AC123/Calls.json"
        );
    }

    #[test]
    fn test_classify_unverified() {
        let body = r#"{"code":21219,"message":"The number +15551234567 is unverified. Trial accounts cannot make calls to unverified numbers.","status":400}"#;
        assert!(matches!(
            classify_error(400, body),
            TelephonyError::UnverifiedDestination(_)
        ));
    }

    #[test]
    fn test_classify_generic() {
        assert_eq!(
            classify_error(400, r#"{"code":21211,"message":"Invalid 'To' Phone Number"}"#),
            TelephonyError::ProviderError {
                status: 400,
                code: Some(21211),
                message: "Invalid 'To' Phone Number".to_string()
            }
        );
        assert!(matches!(
            classify_error(401, "Unauthorized"),
            TelephonyError::AuthenticationFailed(_)
        ));
    }

    #[tokio::test]
    async fn test_place_call_without_credentials() {
        let client = TwilioClient::new(None, TWILIO_API_BASE_URL, Duration::from_secs(5));
        let result = client
            .place_call(&OutboundCallRequest {
                to: "+15005550006".to_string(),
                from: "+15005550001".to_string(),
                url: "http://localhost/voice".to_string(),
            })
            .await;
        assert!(matches!(result, Err(TelephonyError::NotConfigured(_))));
    }
}
