//! Wire types for the Twilio Calls resource.

use serde::Deserialize;

/// Twilio error code for dialing an unverified number from a trial account.
pub const UNVERIFIED_TRIAL_NUMBER_CODE: u32 = 21219;

/// Subset of the `Call` resource returned by `POST .../Calls.json`.
#[derive(Debug, Deserialize)]
pub struct CallResource {
    pub sid: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Twilio REST error body.
#[derive(Debug, Deserialize)]
pub struct TwilioErrorResponse {
    #[serde(default)]
    pub code: Option<u32>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub more_info: Option<String>,
}

impl TwilioErrorResponse {
    pub fn is_unverified_destination(&self) -> bool {
        if self.code == Some(UNVERIFIED_TRIAL_NUMBER_CODE) {
            return true;
        }
        let message = self.message.to_lowercase();
        message.contains("unverified") && message.contains("trial account")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unverified_by_code() {
        let err: TwilioErrorResponse = serde_json::from_str(
            r#"{"code":21219,"message":"The number +15551234567 is unverified.","more_info":"https://www.twilio.com/docs/errors/21219","status":400}"#,
        )
        .unwrap();
        assert!(err.is_unverified_destination());
    }

    #[test]
    fn test_unverified_by_message() {
        let err = TwilioErrorResponse {
            code: None,
            message: "The number is unverified. Trial accounts cannot make calls to unverified numbers".to_string(),
            more_info: None,
        };
        assert!(err.is_unverified_destination());
    }

    #[test]
    fn test_other_error() {
        let err: TwilioErrorResponse = serde_json::from_str(
            r#"{"code":21211,"message":"Invalid 'To' Phone Number","status":400}"#,
        )
        .unwrap();
        assert!(!err.is_unverified_destination());
    }
}
