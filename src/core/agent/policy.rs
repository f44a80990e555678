use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What to do when the chat-completion API rate-limits a caller's turn.
///
/// An exhausted account quota is not a rate limit: it always ends the call,
/// whatever the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateLimitPolicy {
    /// Apologize and hang up.
    Hangup,
    /// Apologize, pause, and listen again.
    #[default]
    PauseAndReprompt,
    /// Retry the turn once on the fallback model, then pause and listen again.
    FallbackModel,
}

impl RateLimitPolicy {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hangup => "hangup",
            Self::PauseAndReprompt => "pause_and_reprompt",
            Self::FallbackModel => "fallback_model",
        }
    }
}

impl std::fmt::Display for RateLimitPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RateLimitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "hangup" | "fail_fast" => Ok(Self::Hangup),
            "pause_and_reprompt" | "pause" | "reprompt" => Ok(Self::PauseAndReprompt),
            "fallback_model" | "retry_with_fallback_model" | "fallback" => Ok(Self::FallbackModel),
            other => Err(format!(
                "Unknown rate limit policy '{other}'. Expected one of: hangup, pause_and_reprompt, fallback_model"
            )),
        }
    }
}
