use serde::Serialize;
use tracing::warn;

use super::{AgentSettings, RateLimitPolicy};
use crate::core::llm::{ChatCompletion, ChatRequest, LlmError};
use crate::core::session::Message;

/// Reply cap for connectivity probes.
const PROBE_MAX_TOKENS: u32 = 5;

/// Longest error excerpt reported by the status endpoint.
const ERROR_EXCERPT_CHARS: usize = 50;

/// Completion API health as reported by `GET /status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiHealth {
    Ok,
    MissingApiKey,
    RateLimited,
    QuotaExceeded,
    /// Primary model rate limited, fallback answering
    FallbackMode,
    /// Primary and fallback both failing
    AllModelsUnavailable,
    Error(String),
}

impl ApiHealth {
    pub fn label(&self) -> String {
        match self {
            Self::Ok => "OK".to_string(),
            Self::MissingApiKey => "MISSING API KEY".to_string(),
            Self::RateLimited => "RATE LIMITED".to_string(),
            Self::QuotaExceeded => "QUOTA EXCEEDED".to_string(),
            Self::FallbackMode => "FALLBACK MODE".to_string(),
            Self::AllModelsUnavailable => "ALL MODELS UNAVAILABLE".to_string(),
            Self::Error(msg) => {
                let excerpt: String = msg.chars().take(ERROR_EXCERPT_CHARS).collect();
                format!("ERROR: {excerpt}...")
            }
        }
    }
}

impl Serialize for ApiHealth {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}

/// Health plus the model that would answer the next turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub health: ApiHealth,
    pub model: String,
}

/// Assess the completion API.
///
/// Without `live`, only credential presence is checked. With `live`, a
/// minimal completion is requested from the primary model and, when that is
/// rate limited under the fallback policy, from the fallback model.
pub async fn check_health(
    chat: &dyn ChatCompletion,
    settings: &AgentSettings,
    live: bool,
) -> HealthReport {
    if !chat.is_configured() {
        return HealthReport {
            health: ApiHealth::MissingApiKey,
            model: "none".to_string(),
        };
    }
    if !live {
        return HealthReport {
            health: ApiHealth::Ok,
            model: settings.model.clone(),
        };
    }

    let probe = ChatRequest::new(
        settings.model.clone(),
        vec![Message::user("test")],
        PROBE_MAX_TOKENS,
    );

    match chat.complete(&probe).await {
        Ok(_) => HealthReport {
            health: ApiHealth::Ok,
            model: settings.model.clone(),
        },
        Err(LlmError::QuotaExceeded(_)) => HealthReport {
            health: ApiHealth::QuotaExceeded,
            model: format!("{} (quota exceeded)", settings.model),
        },
        Err(LlmError::RateLimited { .. }) => match fallback_for(settings) {
            Some(fallback) => match chat.complete(&probe.with_model(fallback)).await {
                Ok(_) => HealthReport {
                    health: ApiHealth::FallbackMode,
                    model: fallback.to_string(),
                },
                Err(e) => {
                    warn!("Fallback model probe failed: {}", e);
                    HealthReport {
                        health: ApiHealth::AllModelsUnavailable,
                        model: "error".to_string(),
                    }
                }
            },
            None => HealthReport {
                health: ApiHealth::RateLimited,
                model: format!("{} (rate limited)", settings.model),
            },
        },
        Err(e) => {
            warn!("Completion API probe failed: {}", e);
            HealthReport {
                health: ApiHealth::Error(e.to_string()),
                model: "error".to_string(),
            }
        }
    }
}

fn fallback_for(settings: &AgentSettings) -> Option<&str> {
    if settings.rate_limit_policy != RateLimitPolicy::FallbackModel {
        return None;
    }
    settings
        .fallback_model
        .as_deref()
        .filter(|m| *m != settings.model)
}
