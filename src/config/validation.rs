use std::collections::HashSet;
use std::time::Duration;

use url::Url;

use super::{AuthApiSecret, LlmConfig, TelephonyConfig, TlsConfig};
use crate::core::agent::RateLimitPolicy;
use crate::core::llm::openai::worst_case_latency;
use crate::utils::validate_phone_number;

pub(crate) fn validate_tls(tls: &Option<TlsConfig>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(tls) = tls else {
        return Ok(());
    };
    if !tls.cert_path.exists() {
        return Err(format!(
            "TLS certificate file not found: {}",
            tls.cert_path.display()
        )
        .into());
    }
    if !tls.key_path.exists() {
        return Err(format!("TLS key file not found: {}", tls.key_path.display()).into());
    }
    Ok(())
}

/// Twilio abandons a voice webhook that has not answered within 15 s.
pub(crate) const WEBHOOK_RESPONSE_BUDGET: Duration = Duration::from_secs(15);

/// Upper bound on `llm.max_retries`.
pub(crate) const MAX_LLM_RETRIES: u32 = 3;

pub(crate) fn validate_llm(llm: &LlmConfig) -> Result<(), Box<dyn std::error::Error>> {
    if llm.model.trim().is_empty() {
        return Err("LLM model must not be empty".into());
    }
    if llm.max_tokens == 0 {
        return Err("LLM max_tokens must be greater than 0".into());
    }
    if llm.timeout_seconds == 0 {
        return Err("LLM timeout_seconds must be greater than 0".into());
    }
    if llm.max_retries > MAX_LLM_RETRIES {
        return Err(format!(
            "LLM_MAX_RETRIES must be at most {MAX_LLM_RETRIES}, got {}",
            llm.max_retries
        )
        .into());
    }
    let worst_case = worst_case_latency(llm.timeout(), llm.max_retries);
    if worst_case > WEBHOOK_RESPONSE_BUDGET {
        return Err(format!(
            "LLM_TIMEOUT_SECONDS={} with LLM_MAX_RETRIES={} can take {:.2}s, \
             longer than the {}s Twilio waits for a webhook answer",
            llm.timeout_seconds,
            llm.max_retries,
            worst_case.as_secs_f64(),
            WEBHOOK_RESPONSE_BUDGET.as_secs()
        )
        .into());
    }
    validate_http_url("OPENAI_BASE_URL", &llm.base_url)?;
    if llm.rate_limit_policy == RateLimitPolicy::FallbackModel
        && llm
            .fallback_model
            .as_deref()
            .is_none_or(|m| m.trim().is_empty())
    {
        return Err(
            "LLM_RATE_LIMIT_POLICY is fallback_model but no LLM_FALLBACK_MODEL is configured"
                .into(),
        );
    }
    Ok(())
}

pub(crate) fn validate_telephony(
    telephony: &TelephonyConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    validate_phone_number(&telephony.default_destination)
        .map_err(|e| format!("DEFAULT_DESTINATION_NUMBER: {e}"))?;
    if let Some(from) = &telephony.phone_number {
        validate_phone_number(from).map_err(|e| format!("TWILIO_PHONE_NUMBER: {e}"))?;
    }
    validate_http_url("TWILIO_API_BASE_URL", &telephony.api_base_url)?;
    if let Some(public) = &telephony.public_base_url {
        validate_http_url("PUBLIC_BASE_URL", public)?;
    }
    if telephony.validate_signatures && telephony.auth_token.is_none() {
        return Err(
            "TWILIO_VALIDATE_SIGNATURES is enabled but TWILIO_AUTH_TOKEN is not set".into(),
        );
    }
    Ok(())
}

pub(crate) fn validate_auth_api_secrets(
    secrets: &[AuthApiSecret],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut seen = HashSet::new();
    for entry in secrets {
        if entry.id.trim().is_empty() {
            return Err("Auth API secret id must not be empty".into());
        }
        if entry.secret.trim().is_empty() {
            return Err(format!("Auth API secret '{}' has an empty secret", entry.id).into());
        }
        if !seen.insert(entry.id.as_str()) {
            return Err(format!("Duplicate auth API secret id '{}'", entry.id).into());
        }
    }
    Ok(())
}

pub(crate) fn validate_auth_required(
    auth_required: bool,
    secrets: &[AuthApiSecret],
) -> Result<(), Box<dyn std::error::Error>> {
    if auth_required && secrets.is_empty() {
        return Err(
            "AUTH_REQUIRED is true but no API secrets are configured \
             (set AUTH_API_SECRET or AUTH_API_SECRETS_JSON)"
                .into(),
        );
    }
    Ok(())
}

fn validate_http_url(name: &str, value: &str) -> Result<(), Box<dyn std::error::Error>> {
    let url = Url::parse(value).map_err(|e| format!("Invalid {name} '{value}': {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("Invalid {name} '{value}': unsupported scheme '{other}'").into()),
    }
}
