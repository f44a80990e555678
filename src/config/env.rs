use std::path::PathBuf;

use super::utils::{env_bool, env_parse, env_string, trim_base_url};
use super::{
    AgentConfig, AuthApiSecret, LlmConfig, ServerConfig, TelephonyConfig, TlsConfig,
    parse_auth_api_secrets_json,
};
use crate::core::agent::RateLimitPolicy;

/// Build a configuration from environment variables over built-in defaults.
pub(crate) fn load_from_env() -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let defaults = ServerConfig::default();

    Ok(ServerConfig {
        host: env_string("HOST").unwrap_or_else(|| defaults.host.clone()),
        port: env_parse("PORT", defaults.port)?,
        tls: load_tls()?,
        llm: load_llm(&defaults.llm)?,
        telephony: load_telephony(&defaults.telephony)?,
        agent: load_agent(&defaults.agent),
        session_secret: env_string("SESSION_SECRET"),
        session_ttl_seconds: env_parse("SESSION_TTL_SECONDS", defaults.session_ttl_seconds)?,
        auth_api_secrets: load_auth_api_secrets()?,
        auth_required: env_bool("AUTH_REQUIRED", defaults.auth_required)?,
        cors_allowed_origins: env_string("CORS_ALLOWED_ORIGINS"),
        rate_limit_requests_per_second: env_parse(
            "RATE_LIMIT_REQUESTS_PER_SECOND",
            defaults.rate_limit_requests_per_second,
        )?,
        rate_limit_burst_size: env_parse("RATE_LIMIT_BURST_SIZE", defaults.rate_limit_burst_size)?,
    })
}

fn load_tls() -> Result<Option<TlsConfig>, Box<dyn std::error::Error>> {
    if !env_bool("TLS_ENABLED", false)? {
        return Ok(None);
    }
    let cert_path = env_string("TLS_CERT_PATH")
        .ok_or("TLS_ENABLED is true but TLS_CERT_PATH is not set")?;
    let key_path =
        env_string("TLS_KEY_PATH").ok_or("TLS_ENABLED is true but TLS_KEY_PATH is not set")?;
    Ok(Some(TlsConfig {
        cert_path: PathBuf::from(cert_path),
        key_path: PathBuf::from(key_path),
    }))
}

fn load_llm(defaults: &LlmConfig) -> Result<LlmConfig, Box<dyn std::error::Error>> {
    let rate_limit_policy = match env_string("LLM_RATE_LIMIT_POLICY") {
        Some(raw) => raw.parse::<RateLimitPolicy>()?,
        None => defaults.rate_limit_policy,
    };

    Ok(LlmConfig {
        openai_api_key: env_string("OPENAI_API_KEY"),
        base_url: env_string("OPENAI_BASE_URL")
            .map(|u| trim_base_url(&u))
            .unwrap_or_else(|| defaults.base_url.clone()),
        model: env_string("LLM_MODEL").unwrap_or_else(|| defaults.model.clone()),
        fallback_model: env_string("LLM_FALLBACK_MODEL").or_else(|| defaults.fallback_model.clone()),
        max_tokens: env_parse("LLM_MAX_TOKENS", defaults.max_tokens)?,
        timeout_seconds: env_parse("LLM_TIMEOUT_SECONDS", defaults.timeout_seconds)?,
        max_retries: env_parse("LLM_MAX_RETRIES", defaults.max_retries)?,
        rate_limit_policy,
        rate_limit_pause_seconds: env_parse(
            "LLM_RATE_LIMIT_PAUSE_SECONDS",
            defaults.rate_limit_pause_seconds,
        )?,
        status_probe: env_bool("LLM_STATUS_PROBE", defaults.status_probe)?,
    })
}

fn load_telephony(
    defaults: &TelephonyConfig,
) -> Result<TelephonyConfig, Box<dyn std::error::Error>> {
    Ok(TelephonyConfig {
        account_sid: env_string("TWILIO_ACCOUNT_SID"),
        auth_token: env_string("TWILIO_AUTH_TOKEN"),
        phone_number: env_string("TWILIO_PHONE_NUMBER"),
        api_base_url: env_string("TWILIO_API_BASE_URL")
            .map(|u| trim_base_url(&u))
            .unwrap_or_else(|| defaults.api_base_url.clone()),
        default_destination: env_string("DEFAULT_DESTINATION_NUMBER")
            .unwrap_or_else(|| defaults.default_destination.clone()),
        public_base_url: env_string("PUBLIC_BASE_URL").map(|u| trim_base_url(&u)),
        timeout_seconds: env_parse("TELEPHONY_TIMEOUT_SECONDS", defaults.timeout_seconds)?,
        validate_signatures: env_bool("TWILIO_VALIDATE_SIGNATURES", defaults.validate_signatures)?,
    })
}

fn load_agent(defaults: &AgentConfig) -> AgentConfig {
    AgentConfig {
        system_prompt: env_string("SYSTEM_PROMPT")
            .unwrap_or_else(|| defaults.system_prompt.clone()),
        voice: env_string("VOICE_NAME").unwrap_or_else(|| defaults.voice.clone()),
        language: env_string("VOICE_LANGUAGE").unwrap_or_else(|| defaults.language.clone()),
        speech_timeout: env_string("SPEECH_TIMEOUT")
            .unwrap_or_else(|| defaults.speech_timeout.clone()),
    }
}

/// `AUTH_API_SECRETS_JSON` wins over the single `AUTH_API_SECRET` form.
fn load_auth_api_secrets() -> Result<Vec<AuthApiSecret>, Box<dyn std::error::Error>> {
    if let Some(json) = env_string("AUTH_API_SECRETS_JSON") {
        return parse_auth_api_secrets_json(&json);
    }
    Ok(env_string("AUTH_API_SECRET")
        .map(|secret| {
            vec![AuthApiSecret {
                id: env_string("AUTH_API_SECRET_ID").unwrap_or_else(|| "default".to_string()),
                secret,
            }]
        })
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::tests::cleanup_env_vars;
    use serial_test::serial;
    use std::env;

    #[test]
    #[serial]
    fn test_load_from_env_reads_every_section() {
        cleanup_env_vars();
        unsafe {
            env::set_var("PORT", "8081");
            env::set_var("OPENAI_API_KEY", "sk-test");
            env::set_var("OPENAI_BASE_URL", "http://localhost:9999/v1/");
            env::set_var("LLM_RATE_LIMIT_POLICY", "fallback-model");
            env::set_var("LLM_STATUS_PROBE", "yes");
            env::set_var("TWILIO_ACCOUNT_SID", "AC42");
            env::set_var("TWILIO_AUTH_TOKEN", "tok");
            env::set_var("TWILIO_VALIDATE_SIGNATURES", "1");
            env::set_var("PUBLIC_BASE_URL", "https://voice.example.com/");
            env::set_var("VOICE_NAME", "Polly.Joanna");
            env::set_var("SESSION_SECRET", "rotated");
            env::set_var("SESSION_TTL_SECONDS", "0");
        }

        let config = load_from_env().unwrap();

        assert_eq!(config.port, 8081);
        assert_eq!(config.llm.openai_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.llm.base_url, "http://localhost:9999/v1");
        assert_eq!(config.llm.rate_limit_policy, RateLimitPolicy::FallbackModel);
        assert!(config.llm.status_probe);
        assert_eq!(config.telephony.account_sid.as_deref(), Some("AC42"));
        assert!(config.telephony.validate_signatures);
        assert_eq!(
            config.telephony.public_base_url.as_deref(),
            Some("https://voice.example.com")
        );
        assert_eq!(config.agent.voice, "Polly.Joanna");
        assert_eq!(config.session_secret.as_deref(), Some("rotated"));
        assert_eq!(config.session_ttl_seconds, 0);

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_invalid_values_are_errors() {
        cleanup_env_vars();
        unsafe {
            env::set_var("LLM_RATE_LIMIT_POLICY", "panic");
        }
        assert!(load_from_env().is_err());

        cleanup_env_vars();
        unsafe {
            env::set_var("PORT", "not-a-port");
        }
        let err = load_from_env().unwrap_err();
        assert!(err.to_string().contains("PORT"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_tls_requires_both_paths() {
        cleanup_env_vars();
        unsafe {
            env::set_var("TLS_ENABLED", "true");
            env::set_var("TLS_CERT_PATH", "/tmp/cert.pem");
        }
        let err = load_from_env().unwrap_err();
        assert!(err.to_string().contains("TLS_KEY_PATH"));

        cleanup_env_vars();
    }

    #[test]
    #[serial]
    fn test_auth_secret_forms() {
        cleanup_env_vars();
        unsafe {
            env::set_var("AUTH_API_SECRET", "single");
        }
        let secrets = load_auth_api_secrets().unwrap();
        assert_eq!(
            secrets,
            vec![AuthApiSecret {
                id: "default".to_string(),
                secret: "single".to_string()
            }]
        );

        unsafe {
            env::set_var("AUTH_API_SECRETS_JSON", r#"[{"id":"ops","secret":"multi"}]"#);
        }
        let secrets = load_auth_api_secrets().unwrap();
        assert_eq!(secrets.len(), 1);
        assert_eq!(secrets[0].id, "ops");

        cleanup_env_vars();
    }
}
