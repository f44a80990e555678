//! Configuration module for the voicebot gateway
//!
//! This module handles server configuration from various sources: .env files, YAML files,
//! and environment variables. Priority: YAML > ENV vars > .env values > defaults.
//!
//! # Modules
//! - `yaml`: YAML configuration file loading
//! - `env`: Environment variable loading
//! - `merge`: Applying YAML overrides on top of the environment
//! - `validation`: Configuration validation logic
//! - `utils`: Utility functions for configuration parsing
//!
//! # Example
//! ```rust,no_run
//! use voicebot_gateway::config::ServerConfig;
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Load from environment variables only
//! let config = ServerConfig::from_env()?;
//!
//! // Load from YAML file with environment variable overrides
//! let config_path = PathBuf::from("config.yaml");
//! let config = ServerConfig::from_file(&config_path)?;
//!
//! println!("Server listening on {}", config.address());
//! # Ok(())
//! # }
//! ```

use std::path::PathBuf;
use std::time::Duration;

use crate::core::agent::{RateLimitPolicy, prompts};
use crate::core::llm::OPENAI_API_BASE_URL;
use crate::core::telephony::TWILIO_API_BASE_URL;

mod env;
mod merge;
mod utils;
mod validation;
mod yaml;

/// Twilio's magic test number; calls to it succeed without ringing anyone.
pub const DEFAULT_DESTINATION_NUMBER: &str = "+15005550006";

/// Placeholder secret shipped in sample configs.
pub const DEFAULT_SESSION_SECRET: &str = "default-secret-key";

/// TLS configuration for HTTPS
#[derive(Debug, Clone)]
pub struct TlsConfig {
    /// Path to the TLS certificate file (PEM format)
    pub cert_path: PathBuf,
    /// Path to the TLS private key file (PEM format)
    pub key_path: PathBuf,
}

/// API secret authentication entry with a client identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthApiSecret {
    pub id: String,
    pub secret: String,
}

/// Chat-completion settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub openai_api_key: Option<String>,
    /// OpenAI-compatible API root, e.g. `https://api.openai.com/v1`
    pub base_url: String,
    pub model: String,
    /// Model used by the `fallback_model` rate-limit policy
    pub fallback_model: Option<String>,
    /// Reply length cap sent with every completion
    pub max_tokens: u32,
    pub timeout_seconds: u64,
    /// Extra attempts for transient failures (network, timeout, 5xx)
    pub max_retries: u32,
    pub rate_limit_policy: RateLimitPolicy,
    pub rate_limit_pause_seconds: u32,
    /// Issue a real completion from `GET /status`
    pub status_probe: bool,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            base_url: OPENAI_API_BASE_URL.to_string(),
            model: "gpt-4o".to_string(),
            fallback_model: Some("gpt-3.5-turbo".to_string()),
            max_tokens: 200,
            timeout_seconds: 6,
            max_retries: 1,
            rate_limit_policy: RateLimitPolicy::default(),
            rate_limit_pause_seconds: 3,
            status_probe: false,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Twilio account and webhook settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelephonyConfig {
    pub account_sid: Option<String>,
    pub auth_token: Option<String>,
    /// Caller ID for outbound calls
    pub phone_number: Option<String>,
    pub api_base_url: String,
    /// Destination used by `/callme` when no number is given
    pub default_destination: String,
    /// Externally reachable origin, e.g. `https://abc.ngrok.app`.
    /// Used for outbound callback URLs and signature validation.
    pub public_base_url: Option<String>,
    pub timeout_seconds: u64,
    /// Require `X-Twilio-Signature` on call-lifecycle webhooks
    pub validate_signatures: bool,
}

impl Default for TelephonyConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            phone_number: None,
            api_base_url: TWILIO_API_BASE_URL.to_string(),
            default_destination: DEFAULT_DESTINATION_NUMBER.to_string(),
            public_base_url: None,
            timeout_seconds: 15,
            validate_signatures: false,
        }
    }
}

impl TelephonyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Conversation voice and prompt settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentConfig {
    pub system_prompt: String,
    pub voice: String,
    pub language: String,
    pub speech_timeout: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            system_prompt: prompts::DEFAULT_SYSTEM_PROMPT.to_string(),
            voice: "alice".to_string(),
            language: "en-US".to_string(),
            speech_timeout: "auto".to_string(),
        }
    }
}

/// Server configuration
///
/// Contains all configuration needed to run the gateway:
/// - Server settings (host, port, TLS)
/// - Chat-completion provider
/// - Telephony provider
/// - Conversation settings
/// - Session housekeeping
/// - Authentication and security settings (CORS, rate limiting)
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // Server settings
    pub host: String,
    pub port: u16,

    // TLS configuration (optional)
    pub tls: Option<TlsConfig>,

    pub llm: LlmConfig,
    pub telephony: TelephonyConfig,
    pub agent: AgentConfig,

    /// Session-cookie secret. No route sets cookies; kept so existing
    /// deployments' environments stay valid.
    pub session_secret: Option<String>,
    /// Idle time after which a call session is dropped (0 disables)
    pub session_ttl_seconds: u64,

    // Authentication configuration
    pub auth_api_secrets: Vec<AuthApiSecret>,
    pub auth_required: bool,

    // Security configuration
    /// CORS allowed origins (comma-separated list or "*" for all)
    /// Default: None (CORS disabled, same-origin only)
    pub cors_allowed_origins: Option<String>,

    // Rate limiting configuration
    /// Maximum requests per second per IP address
    /// Default: 60
    pub rate_limit_requests_per_second: u32,
    /// Maximum burst size for rate limiting
    /// Default: 10
    pub rate_limit_burst_size: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            tls: None,
            llm: LlmConfig::default(),
            telephony: TelephonyConfig::default(),
            agent: AgentConfig::default(),
            session_secret: None,
            session_ttl_seconds: 3600,
            auth_api_secrets: Vec::new(),
            auth_required: false,
            cors_allowed_origins: None,
            rate_limit_requests_per_second: 60,
            rate_limit_burst_size: 10,
        }
    }
}

/// Zeroize all secret fields when the configuration is dropped.
impl Drop for ServerConfig {
    fn drop(&mut self) {
        use zeroize::Zeroize;

        if let Some(ref mut key) = self.llm.openai_api_key {
            key.zeroize();
        }
        if let Some(ref mut token) = self.telephony.auth_token {
            token.zeroize();
        }
        if let Some(ref mut secret) = self.session_secret {
            secret.zeroize();
        }
        for secret in &mut self.auth_api_secrets {
            secret.secret.zeroize();
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables only
    ///
    /// The `.env` file is loaded into the environment by `main` before this runs.
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let config = merge::merge_config(None)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file with environment variable base
    ///
    /// Priority order (highest to lowest):
    /// 1. YAML file values
    /// 2. Environment variables (actual ENV vars override .env values)
    /// 3. .env file values
    /// 4. Default values
    ///
    /// # Errors
    /// Returns an error if:
    /// - The YAML file cannot be read or is malformed
    /// - Environment variables have invalid formats
    /// - Configuration validation fails
    pub fn from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let yaml_config = yaml::YamlConfig::from_file(path)?;
        let config = merge::merge_config(Some(yaml_config))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        validation::validate_tls(&self.tls)?;
        validation::validate_llm(&self.llm)?;
        validation::validate_telephony(&self.telephony)?;
        validation::validate_auth_api_secrets(&self.auth_api_secrets)?;
        validation::validate_auth_required(self.auth_required, &self.auth_api_secrets)?;
        Ok(())
    }

    /// Get the server address as a string
    ///
    /// Returns the address in the format "host:port"
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Check if TLS is enabled
    pub fn is_tls_enabled(&self) -> bool {
        self.tls.is_some()
    }

    /// Check if API secret authentication is configured
    pub fn has_api_secret_auth(&self) -> bool {
        !self.auth_api_secrets.is_empty()
    }

    /// Whether the session secret is missing or still the shipped placeholder.
    pub fn has_default_session_secret(&self) -> bool {
        self.session_secret
            .as_deref()
            .is_none_or(|s| s == DEFAULT_SESSION_SECRET)
    }

    pub fn session_ttl(&self) -> Option<Duration> {
        (self.session_ttl_seconds > 0).then(|| Duration::from_secs(self.session_ttl_seconds))
    }
}

pub(crate) fn parse_auth_api_secrets_json(
    json_str: &str,
) -> Result<Vec<AuthApiSecret>, Box<dyn std::error::Error>> {
    #[derive(serde::Deserialize)]
    struct AuthApiSecretJson {
        id: String,
        secret: String,
    }

    let secrets: Vec<AuthApiSecretJson> = serde_json::from_str(json_str)
        .map_err(|e| format!("Invalid AUTH_API_SECRETS_JSON format: {e}"))?;

    Ok(secrets
        .into_iter()
        .map(|entry| AuthApiSecret {
            id: entry.id,
            secret: entry.secret,
        })
        .collect())
}
