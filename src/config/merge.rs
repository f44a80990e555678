use std::path::PathBuf;

use super::utils::trim_base_url;
use super::yaml::YamlConfig;
use super::{AuthApiSecret, ServerConfig, TlsConfig, env};

/// Start from the environment and apply YAML overrides on top.
pub(crate) fn merge_config(
    yaml: Option<YamlConfig>,
) -> Result<ServerConfig, Box<dyn std::error::Error>> {
    let mut config = env::load_from_env()?;
    let Some(yaml) = yaml else {
        return Ok(config);
    };

    if let Some(server) = yaml.server {
        if let Some(host) = server.host {
            config.host = host;
        }
        if let Some(port) = server.port {
            config.port = port;
        }
        if let Some(tls) = server.tls {
            match tls.enabled {
                Some(false) => config.tls = None,
                Some(true) => {
                    let cert_path = tls
                        .cert_path
                        .ok_or("TLS enabled in YAML but server.tls.cert_path is missing")?;
                    let key_path = tls
                        .key_path
                        .ok_or("TLS enabled in YAML but server.tls.key_path is missing")?;
                    config.tls = Some(TlsConfig {
                        cert_path: PathBuf::from(cert_path),
                        key_path: PathBuf::from(key_path),
                    });
                }
                None => {}
            }
        }
    }

    if let Some(llm) = yaml.llm {
        let target = &mut config.llm;
        if llm.openai_api_key.is_some() {
            target.openai_api_key = llm.openai_api_key;
        }
        if let Some(url) = llm.base_url {
            target.base_url = trim_base_url(&url);
        }
        if let Some(model) = llm.model {
            target.model = model;
        }
        if llm.fallback_model.is_some() {
            target.fallback_model = llm.fallback_model;
        }
        if let Some(v) = llm.max_tokens {
            target.max_tokens = v;
        }
        if let Some(v) = llm.timeout_seconds {
            target.timeout_seconds = v;
        }
        if let Some(v) = llm.max_retries {
            target.max_retries = v;
        }
        if let Some(v) = llm.rate_limit_policy {
            target.rate_limit_policy = v;
        }
        if let Some(v) = llm.rate_limit_pause_seconds {
            target.rate_limit_pause_seconds = v;
        }
        if let Some(v) = llm.status_probe {
            target.status_probe = v;
        }
    }

    if let Some(telephony) = yaml.telephony {
        let target = &mut config.telephony;
        if telephony.account_sid.is_some() {
            target.account_sid = telephony.account_sid;
        }
        if telephony.auth_token.is_some() {
            target.auth_token = telephony.auth_token;
        }
        if telephony.phone_number.is_some() {
            target.phone_number = telephony.phone_number;
        }
        if let Some(url) = telephony.api_base_url {
            target.api_base_url = trim_base_url(&url);
        }
        if let Some(number) = telephony.default_destination {
            target.default_destination = number;
        }
        if let Some(url) = telephony.public_base_url {
            target.public_base_url = Some(trim_base_url(&url));
        }
        if let Some(v) = telephony.timeout_seconds {
            target.timeout_seconds = v;
        }
        if let Some(v) = telephony.validate_signatures {
            target.validate_signatures = v;
        }
    }

    if let Some(agent) = yaml.agent {
        let target = &mut config.agent;
        if let Some(v) = agent.system_prompt {
            target.system_prompt = v;
        }
        if let Some(v) = agent.voice {
            target.voice = v;
        }
        if let Some(v) = agent.language {
            target.language = v;
        }
        if let Some(v) = agent.speech_timeout {
            target.speech_timeout = v;
        }
    }

    if let Some(session) = yaml.session {
        if session.secret.is_some() {
            config.session_secret = session.secret;
        }
        if let Some(ttl) = session.ttl_seconds {
            config.session_ttl_seconds = ttl;
        }
    }

    if let Some(auth) = yaml.auth {
        if let Some(required) = auth.required {
            config.auth_required = required;
        }
        if !auth.api_secrets.is_empty() {
            config.auth_api_secrets = auth
                .api_secrets
                .into_iter()
                .map(|entry| AuthApiSecret {
                    id: entry.id,
                    secret: entry.secret,
                })
                .collect();
        } else if let Some(secret) = auth.api_secret {
            config.auth_api_secrets = vec![AuthApiSecret {
                id: "default".to_string(),
                secret,
            }];
        }
    }

    if let Some(security) = yaml.security {
        if security.cors_allowed_origins.is_some() {
            config.cors_allowed_origins = security.cors_allowed_origins;
        }
        if let Some(v) = security.rate_limit_requests_per_second {
            config.rate_limit_requests_per_second = v;
        }
        if let Some(v) = security.rate_limit_burst_size {
            config.rate_limit_burst_size = v;
        }
    }

    Ok(config)
}
