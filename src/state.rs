use std::sync::Arc;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::core::agent::{AgentSettings, VoiceAgent};
use crate::core::llm::{ChatCompletion, OpenAIChat, OpenAIChatConfig};
use crate::core::session::{InMemorySessionStore, SessionStore};
use crate::core::telephony::{TelephonyClient, TwilioClient, TwilioCredentials};

/// Shared application state handed to every handler.
pub struct AppState {
    pub config: ServerConfig,
    pub sessions: Arc<dyn SessionStore>,
    pub telephony: Arc<dyn TelephonyClient>,
    pub agent: VoiceAgent,
}

impl AppState {
    /// Build state with the OpenAI, Twilio and in-memory session backends.
    pub async fn new(config: ServerConfig) -> Arc<Self> {
        let chat = OpenAIChat::new(OpenAIChatConfig {
            api_key: config.llm.openai_api_key.clone(),
            base_url: config.llm.base_url.clone(),
            timeout: config.llm.timeout(),
            max_retries: config.llm.max_retries,
        });
        if !chat.is_configured() {
            warn!("OPENAI_API_KEY is not set; /status will report MISSING API KEY");
        }

        let credentials = match (&config.telephony.account_sid, &config.telephony.auth_token) {
            (Some(account_sid), Some(auth_token)) => Some(TwilioCredentials {
                account_sid: account_sid.clone(),
                auth_token: auth_token.clone(),
            }),
            _ => {
                warn!("Twilio credentials not set; outbound calls are disabled");
                None
            }
        };
        let telephony = TwilioClient::new(
            credentials,
            config.telephony.api_base_url.clone(),
            config.telephony.timeout(),
        );

        info!(
            model = %config.llm.model,
            policy = %config.llm.rate_limit_policy,
            "Voice agent initialized"
        );

        Self::with_components(
            config,
            Arc::new(InMemorySessionStore::new()),
            Arc::new(chat),
            Arc::new(telephony),
        )
    }

    /// Build state around caller-supplied backends.
    pub fn with_components(
        config: ServerConfig,
        sessions: Arc<dyn SessionStore>,
        chat: Arc<dyn ChatCompletion>,
        telephony: Arc<dyn TelephonyClient>,
    ) -> Arc<Self> {
        let agent = VoiceAgent::new(sessions.clone(), chat, AgentSettings::from_config(&config));
        Arc::new(Self {
            config,
            sessions,
            telephony,
            agent,
        })
    }
}
