//! Shared fixtures for integration tests: stub backends and a router builder.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Request, Response},
};
use tower::util::ServiceExt;

use voicebot_gateway::{
    AppState, ChatCompletion, ChatRequest, InMemorySessionStore, LlmError, LlmResult,
    OutboundCallRequest, PlacedCall, ServerConfig, TelephonyClient, TelephonyError,
    config::{AgentConfig, LlmConfig, TelephonyConfig},
    core::telephony::TelephonyResult,
    routes,
};

/// Test configuration with every field spelled out.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        tls: None,
        llm: LlmConfig {
            openai_api_key: Some("sk-test".to_string()),
            ..Default::default()
        },
        telephony: TelephonyConfig {
            account_sid: Some("AC00000000000000000000000000000000".to_string()),
            auth_token: Some("twilio-test-token".to_string()),
            phone_number: Some("+15005550001".to_string()),
            ..Default::default()
        },
        agent: AgentConfig::default(),
        session_secret: Some("test-secret".to_string()),
        session_ttl_seconds: 3600,
        auth_api_secrets: Vec::new(),
        auth_required: false,
        cors_allowed_origins: None,
        rate_limit_requests_per_second: 100000,
        rate_limit_burst_size: 10,
    }
}

/// Chat backend answering from a script and recording every request.
pub struct StubChat {
    replies: Mutex<VecDeque<LlmResult<String>>>,
    requests: Mutex<Vec<ChatRequest>>,
    configured: bool,
}

impl StubChat {
    pub fn with_replies(replies: Vec<LlmResult<String>>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
            configured: true,
        })
    }

    pub fn unconfigured() -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            configured: false,
        })
    }

    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatCompletion for StubChat {
    async fn complete(&self, request: &ChatRequest) -> LlmResult<String> {
        self.requests.lock().unwrap().push(request.clone());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::ProviderError("no scripted reply".to_string())))
    }

    fn is_configured(&self) -> bool {
        self.configured
    }

    fn provider_name(&self) -> &'static str {
        "stub"
    }
}

/// Telephony backend that records calls and returns a fixed outcome.
pub struct StubTelephony {
    outcome: TelephonyResult<PlacedCall>,
    calls: Mutex<Vec<OutboundCallRequest>>,
}

impl StubTelephony {
    pub fn succeeding(call_sid: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(PlacedCall {
                call_sid: call_sid.to_string(),
                status: Some("queued".to_string()),
            }),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(error: TelephonyError) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(error),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<OutboundCallRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TelephonyClient for StubTelephony {
    async fn place_call(&self, request: &OutboundCallRequest) -> TelephonyResult<PlacedCall> {
        self.calls.lock().unwrap().push(request.clone());
        self.outcome.clone()
    }

    fn is_configured(&self) -> bool {
        true
    }
}

pub struct TestApp {
    pub state: Arc<AppState>,
    pub router: Router,
    pub sessions: Arc<InMemorySessionStore>,
}

pub fn build_app(
    config: ServerConfig,
    chat: Arc<StubChat>,
    telephony: Arc<StubTelephony>,
) -> TestApp {
    let sessions = Arc::new(InMemorySessionStore::new());
    let state = AppState::with_components(config, sessions.clone(), chat, telephony);
    let router = routes::create_app_router(state.clone());
    TestApp {
        state,
        router,
        sessions,
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn post_form(&self, path: &str, form: &[(&str, &str)]) -> (u16, String) {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form)
            .finish();
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/x-www-form-urlencoded")
            .header("host", "voice.test")
            .body(Body::from(body))
            .unwrap();
        let response = self.send(request).await;
        let status = response.status().as_u16();
        (status, body_string(response).await)
    }

    pub async fn get(&self, uri: &str) -> (u16, String) {
        let request = Request::builder()
            .uri(uri)
            .header("host", "voice.test")
            .body(Body::empty())
            .unwrap();
        let response = self.send(request).await;
        let status = response.status().as_u16();
        (status, body_string(response).await)
    }
}

pub async fn body_string(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
