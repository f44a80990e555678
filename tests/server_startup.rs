//! Server Startup Tests
//!
//! State built from configuration alone, with the real OpenAI and Twilio
//! clients, plus the smoke-test runner against a live listener.

mod common;

use std::net::SocketAddr;

use axum::{body::Body, http::Request};
use serde_json::json;
use tokio::net::TcpListener;
use tower::util::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use voicebot_gateway::{
    AppState, ServerConfig, SessionStore, routes,
    smoke::{self, SmokeTestOptions},
};

use common::{StubChat, StubTelephony, body_string, build_app, test_config};

/// Configuration with no provider credentials at all.
fn keyless_config() -> ServerConfig {
    let mut config = test_config();
    config.llm.openai_api_key = None;
    config.telephony.account_sid = None;
    config.telephony.auth_token = None;
    config.telephony.phone_number = None;
    config
}

async fn get(app: &axum::Router, uri: &str) -> (u16, String) {
    let request = Request::builder()
        .uri(uri)
        .header("host", "voice.test")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status().as_u16();
    (status, body_string(response).await)
}

/// The service boots without any API keys and says so on /status.
#[tokio::test]
async fn test_minimal_config_boot() {
    let state = AppState::new(keyless_config()).await;
    let app = routes::create_app_router(state);

    let (status, html) = get(&app, "/").await;
    assert_eq!(status, 200);
    assert!(html.contains("Voicebot Gateway"));

    let (status, body) = get(&app, "/status").await;
    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "running");
    assert_eq!(json["openai_api"], "MISSING API KEY");
    assert_eq!(json["model"], "none");
    assert_eq!(json["active_calls"], 0);
}

/// Without Twilio credentials the call attempt fails cleanly.
#[tokio::test]
async fn test_callme_without_credentials() {
    let state = AppState::new(keyless_config()).await;
    let app = routes::create_app_router(state);

    let (status, body) = get(&app, "/callme").await;

    assert_eq!(status, 500);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "error");
    assert!(
        json["message"]
            .as_str()
            .unwrap()
            .starts_with("Failed to make call: Telephony not configured")
    );
}

/// A speech turn flows through the real OpenAI client to a mock API.
#[tokio::test]
async fn test_speech_turn_against_mock_openai() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "We open at nine." },
                "finish_reason": "stop"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = test_config();
    config.llm.base_url = format!("{}/v1", server.uri());
    let state = AppState::new(config).await;
    let app = routes::create_app_router(state.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/process_speech")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from("CallSid=CA42&SpeechResult=When+do+you+open%3F"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), 200);
    let twiml = body_string(response).await;

    assert!(twiml.contains(r#"<Say voice="alice">We open at nine.</Say>"#));
    let session = state.sessions.get("CA42").await.unwrap().unwrap();
    assert_eq!(session.len(), 3);
}

/// Rate limiting settings survive into state; the layer itself is built in main.
#[tokio::test]
async fn test_rate_limit_configurations() {
    let mut config = keyless_config();
    config.rate_limit_requests_per_second = 100;
    config.rate_limit_burst_size = 50;
    let app_state = AppState::new(config).await;
    assert_eq!(app_state.config.rate_limit_requests_per_second, 100);
    assert_eq!(app_state.config.rate_limit_burst_size, 50);

    let mut config = keyless_config();
    config.rate_limit_requests_per_second = 100000;
    let app_state = AppState::new(config).await;
    assert!(app_state.config.rate_limit_requests_per_second >= 100000);
}

/// The smoke-test runner drives a live server end to end and cleans up.
#[tokio::test]
async fn test_smoke_run_against_live_server() {
    let chat = StubChat::with_replies(vec![Ok("Happy to help.".to_string())]);
    let app = build_app(test_config(), chat.clone(), StubTelephony::succeeding("CA0"));
    let sessions = app.sessions.clone();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    let router = app.router.clone();
    let server = tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    smoke::run(SmokeTestOptions {
        base_url: format!("http://{addr}"),
        speech: Some("What can you do?".to_string()),
        ..Default::default()
    })
    .await
    .unwrap();

    assert_eq!(chat.requests().len(), 1);
    assert_eq!(sessions.len().await.unwrap(), 0);

    server.abort();
}

/// Smoke test reports an unreachable service as an error.
#[tokio::test]
async fn test_smoke_run_unreachable() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = smoke::run(SmokeTestOptions {
        base_url: format!("http://{addr}"),
        speech: None,
        timeout: std::time::Duration::from_secs(2),
    })
    .await;

    assert!(result.is_err());
}
