//! OpenAI chat client against a wiremock server.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use voicebot_gateway::core::session::Message;
use voicebot_gateway::{ChatCompletion, ChatRequest, LlmError, OpenAIChat, OpenAIChatConfig};

fn client(server: &MockServer, max_retries: u32) -> OpenAIChat {
    OpenAIChat::new(OpenAIChatConfig {
        api_key: Some("sk-test".to_string()),
        base_url: format!("{}/v1", server.uri()),
        timeout: Duration::from_secs(5),
        max_retries,
    })
}

fn request() -> ChatRequest {
    ChatRequest::new(
        "gpt-4o",
        vec![
            Message::system("You are a helpful phone assistant."),
            Message::user("What are your hours?"),
        ],
        200,
    )
}

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "model": "gpt-4o",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}

fn error_body(message: &str, kind: &str, code: &str) -> serde_json::Value {
    json!({ "error": { "message": message, "type": kind, "code": code } })
}

#[tokio::test]
async fn test_completion_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o",
            "max_tokens": 200,
            "messages": [
                { "role": "system", "content": "You are a helpful phone assistant." },
                { "role": "user", "content": "What are your hours?" }
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Nine to five.")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client(&server, 1).complete(&request()).await.unwrap();
    assert_eq!(reply, "Nine to five.");
}

#[tokio::test]
async fn test_insufficient_quota_is_quota_exceeded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(error_body(
            "You exceeded your current quota, please check your plan and billing details.",
            "insufficient_quota",
            "insufficient_quota",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, 3).complete(&request()).await.unwrap_err();
    assert!(matches!(err, LlmError::QuotaExceeded(_)), "got {err:?}");
}

#[tokio::test]
async fn test_rate_limit_carries_retry_after() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "2")
                .set_body_json(error_body(
                    "Rate limit reached for gpt-4o",
                    "requests",
                    "rate_limit_exceeded",
                )),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, 3).complete(&request()).await.unwrap_err();
    assert_eq!(
        err,
        LlmError::RateLimited {
            message: "Rate limit reached for gpt-4o".to_string(),
            retry_after_ms: Some(2000),
        }
    );
}

#[tokio::test]
async fn test_server_error_is_retried_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream busy"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("Recovered.")))
        .expect(1)
        .mount(&server)
        .await;

    let reply = client(&server, 1).complete(&request()).await.unwrap();
    assert_eq!(reply, "Recovered.");
}

#[tokio::test]
async fn test_server_error_without_retries() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, 0).complete(&request()).await.unwrap_err();
    assert!(matches!(err, LlmError::ServerError { status: 500, .. }));
}

#[tokio::test]
async fn test_invalid_key_is_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_json(error_body(
            "Incorrect API key provided",
            "invalid_request_error",
            "invalid_api_key",
        )))
        .expect(1)
        .mount(&server)
        .await;

    let err = client(&server, 2).complete(&request()).await.unwrap_err();
    assert_eq!(
        err,
        LlmError::AuthenticationFailed("Incorrect API key provided".to_string())
    );
}

#[tokio::test]
async fn test_empty_choices_is_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "choices": [] })))
        .mount(&server)
        .await;

    let err = client(&server, 0).complete(&request()).await.unwrap_err();
    assert!(matches!(err, LlmError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_missing_key_never_sends() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("unused")))
        .expect(0)
        .mount(&server)
        .await;

    let chat = OpenAIChat::new(OpenAIChatConfig {
        api_key: None,
        base_url: format!("{}/v1", server.uri()),
        ..Default::default()
    });

    assert!(!chat.is_configured());
    assert_eq!(
        chat.complete(&request()).await.unwrap_err(),
        LlmError::MissingApiKey
    );
}
