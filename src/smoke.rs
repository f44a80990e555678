//! Synthetic traffic against a running gateway.
//!
//! Powers the `voicebot-gateway smoke-test` CLI command:
//!
//! ```text
//! $ voicebot-gateway smoke-test --base-url http://localhost:5000 --speech "What services do you offer?"
//! ```
//!
//! The run checks `/status`, starts a fake call, optionally sends one speech
//! turn, and always tries to end the call so no session is left behind.

use anyhow::{Context, Result, bail};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::core::agent::{END_CALL_PATH, PROCESS_SPEECH_PATH, VOICE_PATH};

static SAY_TEXT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<Say[^>]*>([^<]*)</Say>").unwrap_or_else(|e| panic!("invalid Say pattern: {e}"))
});

/// Options for one smoke-test run.
#[derive(Debug, Clone)]
pub struct SmokeTestOptions {
    pub base_url: String,
    /// Utterance to send as a speech turn; skipped when `None`
    pub speech: Option<String>,
    pub timeout: Duration,
}

impl Default for SmokeTestOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            speech: None,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Spoken texts in a TwiML document, in order, with entities decoded.
pub fn spoken_texts(twiml: &str) -> Vec<String> {
    SAY_TEXT
        .captures_iter(twiml)
        .map(|caps| unescape_xml(&caps[1]))
        .collect()
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Generate a call identifier that cannot collide with real Twilio SIDs.
pub fn test_call_sid() -> String {
    format!("TEST_CALL_{}", uuid::Uuid::new_v4().simple())
}

/// Run the smoke test, printing what the service answered.
pub async fn run(options: SmokeTestOptions) -> Result<()> {
    let base = options.base_url.trim_end_matches('/').to_string();
    let client = Client::builder()
        .timeout(options.timeout)
        .build()
        .context("Failed to build HTTP client")?;

    println!("Checking {base}/status");
    let status: Value = client
        .get(format!("{base}/status"))
        .send()
        .await
        .with_context(|| format!("Service not reachable at {base}"))?
        .error_for_status()?
        .json()
        .await
        .context("Status response was not JSON")?;
    println!(
        "  completion API: {}",
        status["openai_api"].as_str().unwrap_or("unknown")
    );
    println!("  model: {}", status["model"].as_str().unwrap_or("unknown"));
    println!("  active calls: {}", status["active_calls"]);

    let call_sid = test_call_sid();
    println!("\nSimulating incoming call {call_sid}");
    let outcome = converse(&client, &base, &call_sid, options.speech.as_deref()).await;

    println!("\nEnding call {call_sid}");
    let cleanup = post_form(&client, &base, END_CALL_PATH, &[("CallSid", call_sid.as_str())]).await;

    outcome?;
    cleanup?;
    println!("\nSmoke test passed");
    Ok(())
}

async fn converse(client: &Client, base: &str, call_sid: &str, speech: Option<&str>) -> Result<()> {
    let twiml = post_form(
        client,
        base,
        VOICE_PATH,
        &[
            ("CallSid", call_sid),
            ("From", "+15005550006"),
            ("To", "+15005550001"),
        ],
    )
    .await?;
    println!("TwiML response:\n{twiml}");
    match spoken_texts(&twiml).first() {
        Some(greeting) => println!("\nGreeting: {greeting}"),
        None => bail!("Call-start response contained no <Say> greeting"),
    }

    if let Some(utterance) = speech {
        println!("\nCaller: {utterance}");
        let twiml = post_form(
            client,
            base,
            PROCESS_SPEECH_PATH,
            &[("CallSid", call_sid), ("SpeechResult", utterance)],
        )
        .await?;
        for text in spoken_texts(&twiml) {
            println!("Agent: {text}");
        }
    }
    Ok(())
}

async fn post_form(client: &Client, base: &str, path: &str, form: &[(&str, &str)]) -> Result<String> {
    let response = client
        .post(format!("{base}{path}"))
        .form(form)
        .send()
        .await
        .with_context(|| format!("POST {path} failed"))?;
    let status = response.status();
    let body = response.text().await?;
    if !status.is_success() {
        bail!("POST {path} returned {status}: {body}");
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spoken_texts() {
        let twiml = r#"<?xml version="1.0" encoding="UTF-8"?><Response><Say voice="alice">Hello &amp; welcome</Say><Gather action="/process_speech" input="speech"><Say>Nested</Say></Gather><Say/></Response>"#;
        assert_eq!(spoken_texts(twiml), vec!["Hello & welcome", "Nested"]);
        assert!(spoken_texts("<Response/>").is_empty());
    }

    #[test]
    fn test_call_sid_shape() {
        let sid = test_call_sid();
        assert!(sid.starts_with("TEST_CALL_"));
        assert_ne!(sid, test_call_sid());
    }
}
