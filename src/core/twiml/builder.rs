use axum::{
    http::header,
    response::{IntoResponse, Response},
};
use std::fmt::Write as _;

use super::TWIML_CONTENT_TYPE;

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// Escape text for use in XML character data and attribute values.
pub fn escape_xml(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(ch),
        }
    }
    out
}

/// `<Say>`: speak text to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Say {
    pub text: String,
    pub voice: Option<String>,
    pub language: Option<String>,
}

impl Say {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice: None,
            language: None,
        }
    }

    pub fn voice(mut self, voice: impl Into<String>) -> Self {
        self.voice = Some(voice.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    fn write_xml(&self, out: &mut String) {
        out.push_str("<Say");
        if let Some(ref voice) = self.voice {
            let _ = write!(out, r#" voice="{}""#, escape_xml(voice));
        }
        if let Some(ref language) = self.language {
            let _ = write!(out, r#" language="{}""#, escape_xml(language));
        }
        if self.text.is_empty() {
            out.push_str("/>");
        } else {
            let _ = write!(out, ">{}</Say>", escape_xml(&self.text));
        }
    }
}

/// `<Gather>`: listen for caller input and post it to `action`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gather {
    pub input: String,
    pub action: String,
    pub method: String,
    pub speech_timeout: Option<String>,
    pub language: Option<String>,
    /// Spoken while listening.
    pub prompts: Vec<Say>,
}

impl Gather {
    /// Speech-only gather posting the recognized text to `action`.
    pub fn speech(action: impl Into<String>) -> Self {
        Self {
            input: "speech".to_string(),
            action: action.into(),
            method: "POST".to_string(),
            speech_timeout: None,
            language: None,
            prompts: Vec::new(),
        }
    }

    pub fn speech_timeout(mut self, timeout: impl Into<String>) -> Self {
        self.speech_timeout = Some(timeout.into());
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn prompt(mut self, say: Say) -> Self {
        self.prompts.push(say);
        self
    }

    fn write_xml(&self, out: &mut String) {
        // Attributes in lexical order, matching Twilio's own helper libraries
        let _ = write!(
            out,
            r#"<Gather action="{}" input="{}""#,
            escape_xml(&self.action),
            escape_xml(&self.input)
        );
        if let Some(ref language) = self.language {
            let _ = write!(out, r#" language="{}""#, escape_xml(language));
        }
        let _ = write!(out, r#" method="{}""#, escape_xml(&self.method));
        if let Some(ref timeout) = self.speech_timeout {
            let _ = write!(out, r#" speechTimeout="{}""#, escape_xml(timeout));
        }
        if self.prompts.is_empty() {
            out.push_str("/>");
        } else {
            out.push('>');
            for say in &self.prompts {
                say.write_xml(out);
            }
            out.push_str("</Gather>");
        }
    }
}

/// A single TwiML verb.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verb {
    Say(Say),
    Gather(Gather),
    Pause { length: u32 },
    Redirect { url: String, method: String },
    Hangup,
}

impl Verb {
    fn write_xml(&self, out: &mut String) {
        match self {
            Verb::Say(say) => say.write_xml(out),
            Verb::Gather(gather) => gather.write_xml(out),
            Verb::Pause { length } => {
                let _ = write!(out, r#"<Pause length="{length}"/>"#);
            }
            Verb::Redirect { url, method } => {
                let _ = write!(
                    out,
                    r#"<Redirect method="{}">{}</Redirect>"#,
                    escape_xml(method),
                    escape_xml(url)
                );
            }
            Verb::Hangup => out.push_str("<Hangup/>"),
        }
    }
}

/// An ordered list of verbs rendered as a `<Response>` document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VoiceResponse {
    verbs: Vec<Verb>,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbs(&self) -> &[Verb] {
        &self.verbs
    }

    pub fn push(mut self, verb: Verb) -> Self {
        self.verbs.push(verb);
        self
    }

    pub fn say(self, text: impl Into<String>, voice: &str) -> Self {
        self.push(Verb::Say(Say::new(text).voice(voice)))
    }

    pub fn gather(self, gather: Gather) -> Self {
        self.push(Verb::Gather(gather))
    }

    pub fn pause(self, length: u32) -> Self {
        self.push(Verb::Pause { length })
    }

    pub fn redirect(self, url: impl Into<String>) -> Self {
        self.push(Verb::Redirect {
            url: url.into(),
            method: "POST".to_string(),
        })
    }

    pub fn hangup(self) -> Self {
        self.push(Verb::Hangup)
    }

    /// Texts of every top-level `<Say>`, in order.
    pub fn spoken(&self) -> Vec<&str> {
        self.verbs
            .iter()
            .filter_map(|verb| match verb {
                Verb::Say(say) => Some(say.text.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn ends_call(&self) -> bool {
        matches!(self.verbs.last(), Some(Verb::Hangup))
    }

    pub fn to_xml(&self) -> String {
        let mut out = String::with_capacity(128 + self.verbs.len() * 64);
        out.push_str(XML_DECLARATION);
        if self.verbs.is_empty() {
            out.push_str("<Response/>");
            return out;
        }
        out.push_str("<Response>");
        for verb in &self.verbs {
            verb.write_xml(&mut out);
        }
        out.push_str("</Response>");
        out
    }
}

impl std::fmt::Display for VoiceResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_xml())
    }
}

impl IntoResponse for VoiceResponse {
    fn into_response(self) -> Response {
        ([(header::CONTENT_TYPE, TWIML_CONTENT_TYPE)], self.to_xml()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_response() {
        assert_eq!(
            VoiceResponse::new().to_xml(),
            r#"<?xml version="1.0" encoding="UTF-8"?><Response/>"#
        );
    }

    #[test]
    fn test_greeting_document() {
        let twiml = VoiceResponse::new()
            .say("Hello!", "alice")
            .gather(
                Gather::speech("/process_speech")
                    .speech_timeout("auto")
                    .language("en-US"),
            )
            .redirect("/voice")
            .to_xml();

        assert_eq!(
            twiml,
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?><Response>"#,
                r#"<Say voice="alice">Hello!</Say>"#,
                r#"<Gather action="/process_speech" input="speech" language="en-US" method="POST" speechTimeout="auto"/>"#,
                r#"<Redirect method="POST">/voice</Redirect>"#,
                "</Response>"
            )
        );
    }

    #[test]
    fn test_text_is_escaped() {
        let twiml = VoiceResponse::new()
            .say(r#"Fish & chips <cheap> "today""#, "alice")
            .to_xml();
        assert!(twiml.contains("Fish &amp; chips &lt;cheap&gt; &quot;today&quot;"));
    }

    #[test]
    fn test_gather_with_prompt() {
        let twiml = VoiceResponse::new()
            .gather(Gather::speech("/next").prompt(Say::new("Go ahead").voice("alice")))
            .to_xml();
        assert!(twiml.contains(
            r#"<Gather action="/next" input="speech" method="POST"><Say voice="alice">Go ahead</Say></Gather>"#
        ));
    }

    #[test]
    fn test_pause_and_hangup() {
        let response = VoiceResponse::new().say("Bye", "alice").pause(3).hangup();
        let twiml = response.to_xml();
        assert!(twiml.contains(r#"<Pause length="3"/><Hangup/>"#));
        assert!(response.ends_call());
        assert_eq!(response.spoken(), vec!["Bye"]);
    }

    #[test]
    fn test_into_response_sets_content_type() {
        let response = VoiceResponse::new().hangup().into_response();
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            TWIML_CONTENT_TYPE
        );
    }
}
