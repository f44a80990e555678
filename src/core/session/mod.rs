//! Per-call conversation state.
//!
//! A [`CallSession`] holds the transcript exchanged with the chat-completion
//! model for one call leg. Sessions are kept in a [`SessionStore`], keyed by
//! the provider-assigned call identifier.

mod store;

pub use store::{InMemorySessionStore, SessionError, SessionResult, SessionStore};

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Speaker of a transcript message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One role-tagged transcript entry.
///
/// Serializes to the `{"role": ..., "content": ...}` shape expected by
/// OpenAI-compatible chat-completion APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Transcript of a single call.
///
/// The first message is always the system instruction the session was
/// created with; messages are only ever appended.
#[derive(Debug, Clone)]
pub struct CallSession {
    messages: Vec<Message>,
    created_at: Instant,
    last_activity: Instant,
}

impl CallSession {
    pub fn new(system_prompt: &str) -> Self {
        let now = Instant::now();
        Self {
            messages: vec![Message::system(system_prompt)],
            created_at: now,
            last_activity: now,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Time since the session was created.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    /// Time since the session was created or last appended to.
    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    pub(crate) fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.last_activity = Instant::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session_starts_with_system_prompt() {
        let session = CallSession::new("be brief");
        assert_eq!(session.len(), 1);
        assert_eq!(session.messages()[0], Message::system("be brief"));
    }

    #[test]
    fn test_message_serializes_to_chat_shape() {
        let json = serde_json::to_value(Message::assistant("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "assistant", "content": "hi"}));
    }

    #[test]
    fn test_push_refreshes_activity() {
        let mut session = CallSession::new("prompt");
        std::thread::sleep(Duration::from_millis(5));
        let idle_before = session.idle_for();
        session.push(Message::user("hello"));
        assert!(session.idle_for() < idle_before);
        assert_eq!(session.messages()[1].role, Role::User);
    }
}
