use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::time::Duration;
use thiserror::Error;

use super::{CallSession, Message};

/// Errors returned by session store backends.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    /// No session exists for the call identifier
    #[error("No session for call: {0}")]
    NotFound(String),
    /// The storage backend failed
    #[error("Session backend error: {0}")]
    Backend(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Storage for call transcripts.
///
/// Every operation on a single call identifier is atomic. Handlers only see
/// this trait, so the in-memory map can be replaced by an external
/// key-value store without touching them.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Snapshot of the session for `call_sid`, if any.
    async fn get(&self, call_sid: &str) -> SessionResult<Option<CallSession>>;

    /// Create a session seeded with `system_prompt`.
    ///
    /// Returns `false` and leaves the existing transcript untouched when the
    /// call already has a session.
    async fn create(&self, call_sid: &str, system_prompt: &str) -> SessionResult<bool>;

    /// Append `message` and return the transcript as it stands afterwards.
    async fn append(&self, call_sid: &str, message: Message) -> SessionResult<Vec<Message>>;

    /// Remove the session. Returns `false` if there was none.
    async fn delete(&self, call_sid: &str) -> SessionResult<bool>;

    /// Number of live sessions.
    async fn len(&self) -> SessionResult<usize>;

    /// Drop sessions untouched for longer than `max_idle`. Returns how many were removed.
    async fn evict_idle(&self, max_idle: Duration) -> SessionResult<usize>;
}

/// Process-local store backed by a sharded concurrent map.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<String, CallSession>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, call_sid: &str) -> bool {
        self.sessions.contains_key(call_sid)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, call_sid: &str) -> SessionResult<Option<CallSession>> {
        Ok(self.sessions.get(call_sid).map(|s| s.value().clone()))
    }

    async fn create(&self, call_sid: &str, system_prompt: &str) -> SessionResult<bool> {
        match self.sessions.entry(call_sid.to_string()) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(CallSession::new(system_prompt));
                Ok(true)
            }
        }
    }

    async fn append(&self, call_sid: &str, message: Message) -> SessionResult<Vec<Message>> {
        let mut session = self
            .sessions
            .get_mut(call_sid)
            .ok_or_else(|| SessionError::NotFound(call_sid.to_string()))?;
        session.push(message);
        Ok(session.messages().to_vec())
    }

    async fn delete(&self, call_sid: &str) -> SessionResult<bool> {
        Ok(self.sessions.remove(call_sid).is_some())
    }

    async fn len(&self) -> SessionResult<usize> {
        Ok(self.sessions.len())
    }

    async fn evict_idle(&self, max_idle: Duration) -> SessionResult<usize> {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.idle_for() <= max_idle);
        Ok(before.saturating_sub(self.sessions.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::Role;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_is_idempotent() {
        let store = InMemorySessionStore::new();
        assert!(store.create("CA1", "system").await.unwrap());
        store.append("CA1", Message::user("hi")).await.unwrap();

        assert!(!store.create("CA1", "other").await.unwrap());
        let session = store.get("CA1").await.unwrap().unwrap();
        assert_eq!(session.len(), 2);
        assert_eq!(session.messages()[0].content, "system");
    }

    #[tokio::test]
    async fn test_append_to_missing_session_fails() {
        let store = InMemorySessionStore::new();
        let err = store.append("CA404", Message::user("hi")).await.unwrap_err();
        assert_eq!(err, SessionError::NotFound("CA404".to_string()));
    }

    #[tokio::test]
    async fn test_append_returns_full_transcript() {
        let store = InMemorySessionStore::new();
        store.create("CA1", "system").await.unwrap();
        let transcript = store.append("CA1", Message::user("hello")).await.unwrap();

        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript[0].role, Role::System);
        assert_eq!(transcript[1], Message::user("hello"));
    }

    #[tokio::test]
    async fn test_delete_twice() {
        let store = InMemorySessionStore::new();
        store.create("CA1", "system").await.unwrap();

        assert!(store.delete("CA1").await.unwrap());
        assert!(!store.delete("CA1").await.unwrap());
        assert_eq!(store.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_evict_idle() {
        let store = InMemorySessionStore::new();
        store.create("CA1", "system").await.unwrap();
        store.create("CA2", "system").await.unwrap();

        assert_eq!(store.evict_idle(Duration::from_secs(60)).await.unwrap(), 0);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.evict_idle(Duration::from_millis(1)).await.unwrap(), 2);
        assert!(!store.contains("CA1"));
    }

    #[tokio::test]
    async fn test_concurrent_appends_keep_every_message() {
        let store = Arc::new(InMemorySessionStore::new());
        store.create("CA1", "system").await.unwrap();

        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .append("CA1", Message::user(format!("turn {i}")))
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let session = store.get("CA1").await.unwrap().unwrap();
        assert_eq!(session.len(), 33);
        assert_eq!(session.messages()[0].role, Role::System);
    }
}
