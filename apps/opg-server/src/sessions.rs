use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct TurnRecord {
    pub role: Role,
    pub content: String,
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: DateTime<Utc>,
}

impl TurnRecord {
    fn new(role: Role, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Append-only turn log for one session id.
#[derive(Debug)]
pub struct Session {
    created_at: DateTime<Utc>,
    turns: Vec<TurnRecord>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            created_at: Utc::now(),
            turns: Vec::new(),
        }
    }
}

#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct SessionSnapshot {
    pub session_id: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTime<Utc>,
    pub history_length: usize,
    pub turns: Vec<TurnRecord>,
}

/// Process-wide chat history keyed by session id.
///
/// The outer map is only write-locked to insert a new session; appends lock the
/// single session they touch, so distinct sessions never contend and two writers
/// on the same id are serialized.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<Session>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn session(&self, session_id: &str) -> Arc<Mutex<Session>> {
        if let Some(existing) = self.sessions.read().await.get(session_id) {
            return existing.clone();
        }
        let mut guard = self.sessions.write().await;
        guard.entry(session_id.to_string()).or_default().clone()
    }

    /// Append a turn, creating the session on first use. Returns the new turn count.
    pub async fn append(&self, session_id: &str, role: Role, content: &str) -> usize {
        let session = self.session(session_id).await;
        let mut guard = session.lock().await;
        guard.turns.push(TurnRecord::new(role, content));
        guard.turns.len()
    }

    pub async fn turn_count(&self, session_id: &str) -> usize {
        let session = match self.sessions.read().await.get(session_id) {
            Some(s) => s.clone(),
            None => return 0,
        };
        let guard = session.lock().await;
        guard.turns.len()
    }

    pub async fn snapshot(&self, session_id: &str) -> Option<SessionSnapshot> {
        let session = self.sessions.read().await.get(session_id).cloned()?;
        let guard = session.lock().await;
        Some(SessionSnapshot {
            session_id: session_id.to_string(),
            created_at: guard.created_at,
            history_length: guard.turns.len(),
            turns: guard.turns.clone(),
        })
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_session_is_empty_until_first_append() {
        let store = SessionStore::new();
        assert_eq!(store.turn_count("fresh").await, 0);
        assert!(store.snapshot("fresh").await.is_none());
        assert_eq!(store.session_count().await, 0);

        assert_eq!(store.append("fresh", Role::User, "hi").await, 1);
        assert_eq!(store.turn_count("fresh").await, 1);
        assert_eq!(store.session_count().await, 1);
    }

    #[tokio::test]
    async fn turns_keep_insertion_order_and_timestamps() {
        let store = SessionStore::new();
        store.append("s", Role::User, "one").await;
        store.append("s", Role::Assistant, "two").await;
        store.append("s", Role::User, "three").await;

        let snap = store.snapshot("s").await.expect("snapshot");
        assert_eq!(snap.history_length, 3);
        let contents: Vec<_> = snap.turns.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, ["one", "two", "three"]);
        let roles: Vec<_> = snap.turns.iter().map(|t| t.role).collect();
        assert_eq!(roles, [Role::User, Role::Assistant, Role::User]);
        assert!(snap.turns.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        assert!(snap.created_at <= snap.turns[0].timestamp);
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = SessionStore::new();
        store.append("a", Role::User, "x").await;
        store.append("b", Role::User, "y").await;
        store.append("b", Role::Assistant, "z").await;
        assert_eq!(store.turn_count("a").await, 1);
        assert_eq!(store.turn_count("b").await, 2);
        assert_eq!(store.session_count().await, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_appends_to_one_session_are_not_lost() {
        let store = Arc::new(SessionStore::new());
        let mut handles = Vec::new();
        for writer in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                for i in 0..25 {
                    store
                        .append("shared", Role::User, &format!("{writer}-{i}"))
                        .await;
                }
            }));
        }
        for handle in handles {
            handle.await.expect("writer task");
        }
        assert_eq!(store.turn_count("shared").await, 200);
        assert_eq!(store.session_count().await, 1);
    }

    #[test]
    fn turn_record_serializes_lowercase_role_and_rfc3339() {
        let record = TurnRecord::new(Role::Assistant, "hello");
        let value = serde_json::to_value(&record).expect("serialize");
        assert_eq!(value["role"], "assistant");
        assert_eq!(value["content"], "hello");
        let ts = value["timestamp"].as_str().expect("timestamp string");
        assert!(DateTime::parse_from_rfc3339(ts).is_ok());
    }
}
