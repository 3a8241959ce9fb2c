//! `SessionStore` backends (§6 "Persisted state layout"): `InMemorySessionStore`
//! for local dev/tests and `RedisSessionStore` for the real deployment.
//!
//! Both serialize `SessionRecord`/`ConversationState` as single JSON blobs
//! per key rather than native Redis hashes — see DESIGN.md's "KV layout
//! simplification" note.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use redis::AsyncCommands;

use voice_agent_core::conversation::ConversationState;
use voice_agent_core::error::ServerError;
use voice_agent_core::session::{SessionId, SessionState};
use voice_agent_core::traits::SessionRecord;
use voice_agent_core::{Error, Result, SessionStore};

const ACTIVE_SESSIONS_KEY: &str = "sessions:active";

fn session_key(id: SessionId) -> String {
    format!("session:{id}")
}

fn conversation_key(id: SessionId) -> String {
    format!("conversation:{id}")
}

/// Default backend: sessions live only as long as the process does.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<SessionId, SessionRecord>>,
    conversations: RwLock<HashMap<SessionId, ConversationState>>,
    active: RwLock<std::collections::HashSet<SessionId>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put_session(&self, id: SessionId, record: &SessionRecord, _ttl: Duration) -> Result<()> {
        self.sessions.write().insert(id, record.clone());
        Ok(())
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<SessionRecord>> {
        Ok(self.sessions.read().get(&id).cloned())
    }

    async fn delete_session(&self, id: SessionId) -> Result<()> {
        self.sessions.write().remove(&id);
        self.conversations.write().remove(&id);
        self.active.write().remove(&id);
        Ok(())
    }

    async fn mark_active(&self, id: SessionId) -> Result<()> {
        self.active.write().insert(id);
        Ok(())
    }

    async fn mark_inactive(&self, id: SessionId) -> Result<()> {
        self.active.write().remove(&id);
        Ok(())
    }

    async fn active_sessions(&self) -> Result<Vec<SessionId>> {
        Ok(self.active.read().iter().copied().collect())
    }

    async fn put_conversation(
        &self,
        id: SessionId,
        state: &ConversationState,
        _ttl: Duration,
    ) -> Result<()> {
        self.conversations.write().insert(id, state.clone());
        Ok(())
    }

    async fn get_conversation(&self, id: SessionId) -> Result<Option<ConversationState>> {
        Ok(self.conversations.read().get(&id).cloned())
    }
}

/// Production backend: `session:{id}` / `conversation:{id}` string keys plus
/// a `sessions:active` set, per §6. Every session/conversation write carries
/// the session's TTL (`MAX_SESSION_DURATION + 60s`, per `SessionConfig::store_ttl_secs`).
pub struct RedisSessionStore {
    manager: redis::aio::ConnectionManager,
}

impl RedisSessionStore {
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| Error::Server(ServerError::Store(format!("invalid redis url: {e}"))))?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(|e| Error::Server(ServerError::Store(format!("redis connect failed: {e}"))))?;
        Ok(Self { manager })
    }

    fn store_err(context: &str, err: redis::RedisError) -> Error {
        Error::Server(ServerError::Store(format!("{context}: {err}")))
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn put_session(&self, id: SessionId, record: &SessionRecord, ttl: Duration) -> Result<()> {
        let payload = serde_json::to_string(record)
            .map_err(|e| Error::Server(ServerError::Store(format!("serialize session: {e}"))))?;
        let mut conn = self.manager.clone();
        conn.set_ex::<_, _, ()>(session_key(id), payload, ttl.as_secs())
            .await
            .map_err(|e| Self::store_err("put_session", e))
    }

    async fn get_session(&self, id: SessionId) -> Result<Option<SessionRecord>> {
        let mut conn = self.manager.clone();
        let payload: Option<String> = conn
            .get(session_key(id))
            .await
            .map_err(|e| Self::store_err("get_session", e))?;
        payload
            .map(|p| {
                serde_json::from_str(&p)
                    .map_err(|e| Error::Server(ServerError::Store(format!("deserialize session: {e}"))))
            })
            .transpose()
    }

    async fn delete_session(&self, id: SessionId) -> Result<()> {
        let mut conn = self.manager.clone();
        conn.del::<_, ()>(session_key(id))
            .await
            .map_err(|e| Self::store_err("delete_session", e))?;
        conn.del::<_, ()>(conversation_key(id))
            .await
            .map_err(|e| Self::store_err("delete_session/conversation", e))?;
        conn.srem::<_, _, ()>(ACTIVE_SESSIONS_KEY, id.to_string())
            .await
            .map_err(|e| Self::store_err("delete_session/active", e))
    }

    async fn mark_active(&self, id: SessionId) -> Result<()> {
        let mut conn = self.manager.clone();
        conn.sadd::<_, _, ()>(ACTIVE_SESSIONS_KEY, id.to_string())
            .await
            .map_err(|e| Self::store_err("mark_active", e))
    }

    async fn mark_inactive(&self, id: SessionId) -> Result<()> {
        let mut conn = self.manager.clone();
        conn.srem::<_, _, ()>(ACTIVE_SESSIONS_KEY, id.to_string())
            .await
            .map_err(|e| Self::store_err("mark_inactive", e))
    }

    async fn active_sessions(&self) -> Result<Vec<SessionId>> {
        let mut conn = self.manager.clone();
        let members: Vec<String> = conn
            .smembers(ACTIVE_SESSIONS_KEY)
            .await
            .map_err(|e| Self::store_err("active_sessions", e))?;
        Ok(members
            .into_iter()
            .filter_map(|m| m.parse::<SessionId>().ok())
            .collect())
    }

    async fn put_conversation(
        &self,
        id: SessionId,
        state: &ConversationState,
        ttl: Duration,
    ) -> Result<()> {
        let payload = serde_json::to_string(state).map_err(|e| {
            Error::Server(ServerError::Store(format!("serialize conversation: {e}")))
        })?;
        let mut conn = self.manager.clone();
        conn.set_ex::<_, _, ()>(conversation_key(id), payload, ttl.as_secs())
            .await
            .map_err(|e| Self::store_err("put_conversation", e))
    }

    async fn get_conversation(&self, id: SessionId) -> Result<Option<ConversationState>> {
        let mut conn = self.manager.clone();
        let payload: Option<String> = conn
            .get(conversation_key(id))
            .await
            .map_err(|e| Self::store_err("get_conversation", e))?;
        payload
            .map(|p| {
                serde_json::from_str(&p).map_err(|e| {
                    Error::Server(ServerError::Store(format!("deserialize conversation: {e}")))
                })
            })
            .transpose()
    }
}

/// Used only to construct a `SessionRecord` for a brand-new session.
pub fn new_session_record() -> SessionRecord {
    let now = chrono::Utc::now();
    SessionRecord {
        state: SessionState::New,
        created_at: now,
        last_activity: now,
        user_id: None,
        metadata: serde_json::Value::Null,
    }
}

pub type SharedSessionStore = Arc<dyn SessionStore>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_store_round_trips_a_session() {
        let store = InMemorySessionStore::new();
        let id = SessionId::new();
        let record = new_session_record();
        store.put_session(id, &record, Duration::from_secs(60)).await.unwrap();
        let fetched = store.get_session(id).await.unwrap().unwrap();
        assert_eq!(fetched.state, SessionState::New);
    }

    #[tokio::test]
    async fn in_memory_store_tracks_active_sessions() {
        let store = InMemorySessionStore::new();
        let id = SessionId::new();
        store.mark_active(id).await.unwrap();
        assert_eq!(store.active_sessions().await.unwrap(), vec![id]);
        store.mark_inactive(id).await.unwrap();
        assert!(store.active_sessions().await.unwrap().is_empty());
    }
}
