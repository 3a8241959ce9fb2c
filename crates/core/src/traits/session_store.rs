//! External key-value store contract (§6 "Persisted state layout").
//!
//! A real implementation (Redis) and an in-memory one both live in
//! `voice-agent-server`; this crate only defines the shape of the data and
//! the trait both must satisfy.

use crate::conversation::ConversationState;
use crate::error::Result;
use crate::session::{SessionId, SessionState};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// `session:{id}` hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
    pub user_id: Option<String>,
    pub metadata: serde_json::Value,
}

#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    async fn put_session(&self, id: SessionId, record: &SessionRecord, ttl: Duration) -> Result<()>;
    async fn get_session(&self, id: SessionId) -> Result<Option<SessionRecord>>;
    async fn delete_session(&self, id: SessionId) -> Result<()>;

    /// `sessions:active` set membership, atomically updatable from any
    /// session actor (§5).
    async fn mark_active(&self, id: SessionId) -> Result<()>;
    async fn mark_inactive(&self, id: SessionId) -> Result<()>;
    async fn active_sessions(&self) -> Result<Vec<SessionId>>;

    /// `conversation:{id}` hash.
    async fn put_conversation(
        &self,
        id: SessionId,
        state: &ConversationState,
        ttl: Duration,
    ) -> Result<()>;
    async fn get_conversation(&self, id: SessionId) -> Result<Option<ConversationState>>;
}
