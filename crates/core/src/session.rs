//! Session identity and lifecycle state (§3 "Session").

use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Session lifecycle state per §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    New,
    Active,
    Idle,
    Closed,
}

/// In-memory bookkeeping for a session's idle/max-duration clocks. The
/// session's substantive state (turn/conversation) lives in the actor and
/// the external store; this just tracks the two timers from §5.
#[derive(Debug, Clone)]
pub struct SessionClock {
    pub created_at: Instant,
    pub last_activity: Instant,
}

impl SessionClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            created_at: now,
            last_activity: now,
        }
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }

    pub fn is_idle(&self, now: Instant, idle_timeout: std::time::Duration) -> bool {
        now.duration_since(self.last_activity) >= idle_timeout
    }

    pub fn is_expired(&self, now: Instant, max_duration: std::time::Duration) -> bool {
        now.duration_since(self.created_at) >= max_duration
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}
