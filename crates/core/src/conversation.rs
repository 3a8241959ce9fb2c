//! Conversation state owned by C4 (§3, §4.4).

use serde::{Deserialize, Serialize};

/// Dialogue state per §4.4's transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DialogueState {
    Init,
    Greeting,
    Listening,
    Processing,
    Responding,
    Clarifying,
    Error,
    End,
}

impl DialogueState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, DialogueState::End)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
}

/// Counters + history for one session's C4 state, persisted in the external
/// store under `conversation:{id}` / `conversation:{id}:history` per §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub dialogue_state: DialogueState,
    pub turn_count: u32,
    pub clarification_count: u32,
    pub silence_prompts: u32,
    pub history: Vec<Turn>,
    /// Text retained across a `WAITING_INCOMPLETE` episode, concatenated
    /// onto the next ASR transcript before routing (§9 Open Question).
    pub pending_prefix: String,
}

impl ConversationState {
    pub fn new() -> Self {
        Self {
            dialogue_state: DialogueState::Init,
            turn_count: 0,
            clarification_count: 0,
            silence_prompts: 0,
            history: Vec::new(),
            pending_prefix: String::new(),
        }
    }

    pub fn push_turn(&mut self, role: TurnRole, content: impl Into<String>) {
        self.history.push(Turn {
            role,
            content: content.into(),
        });
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

/// Input-quality classification computed before routing (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputQuality {
    Empty,
    Unclear,
    Clear,
}
