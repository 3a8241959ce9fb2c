//! Closed record types at the ASR/LLM adapter boundary (§6, §9 "dynamic typing").

use serde::{Deserialize, Serialize};

/// `transcribe(pcm, use_vad_filter=false) -> AsrResult` per §6.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsrResult {
    pub text: String,
    pub confidence: f32,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    System,
    User,
    Assistant,
}

/// `{role, content}` message per §6's LLM adapter contract — no extra
/// metadata fields; history filtering strips anything non-conforming before
/// the call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: Role,
    pub content: String,
}

impl LlmMessage {
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

/// `synthesise(text) -> TtsResult` per §6.
#[derive(Debug, Clone)]
pub struct TtsResult {
    pub audio_bytes: Vec<u8>,
    pub duration_sec: f32,
}
