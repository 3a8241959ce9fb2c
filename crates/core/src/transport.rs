//! Server -> client control/response messages (§6 transport table).
//!
//! Client -> server audio is raw binary PCM16 (no in-band framing); only the
//! server's JSON messages need a wire type.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Transcription {
        text: String,
        confidence: f32,
    },
    Response {
        text: String,
        /// base64-encoded synthesised audio.
        audio: String,
        conversation_state: String,
    },
    BargeIn,
    Nudge {
        text: String,
    },
    ContinuationCue {
        text: String,
    },
    Comfort {
        text: String,
    },
    Error {
        code: String,
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn barge_in_serializes_with_tag_only() {
        let msg = ServerMessage::BargeIn;
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(json, r#"{"type":"barge_in"}"#);
    }

    #[test]
    fn nudge_round_trips() {
        let msg = ServerMessage::Nudge {
            text: "Are you still there?".into(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        let back: ServerMessage = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, ServerMessage::Nudge { .. }));
    }
}
