//! Core types and traits shared across the turn-taking service.
//!
//! - Audio frame/chunk types and PCM16 conversion (`audio`).
//! - Session identity and lifecycle bookkeeping (`session`).
//! - Turn-taking state owned by C2/C3 (`turn`).
//! - Conversation state owned by C4 (`conversation`).
//! - Closed ASR/LLM/TTS record types (`asr`).
//! - Transport wire types (`transport`).
//! - Crate-crossing error type (`error`).
//! - Collaborator traits (`traits`).

pub mod asr;
pub mod audio;
pub mod conversation;
pub mod error;
pub mod session;
pub mod traits;
pub mod transport;
pub mod turn;

pub use asr::{AsrResult, LlmMessage, Role, TtsResult};
pub use audio::{AudioBuffer, AudioChunk, AudioFrame, Channels, FrameSplit, SampleRate};
pub use conversation::{ConversationState, DialogueState, InputQuality, Turn, TurnRole};
pub use error::{Error, Result};
pub use session::{SessionClock, SessionId, SessionState};
pub use traits::{LanguageModel, SessionStore, SpeechToText, TextToSpeech};
pub use transport::ServerMessage;
pub use turn::{EngineState, TurnEvent, TurnStateData};
