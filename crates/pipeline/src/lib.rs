//! Audio pipeline: voice activity detection, turn-taking, and barge-in.
//!
//! - `vad`: WebRTC-primary / energy-fallback voice activity detector (C1).
//! - `turn_taking`: the per-session turn-taking state machine (C2).
//! - `barge_in`: bot-playback interruption detection (C3).

pub mod barge_in;
pub mod turn_taking;
pub mod vad;

pub use barge_in::{BargeInDetector, BargeInOutcome};
pub use turn_taking::TurnTakingEngine;
pub use vad::{VadEngine, VadEvaluator, VadVerdict, VoiceClass};

pub use voice_agent_core::error::PipelineError;
