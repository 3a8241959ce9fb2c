//! ASR/TTS adapter implementations (§6). The LLM adapter lives in
//! `voice-agent-llm`; ASR and TTS have no real service to front in the
//! retrieved corpus, so they're grounded on the same HTTP-JSON shape used
//! there, built directly against an OpenAI-Whisper-style transcription
//! endpoint and a generic JSON TTS endpoint respectively.

pub mod asr;
pub mod mock;
pub mod tts;

pub use asr::HttpSpeechToText;
pub use mock::{MockSpeechToText, MockTextToSpeech};
pub use tts::HttpTextToSpeech;
