//! LLM adapter (§6): wraps an OpenAI-compatible chat endpoint behind the
//! `voice_agent_core::LanguageModel` trait, plus an in-memory mock for
//! development and tests.

pub mod http;
pub mod mock;

pub use http::{HttpLanguageModel, HttpLlmConfig};
pub use mock::EchoLanguageModel;
