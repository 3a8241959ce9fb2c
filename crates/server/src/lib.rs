//! HTTP + WebSocket transport, session persistence, and ASR/TTS adapters for
//! the turn-taking voice service (§6).

pub mod adapters;
pub mod http;
pub mod state;
pub mod store;
pub mod websocket;

pub use http::create_router;
pub use state::AppState;

pub use voice_agent_core::error::ServerError;
