//! Crate-crossing error types

use thiserror::Error;

/// Pipeline-crate errors re-exported here so other crates can match on them
/// without depending on `voice-agent-pipeline` directly.
#[derive(Error, Debug, Clone)]
pub enum PipelineError {
    #[error("VAD error: {0}")]
    Vad(String),

    #[error("turn-taking error: {0}")]
    TurnTaking(String),

    #[error("malformed audio chunk: {0}")]
    MalformedAudio(String),
}

/// Agent-crate errors
#[derive(Error, Debug, Clone)]
pub enum AgentError {
    #[error("invariant violation: {0}")]
    InvariantViolation(String),

    #[error("adapter error: {0}")]
    Adapter(String),

    #[error("session not found: {0}")]
    SessionNotFound(String),
}

/// Server-crate errors
#[derive(Error, Debug, Clone)]
pub enum ServerError {
    #[error("session error: {0}")]
    Session(String),

    #[error("websocket error: {0}")]
    WebSocket(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("store error: {0}")]
    Store(String),
}

/// The error type shared across crate boundaries.
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("pipeline: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("agent: {0}")]
    Agent(#[from] AgentError),

    #[error("server: {0}")]
    Server(#[from] ServerError),

    #[error("configuration: {0}")]
    Config(String),

    #[error("adapter transient failure: {0}")]
    Transient(String),
}

pub type Result<T> = std::result::Result<T, Error>;
