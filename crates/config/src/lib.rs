//! Configuration management for the voice agent.
//!
//! Settings load from environment variables (`VOICE_AGENT__` prefix); the
//! timing/audio defaults they override live in `constants`.

pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, AdapterConfig, RedisConfig, ServerConfig, SessionConfig, Settings,
    TurnTimingConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Environment error: {0}")]
    Environment(String),
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
