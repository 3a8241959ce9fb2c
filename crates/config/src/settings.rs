//! Environment-backed application settings (§6 "Configuration").

use crate::constants::{session, turn_taking};
use crate::ConfigError;
use config::{Config, Environment};
use serde::{Deserialize, Serialize};

/// Per-session-overridable §4.2 timing constants.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TurnTimingConfig {
    #[serde(default = "default_candidate_end_ms")]
    pub candidate_end_ms: u64,
    #[serde(default = "default_final_end_ms")]
    pub final_end_ms: u64,
    #[serde(default = "default_min_speech_ms")]
    pub min_speech_ms: u64,
    #[serde(default = "default_nudge_ms")]
    pub nudge_ms: u64,
    #[serde(default = "default_incomplete_wait_ms")]
    pub incomplete_wait_ms: u64,
    #[serde(default = "default_comfort_wait_ms")]
    pub comfort_wait_ms: u64,
}

fn default_candidate_end_ms() -> u64 {
    turn_taking::CANDIDATE_END_MS
}
fn default_final_end_ms() -> u64 {
    turn_taking::FINAL_END_MS
}
fn default_min_speech_ms() -> u64 {
    turn_taking::MIN_SPEECH_MS
}
fn default_nudge_ms() -> u64 {
    turn_taking::NUDGE_MS
}
fn default_incomplete_wait_ms() -> u64 {
    turn_taking::INCOMPLETE_WAIT_MS
}
fn default_comfort_wait_ms() -> u64 {
    turn_taking::COMFORT_WAIT_MS
}

impl Default for TurnTimingConfig {
    fn default() -> Self {
        Self {
            candidate_end_ms: turn_taking::CANDIDATE_END_MS,
            final_end_ms: turn_taking::FINAL_END_MS,
            min_speech_ms: turn_taking::MIN_SPEECH_MS,
            nudge_ms: turn_taking::NUDGE_MS,
            incomplete_wait_ms: turn_taking::INCOMPLETE_WAIT_MS,
            comfort_wait_ms: turn_taking::COMFORT_WAIT_MS,
        }
    }
}

impl TurnTimingConfig {
    /// Reject configurations that would wedge the state machine, per
    /// SPEC_FULL's `Settings::validate()` supplement.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.candidate_end_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "candidate_end_ms".into(),
                message: "must be > 0".into(),
            });
        }
        if self.final_end_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "final_end_ms".into(),
                message: "must be > 0".into(),
            });
        }
        if self.nudge_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "nudge_ms".into(),
                message: "must be > 0".into(),
            });
        }
        if self.incomplete_wait_ms == 0 || self.comfort_wait_ms <= self.incomplete_wait_ms {
            return Err(ConfigError::InvalidValue {
                field: "comfort_wait_ms".into(),
                message: "must be > 0 and greater than incomplete_wait_ms".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_session_duration_secs")]
    pub max_session_duration_secs: u64,
}

fn default_idle_timeout_secs() -> u64 {
    session::IDLE_TIMEOUT_SECS
}
fn default_max_session_duration_secs() -> u64 {
    session::MAX_SESSION_DURATION_SECS
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: session::IDLE_TIMEOUT_SECS,
            max_session_duration_secs: session::MAX_SESSION_DURATION_SECS,
        }
    }
}

impl SessionConfig {
    pub fn store_ttl_secs(&self) -> u64 {
        self.max_session_duration_secs + session::STORE_TTL_GRACE_SECS
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.idle_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "idle_timeout_secs".into(),
                message: "must be > 0".into(),
            });
        }
        if self.max_session_duration_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_session_duration_secs".into(),
                message: "must be > 0".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RedisConfig {
    #[serde(default = "default_redis_host")]
    pub host: String,
    #[serde(default = "default_redis_port")]
    pub port: u16,
    #[serde(default)]
    pub db: i64,
}

fn default_redis_host() -> String {
    "127.0.0.1".to_string()
}
fn default_redis_port() -> u16 {
    6379
}

impl RedisConfig {
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

/// Adapter base URLs / credentials (§6).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AdapterConfig {
    #[serde(default)]
    pub asr_base_url: Option<String>,
    #[serde(default)]
    pub asr_api_key: Option<String>,
    #[serde(default)]
    pub llm_base_url: Option<String>,
    #[serde(default)]
    pub llm_api_key: Option<String>,
    #[serde(default)]
    pub tts_base_url: Option<String>,
    #[serde(default)]
    pub tts_api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// `"memory"` for local dev/tests, `"redis"` for a real deployment.
    #[serde(default = "default_store_backend")]
    pub store_backend: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_store_backend() -> String {
    "memory".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub turn_timing: TurnTimingConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub adapters: AdapterConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            session: SessionConfig::default(),
            turn_timing: TurnTimingConfig::default(),
            redis: RedisConfig::default(),
            adapters: AdapterConfig::default(),
        }
    }
}

impl Settings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.turn_timing.validate()?;
        self.session.validate()?;
        Ok(())
    }
}

/// Loads settings from environment variables with the `VOICE_AGENT` prefix
/// (e.g. `VOICE_AGENT__SESSION__IDLE_TIMEOUT_SECS`, `VOICE_AGENT__REDIS__HOST`),
/// falling back to the defaults above for everything unset.
pub fn load_settings() -> Result<Settings, ConfigError> {
    let config = Config::builder()
        .add_source(
            Environment::with_prefix("VOICE_AGENT")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let settings: Settings = config.try_deserialize().unwrap_or_default();
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Settings::default().validate().is_ok());
    }

    #[test]
    fn zero_candidate_end_ms_is_rejected() {
        let mut timing = TurnTimingConfig::default();
        timing.candidate_end_ms = 0;
        assert!(timing.validate().is_err());
    }

    #[test]
    fn store_ttl_adds_grace_period() {
        let session = SessionConfig::default();
        assert_eq!(session.store_ttl_secs(), 600 + 60);
    }
}
