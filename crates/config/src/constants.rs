//! Centralized, domain-agnostic constants — defaults for the values §4.2
//! and §6 say are configurable per session/deployment.

/// Audio/VAD constants (§3, §4.1).
pub mod audio {
    pub const SAMPLE_RATE_HZ: u32 = 16000;
    pub const FRAME_MS: u32 = 20;
    pub const FRAME_SAMPLES: usize = 320;

    pub const PCM16_NORMALIZE: f32 = 32768.0;
    pub const PCM16_SCALE: f32 = 32767.0;

    /// WebRTC VAD aggressiveness level per §4.1.
    pub const WEBRTC_VAD_MODE: u8 = 2;

    // Energy-fallback thresholds (normalised sample magnitude, §4.1).
    pub const ENERGY_CLEAR_SPEECH: f32 = 0.030;
    pub const ENERGY_UNCERTAIN: f32 = 0.015;
    pub const ENERGY_WEAK: f32 = 0.005;

    // Frame-ratio thresholds (§4.1 table).
    pub const RATIO_VOICE: f32 = 0.50;
    pub const RATIO_UNCERTAIN: f32 = 0.25;
}

/// §4.2 turn-taking timing constants, overridable per session.
pub mod turn_taking {
    pub const CANDIDATE_END_MS: u64 = 1000;
    pub const FINAL_END_MS: u64 = 400;
    pub const MIN_SPEECH_MS: u64 = 300;
    pub const NUDGE_MS: u64 = 1500;
    pub const INCOMPLETE_WAIT_MS: u64 = 300;
    pub const COMFORT_WAIT_MS: u64 = 1500;
    pub const MAX_NUDGE_COUNT: u8 = 3;
}

/// §4.3 barge-in constants.
pub mod barge_in {
    pub const VOICED_FRAME_THRESHOLD: f32 = 0.6;
    pub const CONSECUTIVE_FRAMES_TO_PREEMPT: u32 = 2;
}

/// §4.4/§4.5 conversation and routing constants.
pub mod conversation {
    pub const MAX_CLARIFICATIONS: u32 = 2;
    pub const MAX_TURN_COUNT: u32 = 20;
}

pub mod router {
    pub const ACCEPT_THRESHOLD: f32 = 0.8;
    pub const SOFT_ACCEPT_THRESHOLD: f32 = 0.3;
    pub const CLARIFY_THRESHOLD: f32 = 0.2;
}

/// §5/§6 session lifecycle defaults.
pub mod session {
    pub const IDLE_TIMEOUT_SECS: u64 = 30;
    pub const MAX_SESSION_DURATION_SECS: u64 = 600;
    pub const STORE_TTL_GRACE_SECS: u64 = 60;
    pub const HISTORY_RETENTION_HOURS: u64 = 24;
}
