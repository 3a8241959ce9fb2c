//! Turn state owned jointly by C2 (turn-taking) and C3 (barge-in) per §3.

use crate::audio::AudioBuffer;
use std::time::Instant;

/// Engine state per §3/§4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Listening,
    CandidateEnd,
    WaitingIncomplete,
}

/// Per-session turn-taking state. Timestamp fields are sentinel-by-`None`
/// exactly as §3 describes; invariant 1 (exactly one of
/// `listening_started_at`/`silence_started_at`/`incomplete_started_at` set
/// per respective state) is checked with `debug_assert!` at the end of every
/// transition rather than encoded structurally, because `silence_started_at`
/// genuinely spans both `LISTENING` and `CANDIDATE_END` in §4.2's transition
/// table and so cannot be pinned to a single enum variant without duplicating
/// the timer.
#[derive(Debug)]
pub struct TurnStateData {
    pub engine_state: EngineState,
    pub listening_started_at: Option<Instant>,
    pub last_speech_at: Option<Instant>,
    pub silence_started_at: Option<Instant>,
    pub incomplete_started_at: Option<Instant>,
    pub idle_entered_at: Instant,

    pub speech_accumulated_ms: u64,
    pub audio_buffer: AudioBuffer,

    pub bot_speaking: bool,
    pub bot_speaking_until: Option<Instant>,
    pub consecutive_speech_frames_during_bot: u32,

    pub nudge_count: u8,
    pub continuation_count: u8,
    pub comfort_count: u8,
    /// Whether `CONTINUATION_CUE` has already fired for the current
    /// `WAITING_INCOMPLETE` silence run (cleared on re-entry).
    pub continuation_cue_emitted_this_wait: bool,
    pub comfort_emitted_this_wait: bool,
}

impl TurnStateData {
    pub fn new(sample_rate: crate::audio::SampleRate, now: Instant) -> Self {
        Self {
            engine_state: EngineState::Idle,
            listening_started_at: None,
            last_speech_at: None,
            silence_started_at: None,
            incomplete_started_at: None,
            idle_entered_at: now,
            speech_accumulated_ms: 0,
            audio_buffer: AudioBuffer::new(sample_rate),
            bot_speaking: false,
            bot_speaking_until: None,
            consecutive_speech_frames_during_bot: 0,
            nudge_count: 0,
            continuation_count: 0,
            comfort_count: 0,
            continuation_cue_emitted_this_wait: false,
            comfort_emitted_this_wait: false,
        }
    }

    /// Invariant 1 check, run after each transition in debug builds.
    pub fn debug_assert_invariants(&self) {
        match self.engine_state {
            EngineState::Idle => {
                debug_assert!(self.listening_started_at.is_none());
                debug_assert!(self.incomplete_started_at.is_none());
            }
            EngineState::Listening => {
                debug_assert!(self.listening_started_at.is_some());
                debug_assert!(self.incomplete_started_at.is_none());
            }
            EngineState::CandidateEnd => {
                debug_assert!(self.incomplete_started_at.is_none());
            }
            EngineState::WaitingIncomplete => {
                debug_assert!(self.incomplete_started_at.is_some());
            }
        }
        // Invariant 2: monotonic, non-negative within a turn — enforced by
        // only ever incrementing via `accumulate_speech_ms`.
        // Invariant 3 (buffer non-empty iff engine_state is an active-turn
        // state) is enforced by the engine always appending the triggering
        // chunk in the same step it transitions into `Listening`, so it does
        // not hold mid-transition and is not checked here.
        // Invariant 4.
        if !self.bot_speaking {
            debug_assert_eq!(self.consecutive_speech_frames_during_bot, 0);
        }
        // Invariant 5.
        debug_assert!(self.nudge_count <= 3);
    }

    pub fn accumulate_speech_ms(&mut self, ms: u64) {
        self.speech_accumulated_ms = self.speech_accumulated_ms.saturating_add(ms);
    }

    pub fn reset_for_new_turn(&mut self, now: Instant) {
        self.engine_state = EngineState::Idle;
        self.listening_started_at = None;
        self.last_speech_at = None;
        self.silence_started_at = None;
        self.incomplete_started_at = None;
        self.idle_entered_at = now;
        self.speech_accumulated_ms = 0;
        self.audio_buffer.clear();
        self.continuation_cue_emitted_this_wait = false;
        self.comfort_emitted_this_wait = false;
    }
}

/// Events emitted by C2 per §4.2 "Emission semantics".
#[derive(Debug, Clone)]
pub enum TurnEvent {
    /// Carries the accumulated PCM16 buffer for the completed turn.
    TurnEnd { pcm: Vec<u8> },
    ContinuationCue,
    Nudge,
    Comfort,
}
