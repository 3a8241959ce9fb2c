//! Turn-taking state machine (C2, §4.2).
//!
//! Two event sources drive the machine: `on_chunk` (audio arrives) and
//! `on_tick` (wall clock advances with no new audio). Callers that have both
//! a chunk and a tick pending for the same instant must invoke `on_tick`
//! first so a timer that has already expired fires before the new chunk's
//! verdict is folded in.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use voice_agent_config::constants::turn_taking as timing_const;
use voice_agent_config::TurnTimingConfig;
use voice_agent_core::audio::{AudioChunk, SampleRate};
use voice_agent_core::turn::{EngineState, TurnEvent, TurnStateData};

use crate::vad::{VadEngine, VoiceClass};

pub struct TurnTakingEngine {
    vad: Arc<dyn VadEngine>,
    timing: TurnTimingConfig,
    state: Arc<Mutex<TurnStateData>>,
}

impl TurnTakingEngine {
    pub fn new(vad: Arc<dyn VadEngine>, timing: TurnTimingConfig, sample_rate: SampleRate) -> Self {
        Self {
            vad,
            timing,
            state: Arc::new(Mutex::new(TurnStateData::new(sample_rate, Instant::now()))),
        }
    }

    /// Shared handle to the underlying state, so the barge-in detector (C3)
    /// can read/update `bot_speaking` and its frame counter on the same
    /// per-session state per §3.
    pub fn shared_state(&self) -> Arc<Mutex<TurnStateData>> {
        self.state.clone()
    }

    pub fn engine_state(&self) -> EngineState {
        self.state.lock().engine_state
    }

    /// Evaluates timer-driven transitions only; no verdict is computed.
    pub fn on_tick(&self, now: Instant) -> Vec<TurnEvent> {
        let mut state = self.state.lock();
        let mut events = Vec::new();
        self.check_timers(&mut state, now, &mut events);
        state.debug_assert_invariants();
        events
    }

    /// Evaluates the chunk's VAD verdict and applies it, then re-checks the
    /// same timers (a chunk arrival is itself a tick).
    pub fn on_chunk(&self, chunk: &AudioChunk, now: Instant) -> Vec<TurnEvent> {
        let verdict = self.vad.evaluate(chunk);
        let mut state = self.state.lock();
        let mut events = Vec::new();
        self.apply_verdict(&mut state, verdict, chunk, now);
        self.check_timers(&mut state, now, &mut events);
        state.debug_assert_invariants();
        events
    }

    /// Commanded by the conversation layer (C4) when a turn's transcript is
    /// linguistically incomplete. PCM is not retained across the wait: the
    /// continuation's audio starts a fresh buffer, and the completed
    /// transcript prefix is carried as text by the caller, not as PCM here.
    pub fn enter_waiting_incomplete(&self, now: Instant) {
        let mut state = self.state.lock();
        state.engine_state = EngineState::WaitingIncomplete;
        state.listening_started_at = None;
        state.silence_started_at = None;
        state.incomplete_started_at = Some(now);
        state.audio_buffer.clear();
        state.speech_accumulated_ms = 0;
        state.continuation_cue_emitted_this_wait = false;
        state.comfort_emitted_this_wait = false;
    }

    fn apply_verdict(
        &self,
        state: &mut TurnStateData,
        verdict: crate::vad::VadVerdict,
        chunk: &AudioChunk,
        now: Instant,
    ) {
        let voiced_ms = (chunk.duration_ms() as f32 * verdict.p) as u64;

        match state.engine_state {
            EngineState::Idle => {
                // Uncertain is treated as voice-like in IDLE (§4.1 policy note).
                let is_voice_like =
                    matches!(verdict.classification, VoiceClass::Voice | VoiceClass::Uncertain);
                if is_voice_like {
                    state.engine_state = EngineState::Listening;
                    state.listening_started_at = Some(now);
                    state.last_speech_at = Some(now);
                    // `nudge_count` is a whole-session cap (§8 property 3),
                    // not per-idle-episode: do not reset it here.
                    state.audio_buffer.push_chunk(chunk);
                    state.accumulate_speech_ms(voiced_ms);
                }
            }
            EngineState::Listening => {
                state.audio_buffer.push_chunk(chunk);
                // Uncertain is treated as silence in LISTENING (§4.1 policy note).
                let treat_as_silence = matches!(
                    verdict.classification,
                    VoiceClass::Silence | VoiceClass::WeakSignal | VoiceClass::Uncertain
                );
                if verdict.classification == VoiceClass::Voice {
                    state.last_speech_at = Some(now);
                    state.silence_started_at = None;
                    state.accumulate_speech_ms(voiced_ms);
                } else if treat_as_silence && state.silence_started_at.is_none() {
                    state.silence_started_at = Some(now);
                }
            }
            EngineState::CandidateEnd => {
                state.audio_buffer.push_chunk(chunk);
                if verdict.classification == VoiceClass::Voice {
                    state.engine_state = EngineState::Listening;
                    state.silence_started_at = None;
                    state.last_speech_at = Some(now);
                    state.accumulate_speech_ms(voiced_ms);
                }
                // Otherwise silence persists; `check_timers` measures it
                // against the `silence_started_at` set back in LISTENING.
            }
            EngineState::WaitingIncomplete => {
                if verdict.classification == VoiceClass::Voice {
                    state.engine_state = EngineState::Listening;
                    state.listening_started_at = Some(now);
                    state.last_speech_at = Some(now);
                    state.incomplete_started_at = None;
                    state.audio_buffer.push_chunk(chunk);
                    state.accumulate_speech_ms(voiced_ms);
                }
            }
        }
    }

    fn check_timers(&self, state: &mut TurnStateData, now: Instant, events: &mut Vec<TurnEvent>) {
        match state.engine_state {
            EngineState::Idle => {
                if state.nudge_count < timing_const::MAX_NUDGE_COUNT {
                    let elapsed = now.duration_since(state.idle_entered_at).as_millis() as u64;
                    if elapsed >= self.timing.nudge_ms {
                        state.nudge_count += 1;
                        state.idle_entered_at = now;
                        events.push(TurnEvent::Nudge);
                    }
                }
            }
            EngineState::Listening => {
                if let Some(silence_started) = state.silence_started_at {
                    let elapsed = now.duration_since(silence_started).as_millis() as u64;
                    if elapsed >= self.timing.candidate_end_ms {
                        state.engine_state = EngineState::CandidateEnd;
                    }
                }
            }
            EngineState::CandidateEnd => {
                if let Some(silence_started) = state.silence_started_at {
                    let elapsed = now.duration_since(silence_started).as_millis() as u64;
                    if elapsed >= self.timing.candidate_end_ms + self.timing.final_end_ms {
                        if state.speech_accumulated_ms >= self.timing.min_speech_ms {
                            events.push(TurnEvent::TurnEnd {
                                pcm: state.audio_buffer.to_pcm16(),
                            });
                        }
                        state.reset_for_new_turn(now);
                    }
                }
            }
            EngineState::WaitingIncomplete => {
                if let Some(incomplete_started) = state.incomplete_started_at {
                    let elapsed = now.duration_since(incomplete_started).as_millis() as u64;
                    if elapsed >= self.timing.comfort_wait_ms && !state.comfort_emitted_this_wait {
                        state.comfort_emitted_this_wait = true;
                        state.comfort_count = state.comfort_count.saturating_add(1);
                        events.push(TurnEvent::Comfort);
                        state.reset_for_new_turn(now);
                    } else if elapsed >= self.timing.incomplete_wait_ms
                        && !state.continuation_cue_emitted_this_wait
                    {
                        state.continuation_cue_emitted_this_wait = true;
                        state.continuation_count = state.continuation_count.saturating_add(1);
                        events.push(TurnEvent::ContinuationCue);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vad::VadEvaluator;
    use std::time::Duration;
    use voice_agent_core::audio::AudioChunk;

    fn engine() -> TurnTakingEngine {
        TurnTakingEngine::new(
            Arc::new(VadEvaluator::new()),
            TurnTimingConfig::default(),
            SampleRate::Hz16000,
        )
    }

    fn loud_chunk(seq: u64) -> AudioChunk {
        // 20 frames (400ms) of full-scale samples: clears min_speech_ms (300ms)
        // in a single chunk so tests don't need to accumulate across calls.
        let pcm: Vec<u8> = std::iter::repeat(i16::MAX.to_le_bytes())
            .take(320 * 20)
            .flatten()
            .collect();
        AudioChunk::from_pcm16(&pcm, SampleRate::Hz16000, seq)
    }

    fn silent_chunk(seq: u64) -> AudioChunk {
        let pcm = vec![0u8; 320 * 4 * 2];
        AudioChunk::from_pcm16(&pcm, SampleRate::Hz16000, seq)
    }

    #[test]
    fn voice_chunk_moves_idle_to_listening() {
        let engine = engine();
        assert_eq!(engine.engine_state(), EngineState::Idle);
        let now = Instant::now();
        engine.on_tick(now);
        engine.on_chunk(&loud_chunk(0), now);
        assert_eq!(engine.engine_state(), EngineState::Listening);
    }

    #[test]
    fn full_silence_after_speech_emits_turn_end() {
        let engine = engine();
        let t0 = Instant::now();
        engine.on_tick(t0);
        engine.on_chunk(&loud_chunk(0), t0);
        assert_eq!(engine.engine_state(), EngineState::Listening);

        let t1 = t0 + Duration::from_millis(100);
        engine.on_tick(t1);
        engine.on_chunk(&silent_chunk(1), t1);
        assert_eq!(engine.engine_state(), EngineState::Listening);

        let t2 = t1 + Duration::from_millis(1000);
        let events = engine.on_tick(t2);
        assert_eq!(engine.engine_state(), EngineState::CandidateEnd);
        assert!(events.is_empty());

        let t3 = t2 + Duration::from_millis(400);
        let events = engine.on_tick(t3);
        assert!(matches!(events[0], TurnEvent::TurnEnd { .. }));
        assert_eq!(engine.engine_state(), EngineState::Idle);
    }

    #[test]
    fn short_speech_burst_drops_without_turn_end() {
        let engine = engine();
        let t0 = Instant::now();
        engine.on_tick(t0);
        // A single 80ms loud chunk: well under min_speech_ms (300ms).
        let pcm: Vec<u8> = std::iter::repeat(i16::MAX.to_le_bytes())
            .take(320)
            .flatten()
            .collect();
        let chunk = AudioChunk::from_pcm16(&pcm, SampleRate::Hz16000, 0);
        engine.on_chunk(&chunk, t0);
        assert_eq!(engine.engine_state(), EngineState::Listening);

        let t1 = t0 + Duration::from_millis(1000);
        engine.on_tick(t1);
        assert_eq!(engine.engine_state(), EngineState::CandidateEnd);

        let t2 = t1 + Duration::from_millis(400);
        let events = engine.on_tick(t2);
        assert!(events.is_empty());
        assert_eq!(engine.engine_state(), EngineState::Idle);
    }

    #[test]
    fn idle_nudge_fires_once_per_interval_up_to_cap() {
        let engine = engine();
        let mut now = Instant::now();
        for expected_count in 1..=3u8 {
            now += Duration::from_millis(1500);
            let events = engine.on_tick(now);
            assert!(matches!(events[0], TurnEvent::Nudge));
            assert_eq!(engine.state.lock().nudge_count, expected_count);
        }
        now += Duration::from_millis(1500);
        let events = engine.on_tick(now);
        assert!(events.is_empty());
    }

    #[test]
    fn waiting_incomplete_resumes_on_voice_and_clears_buffer() {
        let engine = engine();
        engine.enter_waiting_incomplete(Instant::now());
        assert_eq!(engine.engine_state(), EngineState::WaitingIncomplete);
        assert!(engine.state.lock().audio_buffer.is_empty());

        let now = Instant::now();
        engine.on_tick(now);
        engine.on_chunk(&loud_chunk(0), now);
        assert_eq!(engine.engine_state(), EngineState::Listening);
    }

    #[test]
    fn waiting_incomplete_emits_cue_then_comfort() {
        let engine = engine();
        let t0 = Instant::now();
        engine.enter_waiting_incomplete(t0);

        let t1 = t0 + Duration::from_millis(300);
        let events = engine.on_tick(t1);
        assert!(matches!(events[0], TurnEvent::ContinuationCue));

        let t2 = t0 + Duration::from_millis(1500);
        let events = engine.on_tick(t2);
        assert!(matches!(events[0], TurnEvent::Comfort));
        assert_eq!(engine.engine_state(), EngineState::Idle);
    }
}
