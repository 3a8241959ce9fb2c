//! Barge-in detection (C3, §4.3): pre-empts bot playback after two
//! consecutive 20 ms frames scoring at or above the voiced-frame threshold.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use voice_agent_config::constants::barge_in as barge_in_const;
use voice_agent_core::audio::{AudioChunk, FrameSplit};
use voice_agent_core::turn::TurnStateData;

use crate::vad::VadEvaluator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BargeInOutcome {
    /// Playback should continue; nothing crossed the threshold.
    Continue,
    /// Two consecutive voiced frames seen: pre-empt the bot's playback.
    Preempt,
}

/// Invoked on every incoming chunk while `bot_speaking` is true. Shares the
/// `TurnStateData` with the `TurnTakingEngine` for the same session, since
/// §3 places `bot_speaking`/`consecutive_speech_frames_during_bot` under
/// joint C2/C3 ownership.
pub struct BargeInDetector {
    vad: Arc<VadEvaluator>,
    state: Arc<Mutex<TurnStateData>>,
}

impl BargeInDetector {
    pub fn new(vad: Arc<VadEvaluator>, state: Arc<Mutex<TurnStateData>>) -> Self {
        Self { vad, state }
    }

    pub fn start_playback(&self, until: Instant) {
        let mut state = self.state.lock();
        state.bot_speaking = true;
        state.bot_speaking_until = Some(until);
        state.consecutive_speech_frames_during_bot = 0;
    }

    pub fn stop_playback(&self) {
        let mut state = self.state.lock();
        state.bot_speaking = false;
        state.bot_speaking_until = None;
        state.consecutive_speech_frames_during_bot = 0;
    }

    /// Clears `bot_speaking` once its deadline has passed uninterrupted
    /// (§3: "cleared on pre-emption or deadline"). A no-op before the
    /// deadline or while the bot isn't speaking.
    pub fn expire(&self, now: Instant) {
        let mut state = self.state.lock();
        if state.bot_speaking && state.bot_speaking_until.is_some_and(|until| now >= until) {
            state.bot_speaking = false;
            state.bot_speaking_until = None;
            state.consecutive_speech_frames_during_bot = 0;
        }
    }

    /// No-op (returns `Continue`) if the bot isn't currently speaking.
    pub fn on_chunk(&self, chunk: &AudioChunk) -> BargeInOutcome {
        let mut state = self.state.lock();
        if !state.bot_speaking {
            return BargeInOutcome::Continue;
        }

        for split in chunk.split_into_frames() {
            let samples: &[f32] = match &split {
                FrameSplit::Frame(frame) => &frame.samples,
                FrameSplit::Tail(samples) => samples,
            };
            let p = self.vad.frame_probability(samples);
            if p >= barge_in_const::VOICED_FRAME_THRESHOLD {
                state.consecutive_speech_frames_during_bot += 1;
            } else {
                state.consecutive_speech_frames_during_bot = 0;
            }

            if state.consecutive_speech_frames_during_bot
                >= barge_in_const::CONSECUTIVE_FRAMES_TO_PREEMPT
            {
                state.bot_speaking = false;
                state.bot_speaking_until = None;
                state.consecutive_speech_frames_during_bot = 0;
                return BargeInOutcome::Preempt;
            }
        }

        BargeInOutcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voice_agent_core::audio::SampleRate;

    fn state() -> Arc<Mutex<TurnStateData>> {
        Arc::new(Mutex::new(TurnStateData::new(SampleRate::Hz16000, Instant::now())))
    }

    fn loud_chunk() -> AudioChunk {
        let pcm: Vec<u8> = std::iter::repeat(i16::MAX.to_le_bytes())
            .take(320 * 2)
            .flatten()
            .collect();
        AudioChunk::from_pcm16(&pcm, SampleRate::Hz16000, 0)
    }

    fn silent_chunk() -> AudioChunk {
        let pcm = vec![0u8; 320 * 2 * 2];
        AudioChunk::from_pcm16(&pcm, SampleRate::Hz16000, 0)
    }

    #[test]
    fn ignores_chunks_while_bot_is_silent() {
        let detector = BargeInDetector::new(Arc::new(VadEvaluator::new()), state());
        assert_eq!(detector.on_chunk(&loud_chunk()), BargeInOutcome::Continue);
    }

    #[test]
    fn two_consecutive_voiced_frames_preempt() {
        let detector = BargeInDetector::new(Arc::new(VadEvaluator::new()), state());
        detector.start_playback(Instant::now());
        assert_eq!(detector.on_chunk(&loud_chunk()), BargeInOutcome::Preempt);
    }

    #[test]
    fn expire_clears_bot_speaking_past_its_deadline() {
        let detector = BargeInDetector::new(Arc::new(VadEvaluator::new()), state());
        let now = Instant::now();
        detector.start_playback(now + std::time::Duration::from_millis(100));
        detector.expire(now);
        assert_eq!(detector.on_chunk(&loud_chunk()), BargeInOutcome::Preempt);

        detector.start_playback(now + std::time::Duration::from_millis(100));
        detector.expire(now + std::time::Duration::from_millis(150));
        assert_eq!(detector.on_chunk(&loud_chunk()), BargeInOutcome::Continue);
    }

    #[test]
    fn a_single_voiced_frame_followed_by_silence_does_not_preempt() {
        let detector = BargeInDetector::new(Arc::new(VadEvaluator::new()), state());
        detector.start_playback(Instant::now());
        // One loud frame then one silent frame in the same chunk: the streak
        // resets before reaching the two-frame threshold.
        let mut pcm: Vec<u8> = std::iter::repeat(i16::MAX.to_le_bytes())
            .take(320)
            .flatten()
            .collect();
        pcm.extend(std::iter::repeat(0u8).take(320 * 2));
        let chunk = AudioChunk::from_pcm16(&pcm, SampleRate::Hz16000, 0);
        assert_eq!(detector.on_chunk(&chunk), BargeInOutcome::Continue);
    }
}
