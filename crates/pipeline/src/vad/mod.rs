//! Voice Activity Detection (C1, §4.1).
//!
//! Primary detector: WebRTC-style VAD at aggressiveness level 2. Fallback:
//! RMS energy gating, used when the primary detector errors and for any
//! sub-20ms tail.

mod energy;
mod webrtc;

use voice_agent_core::audio::{AudioChunk, FrameSplit};
use voice_agent_config::constants::audio as audio_const;

pub use energy::EnergyVad;
pub use webrtc::WebRtcVad;

/// Verdict classification per §4.1's ratio table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceClass {
    Voice,
    Uncertain,
    WeakSignal,
    Silence,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VadVerdict {
    pub classification: VoiceClass,
    pub p: f32,
}

impl VadVerdict {
    fn from_ratio(r: f32) -> Self {
        if r >= audio_const::RATIO_VOICE {
            VadVerdict {
                classification: VoiceClass::Voice,
                p: 1.0,
            }
        } else if r >= audio_const::RATIO_UNCERTAIN {
            VadVerdict {
                classification: VoiceClass::Uncertain,
                p: 0.5,
            }
        } else if r > 0.0 {
            VadVerdict {
                classification: VoiceClass::WeakSignal,
                p: 0.3,
            }
        } else {
            VadVerdict {
                classification: VoiceClass::Silence,
                p: 0.0,
            }
        }
    }
}

/// Per-frame primary-or-fallback detector.
trait FrameDetector: Send + Sync {
    /// `true` if the frame is classified as speech.
    fn is_speech(&self, samples: &[f32]) -> bool;
}

/// `VadEngine::evaluate` per SPEC_FULL §4.1 — stateless across calls apart
/// from the primary detector's opaque internal state.
pub trait VadEngine: Send + Sync {
    fn evaluate(&self, chunk: &AudioChunk) -> VadVerdict;
    fn reset(&self);
}

/// Combines the WebRTC primary detector with the RMS energy fallback.
pub struct VadEvaluator {
    primary: WebRtcVad,
    fallback: EnergyVad,
}

impl VadEvaluator {
    pub fn new() -> Self {
        Self {
            primary: WebRtcVad::new(audio_const::WEBRTC_VAD_MODE),
            fallback: EnergyVad::new(),
        }
    }
}

impl Default for VadEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl VadEngine for VadEvaluator {
    fn evaluate(&self, chunk: &AudioChunk) -> VadVerdict {
        if chunk.is_empty() {
            return VadVerdict {
                classification: VoiceClass::Silence,
                p: 0.0,
            };
        }

        let splits = chunk.split_into_frames();
        if splits.is_empty() {
            return VadVerdict {
                classification: VoiceClass::Silence,
                p: 0.0,
            };
        }

        // A chunk shorter than one frame is classified by the energy
        // fallback alone (§4.1).
        if splits.len() == 1 {
            if let FrameSplit::Tail(samples) = &splits[0] {
                let r = if self.fallback.is_speech(samples) {
                    1.0
                } else {
                    0.0
                };
                return VadVerdict::from_ratio(r);
            }
        }

        let mut speech_frames = 0usize;
        let mut total_frames = 0usize;

        for split in &splits {
            match split {
                FrameSplit::Frame(frame) => {
                    total_frames += 1;
                    let is_speech = match self.primary.try_is_speech(&frame.samples) {
                        Some(result) => result,
                        None => self.fallback.is_speech(&frame.samples),
                    };
                    if is_speech {
                        speech_frames += 1;
                    }
                }
                FrameSplit::Tail(samples) => {
                    // The tail counts toward the ratio via the fallback
                    // alone, same rule as a sub-frame chunk.
                    total_frames += 1;
                    if self.fallback.is_speech(samples) {
                        speech_frames += 1;
                    }
                }
            }
        }

        let r = speech_frames as f32 / total_frames as f32;
        VadVerdict::from_ratio(r)
    }

    fn reset(&self) {
        self.primary.reset();
    }
}

impl VadEvaluator {
    /// Per-frame voice probability used by the barge-in detector (§4.3),
    /// on the same 1.0/0.5/0.3/0.0 scale as the chunk-level verdict.
    pub fn frame_probability(&self, samples: &[f32]) -> f32 {
        match self.primary.try_is_speech(samples) {
            Some(true) => 1.0,
            Some(false) => 0.0,
            None => match self.fallback.classify(samples) {
                energy::EnergyBand::Clear => 1.0,
                energy::EnergyBand::Uncertain => 0.5,
                energy::EnergyBand::Weak => 0.3,
                energy::EnergyBand::Silence => 0.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voice_agent_core::audio::SampleRate;

    fn silence_pcm16(samples: usize) -> Vec<u8> {
        vec![0u8; samples * 2]
    }

    fn loud_pcm16(samples: usize) -> Vec<u8> {
        std::iter::repeat(i16::MAX.to_le_bytes())
            .take(samples)
            .flatten()
            .collect()
    }

    #[test]
    fn silence_chunk_is_classified_silence() {
        let vad = VadEvaluator::new();
        let pcm = silence_pcm16(320 * 4);
        let chunk = AudioChunk::from_pcm16(&pcm, SampleRate::Hz16000, 0);
        let verdict = vad.evaluate(&chunk);
        assert_eq!(verdict.classification, VoiceClass::Silence);
        assert_eq!(verdict.p, 0.0);
    }

    #[test]
    fn loud_chunk_is_classified_voice() {
        let vad = VadEvaluator::new();
        let pcm = loud_pcm16(320 * 4);
        let chunk = AudioChunk::from_pcm16(&pcm, SampleRate::Hz16000, 0);
        let verdict = vad.evaluate(&chunk);
        assert_eq!(verdict.classification, VoiceClass::Voice);
    }

    #[test]
    fn sub_frame_chunk_uses_energy_fallback() {
        let vad = VadEvaluator::new();
        let pcm = loud_pcm16(100);
        let chunk = AudioChunk::from_pcm16(&pcm, SampleRate::Hz16000, 0);
        let verdict = vad.evaluate(&chunk);
        assert_eq!(verdict.classification, VoiceClass::Voice);
    }
}
