//! WebRTC-style primary VAD detector (§4.1), wrapping the `webrtc-vad` crate.

use parking_lot::Mutex;
use voice_agent_config::constants::audio as audio_const;
use webrtc_vad::{SampleRate as WebRtcSampleRate, Vad, VadMode};

pub struct WebRtcVad {
    vad: Mutex<Vad>,
}

impl WebRtcVad {
    pub fn new(mode: u8) -> Self {
        let mut vad = Vad::new();
        vad.set_mode(mode_from_aggressiveness(mode));
        vad.set_sample_rate(WebRtcSampleRate::Rate16kHz);
        Self {
            vad: Mutex::new(vad),
        }
    }

    /// `None` means the primary detector raised (e.g. malformed frame
    /// length) and the caller should fall through to the energy fallback
    /// per §4.1.
    pub fn try_is_speech(&self, samples: &[f32]) -> Option<bool> {
        if samples.len() != audio_const::FRAME_SAMPLES {
            return None;
        }

        let samples_i16: Vec<i16> = samples
            .iter()
            .map(|&s| (s.clamp(-1.0, 1.0) * audio_const::PCM16_SCALE) as i16)
            .collect();

        self.vad.lock().is_voice_segment(&samples_i16).ok()
    }

    pub fn reset(&self) {
        let mut vad = Vad::new();
        vad.set_mode(mode_from_aggressiveness(audio_const::WEBRTC_VAD_MODE));
        vad.set_sample_rate(WebRtcSampleRate::Rate16kHz);
        *self.vad.lock() = vad;
    }
}

fn mode_from_aggressiveness(mode: u8) -> VadMode {
    match mode {
        0 => VadMode::Quality,
        1 => VadMode::LowBitrate,
        2 => VadMode::Aggressive,
        _ => VadMode::VeryAggressive,
    }
}
