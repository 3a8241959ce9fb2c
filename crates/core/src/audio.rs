//! Audio frame types and PCM16 conversion
//!
//! The wire format is fixed by §6 of the spec: 16-bit signed, little-endian,
//! 16 kHz, mono. The canonical VAD frame is 20 ms (320 samples / 640 bytes).

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// PCM16 sample -> f32 normalization constant.
pub const PCM16_NORMALIZE: f32 = 32768.0;
/// f32 -> PCM16 sample scaling constant.
pub const PCM16_SCALE: f32 = 32767.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SampleRate {
    #[default]
    Hz16000,
}

impl SampleRate {
    pub fn as_u32(&self) -> u32 {
        match self {
            SampleRate::Hz16000 => 16000,
        }
    }

    /// Number of samples in a 20 ms frame at this rate.
    pub fn frame_len_20ms(&self) -> usize {
        (self.as_u32() as usize * 20) / 1000
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Channels {
    #[default]
    Mono,
}

impl Channels {
    pub fn count(&self) -> usize {
        1
    }
}

/// A single fixed-duration (nominally 20 ms) frame fed to the VAD.
#[derive(Clone)]
pub struct AudioFrame {
    pub samples: Arc<[f32]>,
    pub sample_rate: SampleRate,
    pub channels: Channels,
    pub sequence: u64,
    pub timestamp: Instant,
    pub duration: Duration,
    pub energy_db: f32,
}

impl std::fmt::Debug for AudioFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioFrame")
            .field("samples_len", &self.samples.len())
            .field("sequence", &self.sequence)
            .field("duration", &self.duration)
            .field("energy_db", &self.energy_db)
            .finish()
    }
}

impl AudioFrame {
    pub fn new(samples: Vec<f32>, sample_rate: SampleRate, sequence: u64) -> Self {
        let duration = Duration::from_secs_f64(samples.len() as f64 / sample_rate.as_u32() as f64);
        let energy_db = calculate_energy_db(&samples);

        Self {
            samples: samples.into(),
            sample_rate,
            channels: Channels::Mono,
            sequence,
            timestamp: Instant::now(),
            duration,
            energy_db,
        }
    }

    pub fn with_timestamp(
        samples: Vec<f32>,
        sample_rate: SampleRate,
        sequence: u64,
        timestamp: Instant,
    ) -> Self {
        let mut frame = Self::new(samples, sample_rate, sequence);
        frame.timestamp = timestamp;
        frame
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration.as_millis() as u64
    }

    /// Normalised RMS magnitude in [0, 1], used by the energy-gating fallback.
    pub fn rms_magnitude(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        let sum_squares: f32 = self.samples.iter().map(|s| s * s).sum();
        (sum_squares / self.samples.len() as f32).sqrt()
    }

    pub fn to_pcm16(&self) -> Vec<u8> {
        self.samples
            .iter()
            .flat_map(|&sample| {
                let clamped = sample.clamp(-1.0, 1.0);
                let pcm16 = (clamped * PCM16_SCALE) as i16;
                pcm16.to_le_bytes()
            })
            .collect()
    }
}

fn calculate_energy_db(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return -96.0;
    }
    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    let rms = (sum_squares / samples.len() as f32).sqrt();
    if rms > 0.0 {
        20.0 * rms.log10()
    } else {
        -96.0
    }
}

fn pcm16_to_f32(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|chunk| {
            let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
            sample as f32 / PCM16_NORMALIZE
        })
        .collect()
}

/// Outcome of splitting a network chunk into canonical frames: every element
/// but (at most) the last is a full 20 ms `Frame`; a residual shorter than
/// one frame is yielded as `Tail` and must go through the energy fallback.
#[derive(Debug, Clone)]
pub enum FrameSplit {
    Frame(AudioFrame),
    Tail(Vec<f32>),
}

/// A raw chunk as it arrives off the transport: nominally ~200 ms, but any
/// multiple of 20 ms is accepted, and shorter tails are tolerated.
#[derive(Clone)]
pub struct AudioChunk {
    pub samples: Arc<[f32]>,
    pub sample_rate: SampleRate,
    pub sequence: u64,
    pub received_at: Instant,
}

impl AudioChunk {
    pub fn from_pcm16(bytes: &[u8], sample_rate: SampleRate, sequence: u64) -> Self {
        Self {
            samples: pcm16_to_f32(bytes).into(),
            sample_rate,
            sequence,
            received_at: Instant::now(),
        }
    }

    pub fn duration_ms(&self) -> u64 {
        (self.samples.len() as u64 * 1000) / self.sample_rate.as_u32() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Split into 20 ms frames, leaving any sub-frame residual as a `Tail`.
    pub fn split_into_frames(&self) -> Vec<FrameSplit> {
        let frame_len = self.sample_rate.frame_len_20ms();
        let mut out = Vec::new();
        let mut seq = self.sequence;

        for chunk in self.samples.chunks(frame_len) {
            if chunk.len() == frame_len {
                out.push(FrameSplit::Frame(AudioFrame::with_timestamp(
                    chunk.to_vec(),
                    self.sample_rate,
                    seq,
                    self.received_at,
                )));
            } else {
                out.push(FrameSplit::Tail(chunk.to_vec()));
            }
            seq += 1;
        }

        out
    }
}

/// Accumulates the PCM for the current user turn. Cleared on `TURN_END`.
#[derive(Debug, Default)]
pub struct AudioBuffer {
    samples: Vec<f32>,
    sample_rate: SampleRate,
}

impl AudioBuffer {
    pub fn new(sample_rate: SampleRate) -> Self {
        Self {
            samples: Vec::new(),
            sample_rate,
        }
    }

    pub fn push_chunk(&mut self, chunk: &AudioChunk) {
        self.samples.extend(chunk.samples.iter());
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.samples.len() as f64 / self.sample_rate.as_u32() as f64)
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn to_pcm16(&self) -> Vec<u8> {
        self.samples
            .iter()
            .flat_map(|&sample| {
                let clamped = sample.clamp(-1.0, 1.0);
                let pcm16 = (clamped * PCM16_SCALE) as i16;
                pcm16.to_le_bytes()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_len_is_320_samples_at_16khz() {
        assert_eq!(SampleRate::Hz16000.frame_len_20ms(), 320);
    }

    #[test]
    fn from_pcm16_round_trips_sign() {
        let pcm16: Vec<u8> = vec![0x00, 0x40, 0x00, 0xC0];
        let chunk = AudioChunk::from_pcm16(&pcm16, SampleRate::Hz16000, 0);
        assert_eq!(chunk.samples.len(), 2);
        assert!(chunk.samples[0] > 0.0);
        assert!(chunk.samples[1] < 0.0);
    }

    #[test]
    fn split_into_frames_yields_tail_for_residual() {
        // 640 samples (two full 20ms frames) + 100 sample residual.
        let samples = vec![0.1f32; 320 * 2 + 100];
        let pcm: Vec<u8> = samples
            .iter()
            .flat_map(|&s| ((s * PCM16_SCALE) as i16).to_le_bytes())
            .collect();
        let chunk = AudioChunk::from_pcm16(&pcm, SampleRate::Hz16000, 0);
        let split = chunk.split_into_frames();

        assert_eq!(split.len(), 3);
        assert!(matches!(split[0], FrameSplit::Frame(_)));
        assert!(matches!(split[1], FrameSplit::Frame(_)));
        assert!(matches!(split[2], FrameSplit::Tail(_)));
    }

    #[test]
    fn energy_db_is_low_for_silence() {
        let frame = AudioFrame::new(vec![0.0; 320], SampleRate::Hz16000, 0);
        assert!(frame.energy_db < -90.0);
    }

    #[test]
    fn audio_buffer_accumulates_and_clears() {
        let pcm: Vec<u8> = std::iter::repeat([0x00u8, 0x10u8])
            .take(320)
            .flatten()
            .collect();
        let chunk = AudioChunk::from_pcm16(&pcm, SampleRate::Hz16000, 0);
        let mut buf = AudioBuffer::new(SampleRate::Hz16000);
        buf.push_chunk(&chunk);
        assert!(!buf.is_empty());
        buf.clear();
        assert!(buf.is_empty());
    }
}
