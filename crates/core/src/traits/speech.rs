//! Speech adapter traits (§6, §9 "temporary files for ASR").
//!
//! The source writes a WAV file per turn; per §9 this passes the PCM buffer
//! directly instead, since the file was only ever an implementation
//! convenience, not part of the contract.

use crate::asr::{AsrResult, TtsResult};
use crate::error::Result;
use async_trait::async_trait;

/// `transcribe(pcm, use_vad_filter=false) -> {text, confidence, language}`.
#[async_trait]
pub trait SpeechToText: Send + Sync + 'static {
    /// `pcm` is the session's accumulated 16 kHz mono PCM16 turn buffer.
    async fn transcribe(&self, pcm: &[u8], use_vad_filter: bool) -> Result<AsrResult>;

    fn model_name(&self) -> &str;
}

/// `synthesise(text) -> {audio_bytes, duration_sec}`.
#[async_trait]
pub trait TextToSpeech: Send + Sync + 'static {
    async fn synthesize(&self, text: &str) -> Result<TtsResult>;

    fn model_name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockStt;

    #[async_trait]
    impl SpeechToText for MockStt {
        async fn transcribe(&self, _pcm: &[u8], _use_vad_filter: bool) -> Result<AsrResult> {
            Ok(AsrResult {
                text: "hello".into(),
                confidence: 0.95,
                language: Some("en".into()),
            })
        }

        fn model_name(&self) -> &str {
            "mock-stt"
        }
    }

    #[tokio::test]
    async fn mock_stt_transcribes() {
        let stt = MockStt;
        let result = stt.transcribe(&[], false).await.unwrap();
        assert_eq!(result.text, "hello");
    }
}
