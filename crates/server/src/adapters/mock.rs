//! Fixed-response ASR/TTS adapters for local development and tests, mirroring
//! `voice_agent_llm::EchoLanguageModel`.

use async_trait::async_trait;

use voice_agent_core::{AsrResult, Result, SpeechToText, TextToSpeech, TtsResult};

pub struct MockSpeechToText {
    text: String,
    confidence: f32,
}

impl MockSpeechToText {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence,
        }
    }
}

impl Default for MockSpeechToText {
    fn default() -> Self {
        Self::new("hello there", 0.95)
    }
}

#[async_trait]
impl SpeechToText for MockSpeechToText {
    async fn transcribe(&self, _pcm: &[u8], _use_vad_filter: bool) -> Result<AsrResult> {
        Ok(AsrResult {
            text: self.text.clone(),
            confidence: self.confidence,
            language: Some("en".to_string()),
        })
    }

    fn model_name(&self) -> &str {
        "mock-asr"
    }
}

pub struct MockTextToSpeech {
    duration_sec: f32,
}

impl MockTextToSpeech {
    pub fn new(duration_sec: f32) -> Self {
        Self { duration_sec }
    }
}

impl Default for MockTextToSpeech {
    fn default() -> Self {
        Self::new(1.0)
    }
}

#[async_trait]
impl TextToSpeech for MockTextToSpeech {
    async fn synthesize(&self, text: &str) -> Result<TtsResult> {
        Ok(TtsResult {
            audio_bytes: text.as_bytes().to_vec(),
            duration_sec: self.duration_sec,
        })
    }

    fn model_name(&self) -> &str {
        "mock-tts"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_asr_returns_configured_text() {
        let asr = MockSpeechToText::new("turn on the lights", 0.8);
        let result = asr.transcribe(&[], false).await.unwrap();
        assert_eq!(result.text, "turn on the lights");
        assert_eq!(result.confidence, 0.8);
    }

    #[tokio::test]
    async fn mock_tts_echoes_text_length_as_audio() {
        let tts = MockTextToSpeech::default();
        let result = tts.synthesize("hi").await.unwrap();
        assert_eq!(result.audio_bytes, b"hi");
    }
}
