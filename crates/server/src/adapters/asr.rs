//! HTTP-backed `SpeechToText` (§6: `transcribe(pcm, use_vad_filter=false) ->
//! {text, confidence, language}`, `confidence = exp(avg_logprob)`).
//!
//! The adapter wraps the session's raw PCM16 buffer in a minimal WAV
//! container before uploading it — multipart file upload is the lowest
//! common denominator across Whisper-style transcription services, and §9
//! only disclaims the *temporary file on disk*, not the wire format.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;

use voice_agent_config::constants::audio as audio_const;
use voice_agent_core::error::AgentError;
use voice_agent_core::{AsrResult, Error, Result, SpeechToText};

#[derive(Debug, Clone)]
pub struct HttpAsrConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
    pub retry_backoff: Duration,
}

impl Default for HttpAsrConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000".to_string(),
            api_key: None,
            model: "whisper-large-v3".to_string(),
            timeout: Duration::from_secs(15),
            retry_backoff: Duration::from_millis(250),
        }
    }
}

pub struct HttpSpeechToText {
    client: Client,
    config: HttpAsrConfig,
}

impl HttpSpeechToText {
    pub fn new(config: HttpAsrConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Transient(format!("failed to build ASR HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    async fn execute(&self, pcm: &[u8], use_vad_filter: bool) -> Result<TranscriptionResponse> {
        let wav = wrap_pcm16_as_wav(pcm);
        let part = Part::bytes(wav)
            .file_name("turn.wav")
            .mime_str("audio/wav")
            .map_err(|e| Error::Transient(format!("invalid ASR upload part: {e}")))?;
        let form = Form::new()
            .part("file", part)
            .text("model", self.config.model.clone())
            .text("vad_filter", use_vad_filter.to_string());

        let mut request = self
            .client
            .post(format!("{}/v1/audio/transcriptions", self.config.base_url))
            .multipart(form);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Transient(format!("ASR request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(if status.is_server_error() {
                Error::Transient(format!("ASR server error {status}: {body}"))
            } else {
                Error::Agent(AgentError::Adapter(format!(
                    "ASR request rejected ({status}): {body}"
                )))
            });
        }

        response
            .json::<TranscriptionResponse>()
            .await
            .map_err(|e| Error::Transient(format!("malformed ASR response: {e}")))
    }
}

#[async_trait]
impl SpeechToText for HttpSpeechToText {
    async fn transcribe(&self, pcm: &[u8], use_vad_filter: bool) -> Result<AsrResult> {
        match self.execute(pcm, use_vad_filter).await {
            Ok(response) => Ok(response.into_asr_result()),
            Err(Error::Transient(reason)) => {
                tracing::warn!(reason, "ASR request failed, retrying once after backoff");
                tokio::time::sleep(self.config.retry_backoff).await;
                self.execute(pcm, use_vad_filter)
                    .await
                    .map(TranscriptionResponse::into_asr_result)
            }
            Err(other) => Err(other),
        }
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
    avg_logprob: f32,
    #[serde(default)]
    language: Option<String>,
}

impl TranscriptionResponse {
    fn into_asr_result(self) -> AsrResult {
        AsrResult {
            text: self.text,
            confidence: self.avg_logprob.exp(),
            language: self.language,
        }
    }
}

/// 44-byte canonical PCM WAV header for 16-bit mono audio at the session's
/// fixed sample rate.
fn wrap_pcm16_as_wav(pcm: &[u8]) -> Vec<u8> {
    let sample_rate = audio_const::SAMPLE_RATE_HZ;
    let bits_per_sample: u16 = 16;
    let channels: u16 = 1;
    let byte_rate = sample_rate * u32::from(channels) * u32::from(bits_per_sample) / 8;
    let block_align = channels * bits_per_sample / 8;
    let data_len = pcm.len() as u32;

    let mut wav = Vec::with_capacity(44 + pcm.len());
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(36 + data_len).to_le_bytes());
    wav.extend_from_slice(b"WAVE");
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&bits_per_sample.to_le_bytes());
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_len.to_le_bytes());
    wav.extend_from_slice(pcm);
    wav
}
