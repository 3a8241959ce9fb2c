//! HTTP-backed `TextToSpeech` (§6: `synthesise(text) -> {audio_bytes,
//! duration_sec}`), mirroring `voice-agent-llm`'s `HttpLanguageModel`: a
//! single bounded retry on a transient failure, immediate failure otherwise.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use voice_agent_core::error::AgentError;
use voice_agent_core::{Error, Result, TextToSpeech, TtsResult};

#[derive(Debug, Clone)]
pub struct HttpTtsConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub voice: String,
    pub timeout: Duration,
    pub retry_backoff: Duration,
}

impl Default for HttpTtsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9001".to_string(),
            api_key: None,
            voice: "default".to_string(),
            timeout: Duration::from_secs(15),
            retry_backoff: Duration::from_millis(250),
        }
    }
}

pub struct HttpTextToSpeech {
    client: Client,
    config: HttpTtsConfig,
}

impl HttpTextToSpeech {
    pub fn new(config: HttpTtsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Transient(format!("failed to build TTS HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    async fn execute(&self, text: &str) -> Result<SynthesisResponse> {
        let mut request = self
            .client
            .post(format!("{}/v1/audio/speech", self.config.base_url))
            .json(&SynthesisRequest {
                text: text.to_string(),
                voice: self.config.voice.clone(),
            });
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Transient(format!("TTS request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(if status.is_server_error() {
                Error::Transient(format!("TTS server error {status}: {body}"))
            } else {
                Error::Agent(AgentError::Adapter(format!(
                    "TTS request rejected ({status}): {body}"
                )))
            });
        }

        response
            .json::<SynthesisResponse>()
            .await
            .map_err(|e| Error::Transient(format!("malformed TTS response: {e}")))
    }
}

#[async_trait]
impl TextToSpeech for HttpTextToSpeech {
    async fn synthesize(&self, text: &str) -> Result<TtsResult> {
        match self.execute(text).await {
            Ok(response) => response.into_tts_result(),
            Err(Error::Transient(reason)) => {
                tracing::warn!(reason, "TTS request failed, retrying once after backoff");
                tokio::time::sleep(self.config.retry_backoff).await;
                self.execute(text).await.and_then(SynthesisResponse::into_tts_result)
            }
            Err(other) => Err(other),
        }
    }

    fn model_name(&self) -> &str {
        &self.config.voice
    }
}

#[derive(Debug, Serialize)]
struct SynthesisRequest {
    text: String,
    voice: String,
}

#[derive(Debug, Deserialize)]
struct SynthesisResponse {
    audio_base64: String,
    duration_sec: f32,
}

impl SynthesisResponse {
    fn into_tts_result(self) -> Result<TtsResult> {
        let audio_bytes = base64::engine::general_purpose::STANDARD
            .decode(&self.audio_base64)
            .map_err(|e| Error::Agent(AgentError::Adapter(format!("malformed TTS audio: {e}"))))?;
        Ok(TtsResult {
            audio_bytes,
            duration_sec: self.duration_sec,
        })
    }
}
