//! HTTP-backed `LanguageModel` adapter (§6 "LLM adapter": `reply(messages)
//! -> text`), talking to an OpenAI-compatible chat-completions endpoint.
//!
//! A request that fails with a server error or network error is retried
//! exactly once after a fixed backoff (§7 "transient adapter failure");
//! anything else (4xx, malformed response) fails immediately.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use voice_agent_core::error::AgentError;
use voice_agent_core::{Error, LanguageModel, LlmMessage, Result, Role};

#[derive(Debug, Clone)]
pub struct HttpLlmConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub model: String,
    pub timeout: Duration,
    pub retry_backoff: Duration,
}

impl Default for HttpLlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            api_key: None,
            model: "llama-3.1-8b-instruct".to_string(),
            timeout: Duration::from_secs(10),
            retry_backoff: Duration::from_millis(250),
        }
    }
}

pub struct HttpLanguageModel {
    client: Client,
    config: HttpLlmConfig,
}

impl HttpLanguageModel {
    pub fn new(config: HttpLlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Transient(format!("failed to build LLM HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.config.base_url)
    }

    async fn execute(&self, messages: &[ChatMessage]) -> Result<ChatResponse> {
        let mut request = self.client.post(self.endpoint()).json(&ChatRequest {
            model: self.config.model.clone(),
            messages: messages.to_vec(),
        });
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::Transient(format!("LLM request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(if status.is_server_error() {
                Error::Transient(format!("LLM server error {status}: {body}"))
            } else {
                Error::Agent(AgentError::Adapter(format!(
                    "LLM request rejected ({status}): {body}"
                )))
            });
        }

        response
            .json::<ChatResponse>()
            .await
            .map_err(|e| Error::Transient(format!("malformed LLM response: {e}")))
    }
}

#[async_trait]
impl LanguageModel for HttpLanguageModel {
    async fn reply(&self, messages: &[LlmMessage]) -> Result<String> {
        let chat_messages: Vec<ChatMessage> = messages.iter().map(ChatMessage::from).collect();

        match self.execute(&chat_messages).await {
            Ok(response) => Ok(response.into_text()),
            Err(Error::Transient(reason)) => {
                tracing::warn!(reason, "LLM call failed, retrying once after backoff");
                tokio::time::sleep(self.config.retry_backoff).await;
                self.execute(&chat_messages).await.map(|r| r.into_text())
            }
            Err(other) => Err(other),
        }
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

impl From<&LlmMessage> for ChatMessage {
    fn from(msg: &LlmMessage) -> Self {
        let role = match msg.role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        };
        Self {
            role: role.to_string(),
            content: msg.content.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl ChatResponse {
    fn into_text(mut self) -> String {
        if self.choices.is_empty() {
            return String::new();
        }
        self.choices.remove(0).message.content
    }
}
