//! A fixed-reply `LanguageModel` for local development and integration
//! tests where no real adapter endpoint is configured.

use async_trait::async_trait;
use voice_agent_core::{LanguageModel, LlmMessage, Result};

pub struct EchoLanguageModel {
    reply: String,
}

impl EchoLanguageModel {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

impl Default for EchoLanguageModel {
    fn default() -> Self {
        Self::new("I'm not sure I understood that, could you rephrase?")
    }
}

#[async_trait]
impl LanguageModel for EchoLanguageModel {
    async fn reply(&self, _messages: &[LlmMessage]) -> Result<String> {
        Ok(self.reply.clone())
    }

    fn model_name(&self) -> &str {
        "echo-mock"
    }
}
