//! Shared application state: configuration, the session store, the adapter
//! set handed to every new session actor, and the in-process registry of
//! live actors' inboxes.

use std::sync::Arc;

use voice_agent_agent::orchestrator::{SessionAdapters, SessionRegistry};
use voice_agent_config::Settings;
use voice_agent_core::{Result, SessionStore};
use voice_agent_llm::{EchoLanguageModel, HttpLanguageModel, HttpLlmConfig};

use crate::adapters::{
    HttpSpeechToText, HttpTextToSpeech, MockSpeechToText, MockTextToSpeech,
};
use crate::adapters::asr::HttpAsrConfig;
use crate::adapters::tts::HttpTtsConfig;
use crate::store::{InMemorySessionStore, RedisSessionStore};

#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub store: Arc<dyn SessionStore>,
    pub adapters: SessionAdapters,
    pub registry: SessionRegistry,
}

impl AppState {
    pub async fn build(settings: Settings) -> Result<Self> {
        let store: Arc<dyn SessionStore> = match settings.server.store_backend.as_str() {
            "redis" => Arc::new(RedisSessionStore::connect(&settings.redis.url()).await?),
            _ => Arc::new(InMemorySessionStore::new()),
        };

        let adapters = build_adapters(&settings)?;

        Ok(Self {
            settings,
            store,
            adapters,
            registry: SessionRegistry::new(),
        })
    }
}

/// Real HTTP adapters are used whenever a base URL is configured; otherwise
/// a fixed-response mock keeps local development and integration tests from
/// needing a live ASR/LLM/TTS endpoint.
fn build_adapters(settings: &Settings) -> Result<SessionAdapters> {
    let asr: Arc<dyn voice_agent_core::SpeechToText> = match &settings.adapters.asr_base_url {
        Some(base_url) => Arc::new(HttpSpeechToText::new(HttpAsrConfig {
            base_url: base_url.clone(),
            api_key: settings.adapters.asr_api_key.clone(),
            ..HttpAsrConfig::default()
        })?),
        None => Arc::new(MockSpeechToText::default()),
    };

    let llm: Arc<dyn voice_agent_core::LanguageModel> = match &settings.adapters.llm_base_url {
        Some(base_url) => Arc::new(HttpLanguageModel::new(HttpLlmConfig {
            base_url: base_url.clone(),
            api_key: settings.adapters.llm_api_key.clone(),
            ..HttpLlmConfig::default()
        })?),
        None => Arc::new(EchoLanguageModel::default()),
    };

    let tts: Arc<dyn voice_agent_core::TextToSpeech> = match &settings.adapters.tts_base_url {
        Some(base_url) => Arc::new(HttpTextToSpeech::new(HttpTtsConfig {
            base_url: base_url.clone(),
            api_key: settings.adapters.tts_api_key.clone(),
            ..HttpTtsConfig::default()
        })?),
        None => Arc::new(MockTextToSpeech::default()),
    };

    Ok(SessionAdapters { asr, llm, tts })
}
