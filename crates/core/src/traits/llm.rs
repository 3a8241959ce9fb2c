//! Language model adapter trait (§6).

use crate::asr::LlmMessage;
use crate::error::Result;
use async_trait::async_trait;

/// `reply(messages) -> text` per §6 — no extra metadata fields on the
/// messages; callers strip non-conforming keys before invoking this.
#[async_trait]
pub trait LanguageModel: Send + Sync + 'static {
    async fn reply(&self, messages: &[LlmMessage]) -> Result<String>;

    fn model_name(&self) -> &str;
}
