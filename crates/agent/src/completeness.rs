//! Linguistic-completeness gate (§4.4): a fast rule-based pass, falling
//! back to a single bounded LLM call when the rules are ambiguous.

use std::sync::Arc;

use voice_agent_core::{LanguageModel, LlmMessage, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletenessVerdict {
    Complete,
    Incomplete,
}

const TRAILING_TRIGGERS: &[&str] = &[
    "and",
    "so",
    "but",
    "or",
    "because",
    "i want to",
    "i need to",
    "i'm trying to",
    "so basically",
    "…",
];

const QUESTION_WORDS: &[&str] = &["who", "what", "where", "when", "why", "how", "which"];

const HEDGES: &[&str] = &["um", "uh", "like", "you know", "kind of", "sort of"];

fn ends_with_word(lower: &str, suffix: &str) -> bool {
    if !lower.ends_with(suffix) {
        return false;
    }
    let prefix_len = lower.len() - suffix.len();
    prefix_len == 0 || !lower.as_bytes()[prefix_len - 1].is_ascii_alphanumeric()
}

/// Returns `Some` when the rules yield a confident verdict; `None` when the
/// text is ambiguous and should go to LLM arbitration.
fn rule_based_verdict(text: &str) -> Option<CompletenessVerdict> {
    let trimmed = text.trim();
    let lower = trimmed.to_lowercase();

    if trimmed.ends_with("...") || lower.ends_with('…') {
        return Some(CompletenessVerdict::Incomplete);
    }

    if TRAILING_TRIGGERS.iter().any(|t| ends_with_word(&lower, t)) {
        return Some(CompletenessVerdict::Incomplete);
    }

    let first_word = lower.split_whitespace().next().unwrap_or("");
    if QUESTION_WORDS.contains(&first_word) && !trimmed.ends_with('?') {
        return Some(CompletenessVerdict::Incomplete);
    }

    if HEDGES.iter().any(|h| lower.contains(h)) {
        return None;
    }

    Some(CompletenessVerdict::Complete)
}

/// Invoked from `PROCESSING` once the rule-based pass is ambiguous. Callers
/// MUST call `classify` at most once per turn, per §4.4's "bound to at most
/// one call per turn" rule — this gate does not itself track call counts.
#[derive(Clone)]
pub struct CompletenessGate {
    llm: Arc<dyn LanguageModel>,
}

impl CompletenessGate {
    pub fn new(llm: Arc<dyn LanguageModel>) -> Self {
        Self { llm }
    }

    pub async fn classify(&self, text: &str) -> Result<CompletenessVerdict> {
        if let Some(verdict) = rule_based_verdict(text) {
            return Ok(verdict);
        }

        let messages = [
            LlmMessage::system(
                "You judge whether a spoken utterance is a linguistically complete \
                 sentence. Answer with exactly one word: yes or no.",
            ),
            LlmMessage::user(format!("Utterance: \"{text}\"")),
        ];
        let reply = self.llm.reply(&messages).await?;
        let answer = reply.trim().to_lowercase();
        Ok(if answer.starts_with('y') {
            CompletenessVerdict::Complete
        } else {
            CompletenessVerdict::Incomplete
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct YesLlm;

    #[async_trait]
    impl LanguageModel for YesLlm {
        async fn reply(&self, _messages: &[LlmMessage]) -> Result<String> {
            Ok("yes".to_string())
        }

        fn model_name(&self) -> &str {
            "yes-llm"
        }
    }

    #[test]
    fn trailing_conjunction_is_incomplete() {
        assert_eq!(
            rule_based_verdict("I wanted to ask you and"),
            Some(CompletenessVerdict::Incomplete)
        );
    }

    #[test]
    fn trailing_ellipsis_is_incomplete() {
        assert_eq!(
            rule_based_verdict("let me think about it..."),
            Some(CompletenessVerdict::Incomplete)
        );
    }

    #[test]
    fn question_word_without_mark_is_incomplete() {
        assert_eq!(
            rule_based_verdict("what is the interest rate"),
            Some(CompletenessVerdict::Incomplete)
        );
    }

    #[test]
    fn question_word_with_mark_is_complete() {
        assert_eq!(
            rule_based_verdict("what is the interest rate?"),
            Some(CompletenessVerdict::Complete)
        );
    }

    #[test]
    fn plain_statement_is_complete() {
        assert_eq!(
            rule_based_verdict("I would like to apply for a loan"),
            Some(CompletenessVerdict::Complete)
        );
    }

    #[test]
    fn mid_sentence_hedge_is_ambiguous() {
        assert_eq!(rule_based_verdict("it's kind of a big deal"), None);
    }

    #[tokio::test]
    async fn ambiguous_text_falls_through_to_llm() {
        let gate = CompletenessGate::new(Arc::new(YesLlm));
        let verdict = gate.classify("it's kind of urgent").await.unwrap();
        assert_eq!(verdict, CompletenessVerdict::Complete);
    }
}
