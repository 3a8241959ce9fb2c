//! Confidence router (C5, §4.5).

use voice_agent_config::constants::router as router_const;
use voice_agent_core::InputQuality;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouterVerdict {
    Accept,
    /// `ACCEPT`, but the caller must not prompt a clarification even though
    /// confidence is middling.
    SoftAccept,
    Clarify,
    Reject,
}

impl RouterVerdict {
    pub fn passes_through(&self) -> bool {
        matches!(self, RouterVerdict::Accept | RouterVerdict::SoftAccept)
    }
}

/// Empty text always routes to `REJECT`, regardless of confidence.
pub fn route(text: &str, confidence: f32) -> RouterVerdict {
    if !text.chars().any(|c| c.is_alphanumeric()) {
        return RouterVerdict::Reject;
    }

    if confidence >= router_const::ACCEPT_THRESHOLD {
        RouterVerdict::Accept
    } else if confidence >= router_const::SOFT_ACCEPT_THRESHOLD {
        RouterVerdict::SoftAccept
    } else if confidence >= router_const::CLARIFY_THRESHOLD {
        RouterVerdict::Clarify
    } else {
        RouterVerdict::Reject
    }
}

/// Input-quality classification, computed from the same text/verdict the
/// router already produced: `EMPTY` if text has no alphanumeric content,
/// `UNCLEAR` if the router rejected non-empty text, `CLEAR` otherwise.
pub fn classify_input_quality(text: &str, verdict: RouterVerdict) -> InputQuality {
    if !text.chars().any(|c| c.is_alphanumeric()) {
        InputQuality::Empty
    } else if verdict == RouterVerdict::Reject {
        InputQuality::Unclear
    } else {
        InputQuality::Clear
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_confidence_accepts() {
        assert_eq!(route("book a loan", 0.95), RouterVerdict::Accept);
    }

    #[test]
    fn mid_confidence_soft_accepts() {
        assert_eq!(route("book a loan", 0.5), RouterVerdict::SoftAccept);
    }

    #[test]
    fn low_confidence_clarifies() {
        assert_eq!(route("book a loan", 0.25), RouterVerdict::Clarify);
    }

    #[test]
    fn very_low_confidence_rejects() {
        assert_eq!(route("book a loan", 0.1), RouterVerdict::Reject);
    }

    #[test]
    fn empty_text_always_rejects_even_at_high_confidence() {
        assert_eq!(route("   ", 0.99), RouterVerdict::Reject);
    }

    #[test]
    fn classify_input_quality_flags_empty_text() {
        let verdict = route("   ", 0.99);
        assert_eq!(classify_input_quality("   ", verdict), InputQuality::Empty);
    }

    #[test]
    fn classify_input_quality_flags_unclear_when_rejected() {
        let verdict = route("book a loan", 0.1);
        assert_eq!(
            classify_input_quality("book a loan", verdict),
            InputQuality::Unclear
        );
    }

    #[test]
    fn classify_input_quality_flags_clear_otherwise() {
        let verdict = route("book a loan", 0.95);
        assert_eq!(
            classify_input_quality("book a loan", verdict),
            InputQuality::Clear
        );
    }

    #[test]
    fn thresholds_are_boundary_inclusive() {
        assert_eq!(route("x", router_const::ACCEPT_THRESHOLD), RouterVerdict::Accept);
        assert_eq!(
            route("x", router_const::SOFT_ACCEPT_THRESHOLD),
            RouterVerdict::SoftAccept
        );
        assert_eq!(route("x", router_const::CLARIFY_THRESHOLD), RouterVerdict::Clarify);
    }
}
