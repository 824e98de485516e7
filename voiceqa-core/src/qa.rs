use crate::types::{ExtractedSource, SessionId};
use serde::{Deserialize, Serialize};

/// Canned answer used when no content has been extracted yet. Submissions in
/// that state never reach the answering backend.
pub const NO_SOURCES_GUIDANCE: &str = "Please add content sources from the sidebar to get \
accurate answers. I need web content to provide you with relevant information.";

/// Lifecycle of one question-answer exchange. Terminal states are per
/// exchange; the next submission starts over from `AwaitingAnswer`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExchangePhase {
    Idle,
    AwaitingAnswer,
    Answered,
    Errored,
}

impl Default for ExchangePhase {
    fn default() -> Self {
        Self::Idle
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<String>,
    pub session_id: Option<SessionId>,
    pub confidence: Option<f32>,
}

impl Answer {
    /// The short-circuit answer for submissions made before any content
    /// source was extracted.
    pub fn guidance() -> Self {
        Self {
            text: NO_SOURCES_GUIDANCE.into(),
            sources: Vec::new(),
            session_id: None,
            confidence: Some(0.0),
        }
    }
}

/// Guard for the ask path: at least one source must have extracted
/// successfully, otherwise the guidance short-circuit applies.
pub fn has_usable_sources(sources: &[ExtractedSource]) -> bool {
    sources.iter().any(|s| s.success)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(success: bool) -> ExtractedSource {
        ExtractedSource {
            url: "https://a.example".into(),
            title: "A".into(),
            content: "body".into(),
            success,
            error_message: None,
            word_count: 2,
        }
    }

    #[test]
    fn guidance_answer_has_no_sources() {
        let a = Answer::guidance();
        assert!(a.text.contains("content sources"));
        assert!(a.sources.is_empty());
        assert!(a.session_id.is_none());
    }

    #[test]
    fn sources_are_usable_only_when_one_succeeded() {
        assert!(!has_usable_sources(&[]));
        assert!(!has_usable_sources(&[source(false)]));
        assert!(has_usable_sources(&[source(false), source(true)]));
    }
}
