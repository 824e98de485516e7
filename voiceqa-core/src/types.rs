use serde::{Deserialize, Serialize};
use uuid::Uuid;

// Source URLs are capped client-side; the backend rejects oversized batches anyway.
pub const MAX_SOURCE_URLS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatId(pub Uuid);

impl ChatId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Opaque backend session identifier returned by content extraction and
/// threaded through ask requests so answers stay grounded in the same content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One extracted web page, as reported by the extraction collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedSource {
    pub url: String,
    pub title: String,
    pub content: String,
    pub success: bool,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub word_count: u64,
}

/// Live projection of the current recording session, reset to defaults when
/// no session is active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceStatus {
    pub is_recording: bool,
    pub is_processing: bool,
    pub audio_level: f32,
    pub transcript: String,
}

impl Default for VoiceStatus {
    fn default() -> Self {
        Self {
            is_recording: false,
            is_processing: false,
            audio_level: 0.0,
            transcript: String::new(),
        }
    }
}
