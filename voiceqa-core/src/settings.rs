use serde::{Deserialize, Serialize};

/// User-facing voice configuration, persisted across sessions.
///
/// `voice_id` is a provider-specific identifier passed through to the
/// text-to-speech backend unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VoiceSettings {
    #[serde(default)]
    pub voice_id: Option<String>,

    // Command line for on-device fallback synthesis (e.g. ["say"] on macOS,
    // ["espeak"] on Linux). The text to speak is appended as the final arg.
    #[serde(default)]
    pub local_synthesis_command: Vec<String>,
}
