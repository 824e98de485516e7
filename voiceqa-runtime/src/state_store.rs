use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use voiceqa_core::chat::ChatSession;
use voiceqa_core::settings::VoiceSettings;
use voiceqa_core::types::ChatId;

/// Fixed storage key for durable UI state. Everything transient (recordings,
/// live voice status, in-flight exchanges) is excluded by construction.
pub const STATE_FILE_NAME: &str = "voice_qa_state.json";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub chats: Vec<ChatSession>,
    #[serde(default)]
    pub current_chat: Option<ChatId>,
    #[serde(default)]
    pub settings: VoiceSettings,
}

#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(STATE_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads persisted state; a missing file is a fresh profile, not an
    /// error.
    pub fn load(&self) -> anyhow::Result<PersistedState> {
        if !self.path.exists() {
            return Ok(PersistedState::default());
        }

        let bytes = fs::read(&self.path)
            .with_context(|| format!("read state: {}", self.path.display()))?;
        let state: PersistedState =
            serde_json::from_slice(&bytes).context("decode state JSON")?;
        Ok(state)
    }

    pub fn save(&self, state: &PersistedState) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(state).context("encode state JSON")?;
        if let Some(parent) = self.path.parent() {
            crate::fsutil::ensure_dir(parent)?;
        }

        // Atomic-ish write: write temp then replace.
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).with_context(|| format!("write temp: {}", tmp.display()))?;
        crate::fsutil::replace_file(&tmp, &self.path)
            .with_context(|| format!("replace file: {}", self.path.display()))?;
        Ok(())
    }
}
