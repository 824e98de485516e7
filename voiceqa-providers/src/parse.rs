use anyhow::{Context, anyhow};
use serde::Deserialize;
use voiceqa_core::types::ExtractedSource;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExtractionResponse {
    pub success: bool,
    pub extracted_content: Vec<ExtractedSource>,
    #[serde(default)]
    pub total_word_count: u64,
    #[serde(default)]
    pub failed_urls: Vec<String>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<String>,
    pub session_id: String,
    #[serde(default)]
    pub confidence: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TtsResponse {
    pub audio_url: String,
    #[serde(default)]
    pub duration: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadAudioResponse {
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VoiceInfo {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VoicesResponse {
    pub voices: Vec<VoiceInfo>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(default)]
    pub services: serde_json::Value,
}

pub fn parse_extraction(body: &[u8]) -> anyhow::Result<ExtractionResponse> {
    serde_json::from_slice(body).context("decode extraction JSON")
}

pub fn parse_answer(body: &[u8]) -> anyhow::Result<AnswerResponse> {
    let resp: AnswerResponse = serde_json::from_slice(body).context("decode answer JSON")?;
    if resp.answer.trim().is_empty() {
        return Err(anyhow!("empty answer in response"));
    }
    Ok(resp)
}

pub fn parse_tts(body: &[u8]) -> anyhow::Result<TtsResponse> {
    let resp: TtsResponse = serde_json::from_slice(body).context("decode TTS JSON")?;
    if resp.audio_url.trim().is_empty() {
        return Err(anyhow!("TTS response carried no audio URL"));
    }
    Ok(resp)
}

pub fn parse_upload_audio(body: &[u8]) -> anyhow::Result<UploadAudioResponse> {
    serde_json::from_slice(body).context("decode upload-audio JSON")
}

pub fn parse_voices(body: &[u8]) -> anyhow::Result<VoicesResponse> {
    serde_json::from_slice(body).context("decode voices JSON")
}

pub fn parse_health(body: &[u8]) -> anyhow::Result<HealthResponse> {
    serde_json::from_slice(body).context("decode health JSON")
}
