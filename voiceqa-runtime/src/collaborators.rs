use async_trait::async_trait;
use voiceqa_core::qa::Answer;
use voiceqa_core::types::SessionId;
use voiceqa_engine::traits::{
    AudioUploader, ContentExtractor, Extraction, QuestionAnswerer, SpeechSynthesizer,
    SynthesizedSpeech,
};
use voiceqa_providers::parse::{HealthResponse, VoiceInfo};
use voiceqa_providers::request::HttpRequest;
use voiceqa_providers::{backend, parse, runtime};

/// All backend collaborators behind one base URL. Implements the engine's
/// extractor/answerer/synthesizer/uploader seams plus the voices and health
/// passthroughs.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn voices(&self) -> anyhow::Result<Vec<VoiceInfo>> {
        let body = send(&backend::build_voices_request(&self.base_url)).await?;
        Ok(parse::parse_voices(&body)?.voices)
    }

    pub async fn health(&self) -> anyhow::Result<HealthResponse> {
        let body = send(&backend::build_health_request(&self.base_url)).await?;
        parse::parse_health(&body)
    }
}

async fn send(req: &HttpRequest) -> anyhow::Result<Vec<u8>> {
    let resp = runtime::execute(req).await?;
    runtime::ensure_success(&resp)?;
    Ok(resp.body)
}

#[async_trait]
impl ContentExtractor for BackendClient {
    async fn extract(&self, urls: &[String]) -> anyhow::Result<Extraction> {
        let body = send(&backend::build_extract_request(&self.base_url, urls)).await?;
        let parsed = parse::parse_extraction(&body)?;
        Ok(Extraction {
            sources: parsed.extracted_content,
            failed_urls: parsed.failed_urls,
            session_id: parsed.session_id.map(SessionId::new),
        })
    }
}

#[async_trait]
impl QuestionAnswerer for BackendClient {
    async fn ask(
        &self,
        question: &str,
        session_id: Option<&SessionId>,
    ) -> anyhow::Result<Answer> {
        let body = send(&backend::build_ask_request(
            &self.base_url,
            question,
            session_id,
        ))
        .await?;
        let parsed = parse::parse_answer(&body)?;
        Ok(Answer {
            text: parsed.answer,
            sources: parsed.sources,
            session_id: Some(SessionId::new(parsed.session_id)),
            confidence: parsed.confidence,
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for BackendClient {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: Option<&str>,
    ) -> anyhow::Result<SynthesizedSpeech> {
        let body = send(&backend::build_tts_request(&self.base_url, text, voice_id)).await?;
        let parsed = parse::parse_tts(&body)?;

        // The synthesis endpoint returns a URL, not bytes; fetch them here so
        // callers get audio that is ready to play.
        let audio_url = backend::resolve_audio_url(&self.base_url, &parsed.audio_url)?;
        let audio = send(&backend::build_audio_fetch_request(&audio_url)).await?;

        Ok(SynthesizedSpeech {
            audio,
            duration_secs: parsed.duration,
        })
    }
}

#[async_trait]
impl AudioUploader for BackendClient {
    async fn transcribe(&self, samples: &[f32], sample_rate_hz: u32) -> anyhow::Result<String> {
        let wav = crate::audio::encode_wav_mono_f32le(samples, sample_rate_hz);
        let body = send(&backend::build_upload_audio_request(&self.base_url, &wav)).await?;
        Ok(parse::parse_upload_audio(&body)?.question)
    }
}
