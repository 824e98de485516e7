use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use voiceqa_core::qa::Answer;
use voiceqa_core::types::{ExtractedSource, SessionId};

/// Result of a content extraction round.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub sources: Vec<ExtractedSource>,
    pub failed_urls: Vec<String>,
    pub session_id: Option<SessionId>,
}

/// Synthesized speech fetched from the backend, ready to hand to an audio
/// sink.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesizedSpeech {
    pub audio: Vec<u8>,
    pub duration_secs: Option<f32>,
}

#[async_trait]
pub trait ContentExtractor: Send + Sync {
    async fn extract(&self, urls: &[String]) -> anyhow::Result<Extraction>;
}

#[async_trait]
pub trait QuestionAnswerer: Send + Sync {
    async fn ask(&self, question: &str, session_id: Option<&SessionId>)
    -> anyhow::Result<Answer>;
}

#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: Option<&str>,
    ) -> anyhow::Result<SynthesizedSpeech>;
}

/// On-device fallback synthesis. `speak` resolves when the utterance ends;
/// `stop` cancels an in-flight utterance and is safe to call when idle.
#[async_trait]
pub trait LocalSynthesizer: Send + Sync {
    async fn speak(&self, text: &str) -> anyhow::Result<()>;
    async fn stop(&self);
}

/// Audio output channel. `play` resolves when playback ends (including when
/// it was ended by `stop`); `stop` is idempotent.
#[async_trait]
pub trait AudioSink: Send + Sync {
    async fn play(&self, audio: &[u8]) -> anyhow::Result<()>;
    async fn stop(&self);
}

/// Server-side re-transcription of fallback-recorded audio.
#[async_trait]
pub trait AudioUploader: Send + Sync {
    async fn transcribe(&self, samples: &[f32], sample_rate_hz: u32) -> anyhow::Result<String>;
}

/// Discrete events emitted by a capture source. The recording coordinator is
/// driven entirely by these, so any recognition backend (or a scripted test
/// sequence) can sit behind the trait.
#[derive(Debug, Clone, PartialEq)]
pub enum CaptureEvent {
    /// Revisable recognition text for the current utterance.
    Interim(String),
    /// A segment the recognition engine committed to.
    Final(String),
    /// Input level in 0.0..=1.0, advisory only.
    Level(f32),
    /// Raw samples captured in parallel for the upload fallback.
    Audio(Vec<f32>),
    /// Unrecoverable recognition failure; the session ends after this.
    RecognitionError(String),
    /// The source shut down on its own.
    Ended,
}

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("speech capture is not available on this device")]
    Unavailable,
    #[error("microphone permission denied")]
    PermissionDenied,
    #[error("capture failed: {0}")]
    Failed(String),
}

/// A live capture session. Dropping the `stop` sender (or sending on it)
/// tells the source to shut down; the source then closes `events`.
pub struct CaptureStream {
    pub sample_rate_hz: u32,
    pub events: mpsc::Receiver<CaptureEvent>,
    pub stop: mpsc::Sender<()>,
}

#[async_trait]
pub trait CaptureSource: Send + Sync {
    /// Opens the microphone and the recognition session. Models both the
    /// capability check and the permission grant: either failing returns an
    /// error and leaves nothing running.
    async fn open(&self) -> Result<CaptureStream, CaptureError>;
}
