use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::store::{Action, ConversationStore};
use crate::traits::{AudioUploader, CaptureEvent, CaptureSource, CaptureStream};
use voiceqa_core::text::{accept_finalized_question, append_committed, join_committed_and_interim};

/// Owns the lifecycle of one recording session: the recognition stream, the
/// level meter, and the parallel fallback capture all arrive as events on a
/// single [`CaptureStream`], and this coordinator reconciles them into the
/// store's voice projection and finalized questions.
pub struct RecordingCoordinator {
    store: Arc<ConversationStore>,
    source: Arc<dyn CaptureSource>,
    uploader: Arc<dyn AudioUploader>,
    active: Mutex<Option<ActiveSession>>,
}

struct ActiveSession {
    stop: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl ActiveSession {
    async fn shutdown(self) {
        let _ = self.stop.try_send(());
        // Sources close their event stream on stop; aborting covers the ones
        // that don't. The fallback upload runs detached, so it survives this.
        self.task.abort();
        let _ = self.task.await;
    }
}

impl RecordingCoordinator {
    pub fn new(
        store: Arc<ConversationStore>,
        source: Arc<dyn CaptureSource>,
        uploader: Arc<dyn AudioUploader>,
    ) -> Self {
        Self {
            store,
            source,
            uploader,
            active: Mutex::new(None),
        }
    }

    /// Starts a recording session. A capability or permission failure is a
    /// user-facing no-op: it logs, posts a transient notice, and leaves the
    /// voice state untouched.
    pub async fn start_recording(&self) {
        let mut active = self.active.lock().await;

        // The microphone is an exclusive resource: starting again supersedes
        // any session still running.
        if let Some(prev) = active.take() {
            prev.shutdown().await;
        }

        let stream = match self.source.open().await {
            Ok(stream) => stream,
            Err(e) => {
                log::warn!("voice capture unavailable: {e}");
                self.store.dispatch(Action::SetNotice(Some(
                    "Voice input is unavailable right now.".into(),
                )));
                return;
            }
        };

        self.store.dispatch(Action::SetTranscript(String::new()));
        self.store.dispatch(Action::SetProcessing(false));
        self.store.dispatch(Action::SetRecording(true));

        let stop = stream.stop.clone();
        let task = tokio::spawn(run_session(
            self.store.clone(),
            self.uploader.clone(),
            stream,
        ));
        *active = Some(ActiveSession { stop, task });
    }

    /// Stops the session if one is active. Idempotent: the resets below apply
    /// either way, and the accumulated transcript is left for the caller to
    /// keep or discard.
    pub async fn stop_recording(&self) {
        let mut active = self.active.lock().await;
        if let Some(prev) = active.take() {
            prev.shutdown().await;
        }

        self.store.dispatch(Action::SetRecording(false));
        self.store.dispatch(Action::SetProcessing(false));
        self.store.dispatch(Action::SetAudioLevel(0.0));
    }
}

/// Session loop: a small state machine driven by discrete capture events.
/// Interim text only ever updates the live transcript; finalized text is
/// additionally published as the current question, exactly once per
/// finalization.
async fn run_session(
    store: Arc<ConversationStore>,
    uploader: Arc<dyn AudioUploader>,
    stream: CaptureStream,
) {
    let sample_rate_hz = stream.sample_rate_hz;
    let mut events = stream.events;

    let mut committed = String::new();
    let mut interim = String::new();
    let mut chunks: Vec<Vec<f32>> = Vec::new();

    while let Some(event) = events.recv().await {
        match event {
            CaptureEvent::Interim(text) => {
                interim = text;
                store.dispatch(Action::SetTranscript(join_committed_and_interim(
                    &committed, &interim,
                )));
            }
            CaptureEvent::Final(text) => {
                append_committed(&mut committed, &text);
                interim.clear();
                store.dispatch(Action::SetTranscript(committed.clone()));
                if let Some(question) = accept_finalized_question(committed.clone()) {
                    store.dispatch(Action::QuestionFinalized(question));
                }
            }
            CaptureEvent::Level(level) => {
                store.dispatch(Action::SetAudioLevel(level));
            }
            CaptureEvent::Audio(samples) => chunks.push(samples),
            CaptureEvent::RecognitionError(error) => {
                log::warn!("speech recognition failed mid-session: {error}");
                store.dispatch(Action::SetRecording(false));
                store.dispatch(Action::SetAudioLevel(0.0));

                if chunks.is_empty() {
                    // No parallel capture to fall back on: the session ends
                    // with no question produced.
                    store.dispatch(Action::SetNotice(Some(
                        "Voice recognition failed.".into(),
                    )));
                } else {
                    let samples: Vec<f32> = chunks.concat();
                    // Detached on purpose: stopping the recorder cancels the
                    // capture subscriptions, not a transcription already
                    // underway.
                    tokio::spawn(upload_fallback(
                        store.clone(),
                        uploader.clone(),
                        samples,
                        sample_rate_hz,
                    ));
                }
                return;
            }
            CaptureEvent::Ended => break,
        }
    }

    store.dispatch(Action::SetRecording(false));
    store.dispatch(Action::SetAudioLevel(0.0));
}

async fn upload_fallback(
    store: Arc<ConversationStore>,
    uploader: Arc<dyn AudioUploader>,
    samples: Vec<f32>,
    sample_rate_hz: u32,
) {
    store.dispatch(Action::SetProcessing(true));

    match uploader.transcribe(&samples, sample_rate_hz).await {
        Ok(text) => match accept_finalized_question(text) {
            Some(question) => {
                store.dispatch(Action::SetTranscript(question.clone()));
                store.dispatch(Action::QuestionFinalized(question));
            }
            None => log::warn!("fallback transcription returned no text"),
        },
        Err(e) => {
            log::warn!("fallback transcription failed: {e}");
            store.dispatch(Action::SetNotice(Some(
                "Could not transcribe the recording.".into(),
            )));
        }
    }

    store.dispatch(Action::SetProcessing(false));
}
