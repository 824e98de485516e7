use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, watch};

use crate::traits::{AudioSink, LocalSynthesizer, SpeechSynthesizer};

/// Bound on the whole backend attempt: a fetch that is not playable within
/// this window is treated as failed and the local fallback takes over.
pub const BACKEND_AUDIO_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaybackSource {
    BackendAudio,
    LocalSynthesis,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlaybackState {
    Idle,
    Loading,
    Playing,
    Ended,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    pub source: Option<PlaybackSource>,
}

impl Default for PlaybackStatus {
    fn default() -> Self {
        Self {
            state: PlaybackState::Idle,
            source: None,
        }
    }
}

/// Guarantees at most one audible stream at a time: starting a new utterance
/// supersedes whatever was playing (the generation counter), and a superseded
/// attempt never runs its fallback.
pub struct PlaybackCoordinator {
    synth: Arc<dyn SpeechSynthesizer>,
    local: Arc<dyn LocalSynthesizer>,
    sink: Arc<dyn AudioSink>,
    generation: AtomicU64,
    // Serializes the supersede-and-stop entry section so two concurrent
    // `speak` calls cannot stop each other's fresh playback.
    start_lock: Mutex<()>,
    status_tx: watch::Sender<PlaybackStatus>,
}

impl PlaybackCoordinator {
    pub fn new(
        synth: Arc<dyn SpeechSynthesizer>,
        local: Arc<dyn LocalSynthesizer>,
        sink: Arc<dyn AudioSink>,
    ) -> Self {
        let (status_tx, _rx) = watch::channel(PlaybackStatus::default());
        Self {
            synth,
            local,
            sink,
            generation: AtomicU64::new(0),
            start_lock: Mutex::new(()),
            status_tx,
        }
    }

    pub fn subscribe_status(&self) -> watch::Receiver<PlaybackStatus> {
        self.status_tx.subscribe()
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn publish_if_current(&self, generation: u64, status: PlaybackStatus) {
        if self.is_current(generation) {
            self.status_tx.send_replace(status);
        }
    }

    /// Speaks `text`, preferring backend synthesis and falling back to local
    /// synthesis on any failure. Resolves when playback ends. Blank text is a
    /// no-op.
    pub async fn speak(&self, text: &str, voice_id: Option<&str>) -> anyhow::Result<()> {
        if text.trim().is_empty() {
            return Ok(());
        }

        let generation = {
            let _entry = self.start_lock.lock().await;
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            // Stop whatever is audible before this utterance starts.
            self.sink.stop().await;
            self.local.stop().await;
            generation
        };

        self.publish_if_current(
            generation,
            PlaybackStatus {
                state: PlaybackState::Loading,
                source: Some(PlaybackSource::BackendAudio),
            },
        );

        let backend_audio = match tokio::time::timeout(
            BACKEND_AUDIO_TIMEOUT,
            self.synth.synthesize(text, voice_id),
        )
        .await
        {
            Ok(Ok(speech)) if !speech.audio.is_empty() => Some(speech.audio),
            Ok(Ok(_)) => {
                log::warn!("backend synthesis returned no audio");
                None
            }
            Ok(Err(e)) => {
                log::warn!("backend synthesis failed: {e}");
                None
            }
            Err(_) => {
                log::warn!(
                    "backend synthesis not playable within {}s",
                    BACKEND_AUDIO_TIMEOUT.as_secs()
                );
                None
            }
        };

        if !self.is_current(generation) {
            // Superseded while loading; the newer call owns the output now.
            return Ok(());
        }

        if let Some(audio) = backend_audio {
            self.publish_if_current(
                generation,
                PlaybackStatus {
                    state: PlaybackState::Playing,
                    source: Some(PlaybackSource::BackendAudio),
                },
            );

            match self.sink.play(&audio).await {
                Ok(()) => {
                    self.publish_if_current(
                        generation,
                        PlaybackStatus {
                            state: PlaybackState::Ended,
                            source: Some(PlaybackSource::BackendAudio),
                        },
                    );
                    return Ok(());
                }
                Err(e) => {
                    log::warn!("audio playback failed: {e}");
                    if !self.is_current(generation) {
                        return Ok(());
                    }
                }
            }
        }

        // Local fallback speaks the same text.
        self.publish_if_current(
            generation,
            PlaybackStatus {
                state: PlaybackState::Playing,
                source: Some(PlaybackSource::LocalSynthesis),
            },
        );

        match self.local.speak(text).await {
            Ok(()) => {
                self.publish_if_current(
                    generation,
                    PlaybackStatus {
                        state: PlaybackState::Ended,
                        source: Some(PlaybackSource::LocalSynthesis),
                    },
                );
                Ok(())
            }
            Err(e) => {
                self.publish_if_current(
                    generation,
                    PlaybackStatus {
                        state: PlaybackState::Failed,
                        source: Some(PlaybackSource::LocalSynthesis),
                    },
                );
                Err(e)
            }
        }
    }

    /// Halts backend audio and cancels any in-flight local utterance. Safe to
    /// call at any time, any number of times.
    pub async fn stop_speaking(&self) {
        let _entry = self.start_lock.lock().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.sink.stop().await;
        self.local.stop().await;
        self.status_tx.send_replace(PlaybackStatus::default());
    }
}
