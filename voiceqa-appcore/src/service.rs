use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use voiceqa_core::chat::{Author, ChatSession};
use voiceqa_core::types::ChatId;
use voiceqa_engine::exchange::{ExchangeConfig, ExchangeEngine, ExchangeResult};
use voiceqa_engine::playback::PlaybackCoordinator;
use voiceqa_engine::recording::RecordingCoordinator;
use voiceqa_engine::store::{Action, AppState, ConversationStore};
use voiceqa_engine::traits::{AudioSink, CaptureSource, ContentExtractor, LocalSynthesizer};
use voiceqa_providers::backend::validate_source_url;
use voiceqa_providers::parse::{HealthResponse, VoiceInfo};
use voiceqa_runtime::collaborators::BackendClient;
use voiceqa_runtime::state_store::{PersistedState, StateStore};

pub fn now_unix_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}

/// The application facade: owns the store, both coordinators, the backend
/// client, and the persistence path. UI layers talk to this and subscribe to
/// the store for state.
pub struct AppService {
    store: Arc<ConversationStore>,
    state_store: StateStore,
    backend: Arc<BackendClient>,
    recorder: RecordingCoordinator,
    playback: Arc<PlaybackCoordinator>,
    exchange: ExchangeEngine,
}

impl AppService {
    pub fn new(
        state_path: PathBuf,
        backend: Arc<BackendClient>,
        capture: Arc<dyn CaptureSource>,
        local_synth: Arc<dyn LocalSynthesizer>,
        sink: Arc<dyn AudioSink>,
    ) -> Self {
        let state_store = StateStore::at_path(state_path);

        // Restore durable UI state; an unreadable file starts a clean profile
        // instead of blocking startup.
        let persisted = state_store.load().unwrap_or_else(|e| {
            log::warn!("failed to load persisted state: {e}");
            PersistedState::default()
        });

        let store = Arc::new(ConversationStore::with_state(AppState {
            chats: persisted.chats,
            current_chat: persisted.current_chat,
            settings: persisted.settings,
            ..AppState::default()
        }));

        let playback = Arc::new(PlaybackCoordinator::new(
            backend.clone(),
            local_synth,
            sink,
        ));
        let recorder = RecordingCoordinator::new(store.clone(), capture, backend.clone());
        let exchange = ExchangeEngine::new(
            store.clone(),
            backend.clone(),
            playback.clone(),
            ExchangeConfig::default(),
        );

        Self {
            store,
            state_store,
            backend,
            recorder,
            playback,
            exchange,
        }
    }

    pub fn store(&self) -> Arc<ConversationStore> {
        self.store.clone()
    }

    pub fn snapshot(&self) -> AppState {
        self.store.snapshot()
    }

    /// Validates and registers a source URL, then re-extracts all registered
    /// sources. Rejected URLs never reach the backend.
    pub async fn add_source_url(&self, raw: &str) -> anyhow::Result<()> {
        let url = validate_source_url(raw)?;

        let before = self.store.snapshot().urls.len();
        let st = self.store.dispatch(Action::AddUrl(url.to_string()));
        if st.urls.len() == before {
            self.store.dispatch(Action::SetNotice(Some(
                "Source limit reached; remove one first.".into(),
            )));
            return Ok(());
        }

        self.extract_all().await;
        Ok(())
    }

    pub fn remove_source_url(&self, index: usize) {
        self.store.dispatch(Action::RemoveUrl(index));
    }

    pub async fn extract_all(&self) {
        let urls = self.store.snapshot().urls;
        if urls.is_empty() {
            return;
        }

        match self.backend.extract(&urls).await {
            Ok(extraction) => {
                let ok = extraction.sources.iter().filter(|s| s.success).count();
                let total = extraction.sources.len();
                self.store.dispatch(Action::SetSources(extraction.sources));
                if extraction.session_id.is_some() {
                    self.store
                        .dispatch(Action::SetSessionId(extraction.session_id));
                }
                self.store.dispatch(Action::SetNotice(Some(format!(
                    "Content extracted from {ok}/{total} sources."
                ))));
            }
            Err(e) => {
                log::warn!("content extraction failed: {e}");
                let message = e.to_string();
                self.store.dispatch(Action::SetError(Some(message.clone())));
                self.store.dispatch(Action::SetNotice(Some(message)));
            }
        }
    }

    /// Runs one question-answer exchange and persists the chat afterwards.
    pub async fn submit_question(&self, question: &str) -> ExchangeResult {
        let result = self.exchange.run(question, now_unix_ms()).await;
        self.persist();
        result
    }

    pub fn new_chat(&self) {
        self.store
            .dispatch(Action::CreateChat(ChatSession::new("New chat", now_unix_ms())));
        self.persist();
    }

    pub fn select_chat(&self, id: ChatId) {
        self.store.dispatch(Action::SelectChat(id));
        self.persist();
    }

    pub fn delete_chat(&self, id: ChatId) {
        self.store.dispatch(Action::DeleteChat(id));
        self.persist();
    }

    pub fn set_voice(&self, voice_id: Option<String>) {
        let mut settings = self.store.snapshot().settings;
        settings.voice_id = voice_id;
        self.store.dispatch(Action::SetVoiceSettings(settings));
        self.persist();
    }

    pub async fn start_recording(&self) {
        self.recorder.start_recording().await;
    }

    pub async fn stop_recording(&self) {
        self.recorder.stop_recording().await;
    }

    pub async fn speak(&self, text: &str) -> anyhow::Result<()> {
        let voice = self.store.snapshot().settings.voice_id;
        self.playback.speak(text, voice.as_deref()).await
    }

    pub async fn stop_speaking(&self) {
        self.playback.stop_speaking().await;
    }

    pub async fn voices(&self) -> anyhow::Result<Vec<VoiceInfo>> {
        self.backend.voices().await
    }

    pub async fn health(&self) -> anyhow::Result<HealthResponse> {
        self.backend.health().await
    }

    /// Best-effort save of the durable slice of the store.
    pub fn persist(&self) {
        let st = self.store.snapshot();
        let persisted = PersistedState {
            chats: st.chats,
            current_chat: st.current_chat,
            settings: st.settings,
        };
        if let Err(e) = self.state_store.save(&persisted) {
            log::warn!("failed to persist state: {e}");
        }
    }

    /// Watches the store for finalized voice questions and submits each one
    /// exactly once. A finalization whose text was already asked in the
    /// current chat is skipped, mirroring the duplicate guard on the typed
    /// path's message list.
    pub fn spawn_auto_submit(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let service = self.clone();
        // Subscribe before returning so no finalization dispatched after this
        // call can slip past the watcher.
        let mut rx = self.store.subscribe();
        let mut last_seq = rx.borrow().question_seq;

        tokio::spawn(async move {
            loop {
                if rx.changed().await.is_err() {
                    return;
                }

                let next = {
                    let st = rx.borrow_and_update();
                    match &st.finalized_question {
                        Some(f) if f.seq > last_seq => {
                            last_seq = f.seq;
                            Some((f.text.clone(), already_asked(&st, &f.text)))
                        }
                        _ => None,
                    }
                };

                let Some((question, duplicate)) = next else {
                    continue;
                };
                if duplicate {
                    log::debug!("skipping duplicate voice question: {question}");
                    continue;
                }

                let _ = service.submit_question(&question).await;
            }
        })
    }
}

fn already_asked(state: &AppState, question: &str) -> bool {
    state
        .current_chat_session()
        .map(|chat| {
            chat.messages
                .iter()
                .any(|m| m.author == Author::User && m.text == question)
        })
        .unwrap_or(false)
}
