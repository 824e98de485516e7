use std::sync::Mutex;

use tokio::sync::watch;
use voiceqa_core::chat::{ChatSession, Message};
use voiceqa_core::qa::{Answer, ExchangePhase};
use voiceqa_core::settings::VoiceSettings;
use voiceqa_core::types::{ChatId, ExtractedSource, MAX_SOURCE_URLS, SessionId, VoiceStatus};

/// A finalized voice question. The sequence number distinguishes repeated
/// finalizations of identical text, so the auto-submit watcher consumes each
/// exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedQuestion {
    pub seq: u64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub urls: Vec<String>,
    pub sources: Vec<ExtractedSource>,
    pub session_id: Option<SessionId>,

    pub chats: Vec<ChatSession>,
    pub current_chat: Option<ChatId>,

    pub phase: ExchangePhase,
    /// Generation token of the newest exchange. Completions carrying an older
    /// token are discarded, so a late answer from a superseded question never
    /// lands in the wrong exchange.
    pub exchange_token: u64,
    pub current_answer: Option<Answer>,

    pub question_seq: u64,
    pub finalized_question: Option<FinalizedQuestion>,

    pub is_loading: bool,
    pub error: Option<String>,
    pub notice: Option<String>,

    pub voice: VoiceStatus,
    pub settings: VoiceSettings,
}

impl AppState {
    pub fn current_chat_session(&self) -> Option<&ChatSession> {
        let id = self.current_chat?;
        self.chats.iter().find(|c| c.id == id)
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    AddUrl(String),
    RemoveUrl(usize),
    ClearUrls,
    SetSources(Vec<ExtractedSource>),
    SetSessionId(Option<SessionId>),

    CreateChat(ChatSession),
    SelectChat(ChatId),
    DeleteChat(ChatId),
    AppendMessage { chat: ChatId, message: Message },

    BeginExchange,
    CompleteExchange { token: u64, answer: Answer },
    FailExchange { token: u64, error: String },

    QuestionFinalized(String),
    SetTranscript(String),
    SetAudioLevel(f32),
    SetRecording(bool),
    SetProcessing(bool),

    SetVoiceSettings(VoiceSettings),
    SetNotice(Option<String>),
    SetError(Option<String>),
    Reset,
}

/// The shared state container. Every mutation goes through `dispatch`, which
/// applies actions synchronously in call order under one lock, so the store
/// has a single-writer discipline by construction and `watch` subscribers
/// observe snapshots in the same order.
pub struct ConversationStore {
    state: Mutex<AppState>,
    tx: watch::Sender<AppState>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::with_state(AppState::default())
    }

    pub fn with_state(state: AppState) -> Self {
        let (tx, _rx) = watch::channel(state.clone());
        Self {
            state: Mutex::new(state),
            tx,
        }
    }

    /// Applies the action and returns the resulting snapshot.
    pub fn dispatch(&self, action: Action) -> AppState {
        let mut state = self.state.lock().expect("store lock");
        apply(&mut state, action);
        let snapshot = state.clone();
        // Publish while still holding the lock so subscribers observe
        // snapshots in dispatch order.
        self.tx.send_replace(snapshot.clone());
        snapshot
    }

    pub fn subscribe(&self) -> watch::Receiver<AppState> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> AppState {
        self.state.lock().expect("store lock").clone()
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

fn apply(state: &mut AppState, action: Action) {
    match action {
        Action::AddUrl(url) => {
            if state.urls.len() < MAX_SOURCE_URLS {
                state.urls.push(url);
            }
        }
        Action::RemoveUrl(index) => {
            if index < state.urls.len() {
                state.urls.remove(index);
            }
        }
        Action::ClearUrls => state.urls.clear(),
        Action::SetSources(sources) => state.sources = sources,
        Action::SetSessionId(session_id) => state.session_id = session_id,

        Action::CreateChat(chat) => {
            state.current_chat = Some(chat.id);
            state.chats.push(chat);
        }
        Action::SelectChat(id) => {
            if state.chats.iter().any(|c| c.id == id) {
                state.current_chat = Some(id);
            }
        }
        Action::DeleteChat(id) => {
            state.chats.retain(|c| c.id != id);
            if state.current_chat == Some(id) {
                state.current_chat = None;
            }
        }
        Action::AppendMessage { chat, message } => {
            if let Some(session) = state.chats.iter_mut().find(|c| c.id == chat) {
                session.push(message);
            }
        }

        Action::BeginExchange => {
            state.exchange_token += 1;
            state.phase = ExchangePhase::AwaitingAnswer;
            state.is_loading = true;
            state.error = None;
            state.current_answer = None;
        }
        Action::CompleteExchange { token, answer } => {
            if token == state.exchange_token && state.phase == ExchangePhase::AwaitingAnswer {
                state.phase = ExchangePhase::Answered;
                state.current_answer = Some(answer);
                state.is_loading = false;
            }
        }
        Action::FailExchange { token, error } => {
            if token == state.exchange_token && state.phase == ExchangePhase::AwaitingAnswer {
                state.phase = ExchangePhase::Errored;
                state.error = Some(error);
                state.is_loading = false;
            }
        }

        Action::QuestionFinalized(text) => {
            state.question_seq += 1;
            state.finalized_question = Some(FinalizedQuestion {
                seq: state.question_seq,
                text,
            });
        }
        Action::SetTranscript(transcript) => state.voice.transcript = transcript,
        Action::SetAudioLevel(level) => state.voice.audio_level = level.clamp(0.0, 1.0),
        Action::SetRecording(recording) => state.voice.is_recording = recording,
        Action::SetProcessing(processing) => state.voice.is_processing = processing,

        Action::SetVoiceSettings(settings) => state.settings = settings,
        Action::SetNotice(notice) => state.notice = notice,
        Action::SetError(error) => state.error = error,
        Action::Reset => *state = AppState::default(),
    }
}
