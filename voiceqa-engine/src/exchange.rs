use std::future::Future;
use std::sync::Arc;

use crate::playback::PlaybackCoordinator;
use crate::store::{Action, ConversationStore};
use crate::traits::QuestionAnswerer;
use voiceqa_core::chat::{ChatSession, Message, title_from_question};
use voiceqa_core::qa::{Answer, ExchangePhase, has_usable_sources};

pub const STAGE_GUIDANCE: &str = "guidance";
pub const STAGE_ASKING: &str = "asking";
pub const STAGE_ANSWERED: &str = "answered";
pub const STAGE_SPEAKING: &str = "speaking";
pub const STAGE_DONE: &str = "done";
pub const STAGE_FAILED: &str = "failed";

#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeResult {
    pub phase: ExchangePhase,
    pub answer: Option<Answer>,
    pub error: Option<String>,
    /// True when the guidance short-circuit answered without the backend.
    pub guidance: bool,
}

impl ExchangeResult {
    fn answered(answer: Answer) -> Self {
        Self {
            phase: ExchangePhase::Answered,
            answer: Some(answer),
            error: None,
            guidance: false,
        }
    }

    fn guidance(answer: Answer) -> Self {
        Self {
            phase: ExchangePhase::Answered,
            answer: Some(answer),
            error: None,
            guidance: true,
        }
    }

    fn errored(error: impl Into<String>) -> Self {
        Self {
            phase: ExchangePhase::Errored,
            answer: None,
            error: Some(error.into()),
            guidance: false,
        }
    }

    fn skipped() -> Self {
        Self {
            phase: ExchangePhase::Idle,
            answer: None,
            error: None,
            guidance: false,
        }
    }

    fn superseded(phase: ExchangePhase) -> Self {
        Self {
            phase,
            answer: None,
            error: None,
            guidance: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ExchangeConfig {
    /// Speak answers automatically when an exchange completes.
    pub auto_speak: bool,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self { auto_speak: true }
    }
}

/// Drives one question-answer exchange end to end: chat bookkeeping, the
/// no-sources guard, the ask call, store transitions, and answer playback.
pub struct ExchangeEngine {
    store: Arc<ConversationStore>,
    answerer: Arc<dyn QuestionAnswerer>,
    playback: Arc<PlaybackCoordinator>,
    cfg: ExchangeConfig,
}

impl ExchangeEngine {
    pub fn new(
        store: Arc<ConversationStore>,
        answerer: Arc<dyn QuestionAnswerer>,
        playback: Arc<PlaybackCoordinator>,
        cfg: ExchangeConfig,
    ) -> Self {
        Self {
            store,
            answerer,
            playback,
            cfg,
        }
    }

    pub async fn run(&self, question: &str, now_unix_ms: i64) -> ExchangeResult {
        self.run_with_hook(question, now_unix_ms, |_stage| async {})
            .await
    }

    /// Same as `run`, but emits a stage hook as the exchange progresses.
    ///
    /// The hook is intended for UI progress and must be fast.
    pub async fn run_with_hook<F, Fut>(
        &self,
        question: &str,
        now_unix_ms: i64,
        on_stage: F,
    ) -> ExchangeResult
    where
        F: Fn(&'static str) -> Fut,
        Fut: Future<Output = ()>,
    {
        let question = question.trim();
        if question.is_empty() {
            return ExchangeResult::skipped();
        }

        let snapshot = self.store.snapshot();
        let chat_id = match snapshot.current_chat_session() {
            Some(chat) => chat.id,
            None => {
                let chat = ChatSession::new(title_from_question(question), now_unix_ms);
                let id = chat.id;
                self.store.dispatch(Action::CreateChat(chat));
                id
            }
        };

        self.store.dispatch(Action::AppendMessage {
            chat: chat_id,
            message: Message::user(question, now_unix_ms),
        });

        // Guidance short-circuit: without extracted content the answering
        // backend is never contacted.
        if !has_usable_sources(&snapshot.sources) {
            on_stage(STAGE_GUIDANCE).await;

            let answer = Answer::guidance();
            let st = self.store.dispatch(Action::BeginExchange);
            self.store.dispatch(Action::CompleteExchange {
                token: st.exchange_token,
                answer: answer.clone(),
            });
            self.store.dispatch(Action::AppendMessage {
                chat: chat_id,
                message: Message::assistant(answer.text.clone(), now_unix_ms),
            });

            self.speak_answer(&answer, &on_stage).await;
            on_stage(STAGE_DONE).await;
            return ExchangeResult::guidance(answer);
        }

        let st = self.store.dispatch(Action::BeginExchange);
        let token = st.exchange_token;

        on_stage(STAGE_ASKING).await;
        match self
            .answerer
            .ask(question, snapshot.session_id.as_ref())
            .await
        {
            Ok(answer) => {
                let st = self.store.dispatch(Action::CompleteExchange {
                    token,
                    answer: answer.clone(),
                });

                if st.exchange_token != token || st.phase != ExchangePhase::Answered {
                    // A newer submission superseded this one while the call
                    // was in flight; its result is dropped, not misapplied.
                    log::debug!("discarding answer for superseded exchange {token}");
                    return ExchangeResult::superseded(st.phase);
                }

                self.store.dispatch(Action::AppendMessage {
                    chat: chat_id,
                    message: Message::assistant(answer.text.clone(), now_unix_ms),
                });
                on_stage(STAGE_ANSWERED).await;

                self.speak_answer(&answer, &on_stage).await;
                on_stage(STAGE_DONE).await;
                ExchangeResult::answered(answer)
            }
            Err(e) => {
                let message = e.to_string();
                self.store.dispatch(Action::FailExchange {
                    token,
                    error: message.clone(),
                });
                self.store
                    .dispatch(Action::SetNotice(Some(message.clone())));
                on_stage(STAGE_FAILED).await;
                ExchangeResult::errored(message)
            }
        }
    }

    async fn speak_answer<F, Fut>(&self, answer: &Answer, on_stage: &F)
    where
        F: Fn(&'static str) -> Fut,
        Fut: Future<Output = ()>,
    {
        if !self.cfg.auto_speak {
            return;
        }

        on_stage(STAGE_SPEAKING).await;
        let voice = self.store.snapshot().settings.voice_id;
        if let Err(e) = self.playback.speak(&answer.text, voice.as_deref()).await {
            // The coordinator already tried the local fallback; reaching this
            // branch means both paths failed.
            log::warn!("speech playback failed: {e}");
            self.store.dispatch(Action::SetNotice(Some(
                "Could not play the answer audio.".into(),
            )));
        }
    }
}
