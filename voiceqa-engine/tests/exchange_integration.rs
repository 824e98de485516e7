use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use voiceqa_core::chat::Author;
use voiceqa_core::qa::{Answer, ExchangePhase, NO_SOURCES_GUIDANCE};
use voiceqa_core::types::{ExtractedSource, SessionId};
use voiceqa_engine::exchange::{ExchangeConfig, ExchangeEngine};
use voiceqa_engine::playback::PlaybackCoordinator;
use voiceqa_engine::store::{Action, ConversationStore};
use voiceqa_engine::traits::{
    AudioSink, LocalSynthesizer, QuestionAnswerer, SpeechSynthesizer, SynthesizedSpeech,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Answerer wired through the real request builder, executor, and parser.
struct BackendAnswerer {
    base_url: String,
}

#[async_trait]
impl QuestionAnswerer for BackendAnswerer {
    async fn ask(
        &self,
        question: &str,
        session_id: Option<&SessionId>,
    ) -> anyhow::Result<Answer> {
        let req =
            voiceqa_providers::backend::build_ask_request(&self.base_url, question, session_id);
        let resp = voiceqa_providers::runtime::execute(&req).await?;
        voiceqa_providers::runtime::ensure_success(&resp)?;
        let parsed = voiceqa_providers::parse::parse_answer(&resp.body)?;
        Ok(Answer {
            text: parsed.answer,
            sources: parsed.sources,
            session_id: Some(SessionId::new(parsed.session_id)),
            confidence: parsed.confidence,
        })
    }
}

struct CannedSynth;

#[async_trait]
impl SpeechSynthesizer for CannedSynth {
    async fn synthesize(
        &self,
        _text: &str,
        _voice_id: Option<&str>,
    ) -> anyhow::Result<SynthesizedSpeech> {
        Ok(SynthesizedSpeech {
            audio: vec![0u8; 16],
            duration_secs: Some(0.1),
        })
    }
}

#[derive(Default)]
struct CountingSink {
    plays: Mutex<usize>,
}

#[async_trait]
impl AudioSink for CountingSink {
    async fn play(&self, _audio: &[u8]) -> anyhow::Result<()> {
        *self.plays.lock().unwrap() += 1;
        Ok(())
    }

    async fn stop(&self) {}
}

struct SilentLocal;

#[async_trait]
impl LocalSynthesizer for SilentLocal {
    async fn speak(&self, _text: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn stop(&self) {}
}

fn successful_source() -> ExtractedSource {
    ExtractedSource {
        url: "https://docs.example/ownership".into(),
        title: "Ownership".into(),
        content: "Ownership is a set of rules...".into(),
        success: true,
        error_message: None,
        word_count: 6,
    }
}

fn engine_against(
    base_url: &str,
    store: Arc<ConversationStore>,
    sink: Arc<CountingSink>,
) -> ExchangeEngine {
    let playback = Arc::new(PlaybackCoordinator::new(
        Arc::new(CannedSynth),
        Arc::new(SilentLocal),
        sink,
    ));
    ExchangeEngine::new(
        store,
        Arc::new(BackendAnswerer {
            base_url: base_url.to_string(),
        }),
        playback,
        ExchangeConfig::default(),
    )
}

#[tokio::test]
async fn answered_exchange_appends_messages_and_speaks() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/ask"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"answer":"Ownership is a set of rules.","sources":["https://docs.example/ownership"],"session_id":"s-1","confidence":0.9}"#,
            "application/json",
        ))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(ConversationStore::new());
    store.dispatch(Action::SetSources(vec![successful_source()]));
    store.dispatch(Action::SetSessionId(Some(SessionId::new("s-1"))));

    let sink = Arc::new(CountingSink::default());
    let engine = engine_against(&server.uri(), store.clone(), sink.clone());

    let result = engine.run("What is ownership?", 1_000).await;

    assert_eq!(result.phase, ExchangePhase::Answered);
    assert!(!result.guidance);
    let answer = result.answer.unwrap();
    assert_eq!(answer.text, "Ownership is a set of rules.");
    assert_eq!(answer.sources, vec!["https://docs.example/ownership"]);

    let state = store.snapshot();
    assert_eq!(state.phase, ExchangePhase::Answered);
    assert!(!state.is_loading);
    assert!(state.error.is_none());

    let chat = state.current_chat_session().expect("chat created");
    assert_eq!(chat.title, "What is ownership?");
    assert_eq!(chat.messages.len(), 2);
    assert_eq!(chat.messages[0].author, Author::User);
    assert_eq!(chat.messages[1].author, Author::Assistant);
    assert_eq!(chat.messages[1].text, "Ownership is a set of rules.");

    // The answer was spoken automatically.
    assert_eq!(*sink.plays.lock().unwrap(), 1);
}

#[tokio::test]
async fn guidance_short_circuit_never_calls_backend() {
    let server = MockServer::start().await;

    // Any hit on /api/ask fails the test when the server verifies on drop.
    Mock::given(method("POST"))
        .and(path("/api/ask"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let store = Arc::new(ConversationStore::new());
    let sink = Arc::new(CountingSink::default());
    let engine = engine_against(&server.uri(), store.clone(), sink.clone());

    let result = engine.run("hello", 2_000).await;

    assert_eq!(result.phase, ExchangePhase::Answered);
    assert!(result.guidance);
    let answer = result.answer.unwrap();
    assert_eq!(answer.text, NO_SOURCES_GUIDANCE);
    assert!(answer.sources.is_empty());

    let state = store.snapshot();
    let chat = state.current_chat_session().expect("chat created");
    assert_eq!(chat.messages.len(), 2);
    assert_eq!(chat.messages[1].text, NO_SOURCES_GUIDANCE);
}

#[tokio::test]
async fn failed_ask_marks_exchange_errored_without_assistant_message() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/ask"))
        .respond_with(ResponseTemplate::new(500).set_body_string("model overloaded"))
        .mount(&server)
        .await;

    let store = Arc::new(ConversationStore::new());
    store.dispatch(Action::SetSources(vec![successful_source()]));

    let sink = Arc::new(CountingSink::default());
    let engine = engine_against(&server.uri(), store.clone(), sink.clone());

    let result = engine.run("What is ownership?", 3_000).await;

    assert_eq!(result.phase, ExchangePhase::Errored);
    let error = result.error.unwrap();
    assert!(error.contains("500"));

    let state = store.snapshot();
    assert_eq!(state.phase, ExchangePhase::Errored);
    assert!(state.error.is_some());
    assert!(state.current_answer.is_none());

    // Only the user's own question made it into the transcript.
    let chat = state.current_chat_session().expect("chat created");
    assert_eq!(chat.messages.len(), 1);
    assert_eq!(chat.messages[0].author, Author::User);

    // Nothing was spoken.
    assert_eq!(*sink.plays.lock().unwrap(), 0);
}

#[tokio::test]
async fn blank_submission_is_skipped() {
    let server = MockServer::start().await;
    let store = Arc::new(ConversationStore::new());
    let sink = Arc::new(CountingSink::default());
    let engine = engine_against(&server.uri(), store.clone(), sink);

    let result = engine.run("   ", 4_000).await;
    assert_eq!(result.phase, ExchangePhase::Idle);
    assert!(store.snapshot().chats.is_empty());
}

#[tokio::test]
async fn empty_answer_body_is_a_boundary_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/ask"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"answer":"   ","sources":[],"session_id":"s-1"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let store = Arc::new(ConversationStore::new());
    store.dispatch(Action::SetSources(vec![successful_source()]));

    let sink = Arc::new(CountingSink::default());
    let engine = engine_against(&server.uri(), store.clone(), sink);

    let result = engine.run("What is ownership?", 5_000).await;
    assert_eq!(result.phase, ExchangePhase::Errored);
    assert!(result.error.unwrap().contains("empty answer"));
}
