use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;
use voiceqa_engine::traits::{CaptureError, CaptureEvent, CaptureSource, CaptureStream};

/// Capture source for environments without a microphone or recognition
/// engine. `start_recording` against it degrades to a logged no-op.
#[derive(Debug, Default)]
pub struct UnavailableCapture;

#[async_trait]
impl CaptureSource for UnavailableCapture {
    async fn open(&self) -> Result<CaptureStream, CaptureError> {
        Err(CaptureError::Unavailable)
    }
}

/// Replays a fixed event script as if a user were speaking, pacing events a
/// few tens of milliseconds apart. Used by the demo CLI and by tests that
/// drive the recording coordinator end to end.
#[derive(Debug, Clone)]
pub struct ScriptedCapture {
    events: Vec<CaptureEvent>,
}

impl ScriptedCapture {
    pub fn new(events: Vec<CaptureEvent>) -> Self {
        Self { events }
    }

    /// A script that speaks `text` as interim updates and then finalizes it.
    pub fn utterance(text: &str) -> Self {
        let words: Vec<&str> = text.split_whitespace().collect();
        let mut events = Vec::new();
        for i in 1..=words.len() {
            events.push(CaptureEvent::Interim(words[..i].join(" ")));
            events.push(CaptureEvent::Level(0.3 + 0.1 * (i % 3) as f32));
        }
        events.push(CaptureEvent::Final(text.to_string()));
        events.push(CaptureEvent::Ended);
        Self { events }
    }
}

#[async_trait]
impl CaptureSource for ScriptedCapture {
    async fn open(&self) -> Result<CaptureStream, CaptureError> {
        let (evt_tx, evt_rx) = mpsc::channel(64);
        let (stop_tx, mut stop_rx) = mpsc::channel(1);

        let events = self.events.clone();
        tokio::spawn(async move {
            for event in events {
                tokio::select! {
                    _ = stop_rx.recv() => return,
                    _ = tokio::time::sleep(Duration::from_millis(30)) => {}
                }
                if evt_tx.send(event).await.is_err() {
                    return;
                }
            }
            // Keep the stream open until asked to stop, like a live session.
            let _ = stop_rx.recv().await;
        });

        Ok(CaptureStream {
            sample_rate_hz: 16_000,
            events: evt_rx,
            stop: stop_tx,
        })
    }
}
