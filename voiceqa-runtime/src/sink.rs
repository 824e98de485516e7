use std::io::Cursor;
use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use voiceqa_engine::traits::AudioSink;

/// Plays encoded audio bytes on the default output device. Playback runs on
/// a blocking thread; `stop` flips a flag the playback loop polls, so it
/// takes effect within one poll interval.
pub struct RodioSink {
    current: StdMutex<Arc<AtomicBool>>,
}

impl RodioSink {
    pub fn new() -> Self {
        Self {
            current: StdMutex::new(Arc::new(AtomicBool::new(false))),
        }
    }
}

impl Default for RodioSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioSink for RodioSink {
    async fn play(&self, audio: &[u8]) -> anyhow::Result<()> {
        let stop = Arc::new(AtomicBool::new(false));
        *self.current.lock().expect("sink lock") = stop.clone();

        let bytes = audio.to_vec();
        tokio::task::spawn_blocking(move || play_bytes(bytes, stop))
            .await
            .context("join playback thread")?
    }

    async fn stop(&self) {
        self.current
            .lock()
            .expect("sink lock")
            .store(true, Ordering::SeqCst);
    }
}

fn play_bytes(bytes: Vec<u8>, stop: Arc<AtomicBool>) -> anyhow::Result<()> {
    let (_stream, handle) =
        rodio::OutputStream::try_default().context("open audio output device")?;
    let sink = rodio::Sink::try_new(&handle).context("create audio sink")?;

    let source = rodio::Decoder::new(Cursor::new(bytes)).context("decode audio bytes")?;
    sink.append(source);

    loop {
        if stop.load(Ordering::SeqCst) {
            sink.stop();
            break;
        }
        if sink.empty() {
            break;
        }
        std::thread::sleep(Duration::from_millis(25));
    }

    Ok(())
}

/// Headless stand-in: "plays" instantly without an output device.
#[derive(Debug, Default)]
pub struct NullSink;

#[async_trait]
impl AudioSink for NullSink {
    async fn play(&self, _audio: &[u8]) -> anyhow::Result<()> {
        Ok(())
    }

    async fn stop(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_sink_accepts_everything() {
        let sink = NullSink;
        sink.play(&[1, 2, 3]).await.unwrap();
        sink.stop().await;
        sink.stop().await;
    }

    // Requires audio hardware; skipped in CI.
    #[tokio::test]
    #[ignore = "requires audio hardware"]
    async fn rodio_sink_plays_generated_wav() {
        let samples: Vec<f32> = (0..16_000)
            .map(|i| (i as f32 * 440.0 * 2.0 * std::f32::consts::PI / 16_000.0).sin() * 0.2)
            .collect();
        let wav = crate::audio::encode_wav_mono_f32le(&samples, 16_000);

        let sink = RodioSink::new();
        sink.play(&wav).await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires audio hardware"]
    async fn rodio_sink_stop_interrupts_playback() {
        let samples = vec![0.1f32; 16_000 * 10];
        let wav = crate::audio::encode_wav_mono_f32le(&samples, 16_000);

        let sink = Arc::new(RodioSink::new());
        let playing = {
            let sink = sink.clone();
            tokio::spawn(async move { sink.play(&wav).await })
        };

        tokio::time::sleep(Duration::from_millis(200)).await;
        sink.stop().await;

        tokio::time::timeout(Duration::from_secs(2), playing)
            .await
            .expect("play resolves after stop")
            .unwrap()
            .unwrap();
    }
}
