use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use voiceqa_engine::traits::LocalSynthesizer;

/// On-device fallback synthesis by spawning a configured speech command
/// (`say` on macOS, `espeak` on Linux, ...). The text to speak is appended as
/// the final argument.
pub struct CommandSynthesizer {
    command: Vec<String>,
    child: Mutex<Option<Child>>,
}

impl CommandSynthesizer {
    pub fn new(command: Vec<String>) -> Self {
        Self {
            command,
            child: Mutex::new(None),
        }
    }
}

impl std::fmt::Debug for CommandSynthesizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSynthesizer")
            .field("command", &self.command)
            .finish()
    }
}

#[async_trait]
impl LocalSynthesizer for CommandSynthesizer {
    async fn speak(&self, text: &str) -> anyhow::Result<()> {
        let Some((program, args)) = self.command.split_first() else {
            return Err(anyhow!("no local synthesis command configured"));
        };

        let child = Command::new(program)
            .args(args)
            .arg(text)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("spawn local synthesis command: {program}"))?;

        *self.child.lock().await = Some(child);

        // Poll instead of holding the lock across `wait`, so `stop` can take
        // the child and kill it mid-utterance.
        loop {
            let mut guard = self.child.lock().await;
            let Some(child) = guard.as_mut() else {
                // Stopped: the utterance was cancelled, which is not a
                // failure.
                return Ok(());
            };

            match child.try_wait() {
                Ok(Some(status)) => {
                    guard.take();
                    if status.success() {
                        return Ok(());
                    }
                    return Err(anyhow!("local synthesis exited with {status}"));
                }
                Ok(None) => {}
                Err(e) => {
                    guard.take();
                    return Err(anyhow::Error::new(e).context("wait for local synthesis"));
                }
            }

            drop(guard);
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    async fn stop(&self) {
        let mut guard = self.child.lock().await;
        if let Some(mut child) = guard.take() {
            let _ = child.start_kill();
            let _ = child.wait().await;
        }
    }
}

/// Headless stand-in: accepts every utterance without producing sound.
#[derive(Debug, Default)]
pub struct NullSynthesizer;

#[async_trait]
impl LocalSynthesizer for NullSynthesizer {
    async fn speak(&self, _text: &str) -> anyhow::Result<()> {
        Ok(())
    }

    async fn stop(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn empty_command_is_rejected() {
        let synth = CommandSynthesizer::new(vec![]);
        assert!(synth.speak("hello").await.is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn successful_command_resolves() {
        let synth = CommandSynthesizer::new(vec!["true".into()]);
        synth.speak("hello").await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_command_surfaces_exit_status() {
        let synth = CommandSynthesizer::new(vec!["false".into()]);
        let err = synth.speak("hello").await.unwrap_err();
        assert!(err.to_string().contains("exited"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stop_cancels_a_long_utterance() {
        // The spoken text lands in `$0`; the shell just sleeps.
        let synth = Arc::new(CommandSynthesizer::new(vec![
            "sh".into(),
            "-c".into(),
            "sleep 10".into(),
        ]));

        let speaking = {
            let synth = synth.clone();
            tokio::spawn(async move { synth.speak("ignored").await })
        };

        // Give the child a moment to spawn, then cancel it.
        tokio::time::sleep(Duration::from_millis(100)).await;
        synth.stop().await;

        let result = tokio::time::timeout(Duration::from_secs(2), speaking)
            .await
            .expect("speak should resolve after stop")
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn stop_without_utterance_is_a_noop() {
        let synth = CommandSynthesizer::new(vec!["true".into()]);
        synth.stop().await;
        synth.stop().await;
    }
}
