//! Voice collector — record from the microphone, hand back a transcript.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use tokio::process::Child;
use tracing::{debug, info, warn};

use duochat_core::config::VoiceConfig;
use duochat_providers::{TranscriptionProvider, WhisperTranscriber};

use super::command::{render_command, shell_command, temp_output_path};

/// How long a recorder gets to finish its file after SIGINT.
const STOP_GRACE: Duration = Duration::from_secs(3);

/// A speech-to-text source with an explicit start/stop session.
#[async_trait]
pub trait SpeechRecognizer: Send {
    /// Begin listening. `language` is a BCP-47 tag.
    async fn start(&mut self, language: &str) -> anyhow::Result<()>;

    /// Stop listening and return the finalized utterances.
    async fn stop(&mut self) -> anyhow::Result<Vec<String>>;
}

/// Join utterances into one message; `None` when nothing was said.
pub fn join_transcript(utterances: &[String]) -> Option<String> {
    let text = utterances
        .iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Guards a recognizer so only one session runs at a time.
pub struct VoiceRecorder<R: SpeechRecognizer> {
    recognizer: R,
    language: String,
    active: bool,
}

impl<R: SpeechRecognizer> VoiceRecorder<R> {
    pub fn new(recognizer: R, language: impl Into<String>) -> Self {
        Self {
            recognizer,
            language: language.into(),
            active: false,
        }
    }

    pub fn is_recording(&self) -> bool {
        self.active
    }

    /// Start a session. Returns `false` if one is already running.
    pub async fn start(&mut self) -> anyhow::Result<bool> {
        if self.active {
            debug!("voice session already active");
            return Ok(false);
        }

        self.recognizer.start(&self.language).await?;
        self.active = true;
        info!(language = %self.language, "voice recording started");
        Ok(true)
    }

    /// End the session and return the transcript, if any.
    pub async fn stop(&mut self) -> anyhow::Result<Option<String>> {
        if !self.active {
            return Ok(None);
        }
        self.active = false;

        let utterances = self.recognizer.stop().await?;
        let transcript = join_transcript(&utterances);
        info!(
            chars = transcript.as_ref().map(|t| t.len()).unwrap_or(0),
            "voice recording stopped"
        );
        Ok(transcript)
    }
}

// ─────────────────────────────────────────────
// Command-backed recognizer
// ─────────────────────────────────────────────

/// Records with a configured command (`arecord`, `sox`, ...) and transcribes
/// the file when the session stops.
pub struct CommandRecognizer {
    record_command: String,
    transcriber: Arc<dyn TranscriptionProvider>,
    child: Option<Child>,
    output: Option<PathBuf>,
    language: String,
}

impl CommandRecognizer {
    pub fn new(record_command: impl Into<String>, transcriber: Arc<dyn TranscriptionProvider>) -> Self {
        Self {
            record_command: record_command.into(),
            transcriber,
            child: None,
            output: None,
            language: String::new(),
        }
    }

    /// Build from config, transcribing with Whisper using `api_key`.
    pub fn from_config(config: &VoiceConfig, api_key: &str) -> Self {
        let transcriber = WhisperTranscriber::with_url(api_key, &config.transcription_url)
            .with_model(&config.model);
        Self::new(config.record_command.trim(), Arc::new(transcriber))
    }

    fn remove_output(&mut self) {
        if let Some(path) = self.output.take() {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(&path) {
                    warn!(path = %path.display(), error = %e, "failed to remove recording");
                }
            }
        }
    }
}

#[async_trait]
impl SpeechRecognizer for CommandRecognizer {
    async fn start(&mut self, language: &str) -> anyhow::Result<()> {
        if self.child.is_some() {
            anyhow::bail!("microphone is already in use");
        }
        if self.record_command.is_empty() {
            anyhow::bail!("no record command configured");
        }

        let output = temp_output_path("voice", "wav");
        let cmd = render_command(
            &self.record_command,
            &[("output", &output.display().to_string())],
        );
        debug!(command = %cmd, "starting recorder");

        // `exec` makes the recorder itself the child, so signals reach it.
        let cmd = if cfg!(unix) { format!("exec {cmd}") } else { cmd };
        let child = shell_command(&cmd)
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .context("failed to start recorder")?;

        self.child = Some(child);
        self.output = Some(output);
        self.language = language.to_string();
        Ok(())
    }

    async fn stop(&mut self) -> anyhow::Result<Vec<String>> {
        let Some(mut child) = self.child.take() else {
            return Ok(Vec::new());
        };

        // A recorder that already exited has nothing left to stop.
        if child.try_wait()?.is_none() {
            interrupt(&mut child).await?;
        }

        let Some(path) = self.output.clone() else {
            return Ok(Vec::new());
        };

        let result = self.transcriber.transcribe(&path, &self.language).await;
        self.remove_output();

        let text = result?;
        Ok(if text.is_empty() { Vec::new() } else { vec![text] })
    }
}

/// Stop a recorder with SIGINT so it can finalize its output (`arecord`
/// writes the WAV header sizes on exit), falling back to SIGKILL.
async fn interrupt(child: &mut Child) -> anyhow::Result<()> {
    if let Some(pid) = child.id() {
        let sent = shell_command(&format!("kill -INT {pid}"))
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false);

        if sent {
            match tokio::time::timeout(STOP_GRACE, child.wait()).await {
                Ok(status) => {
                    debug!(status = ?status?, "recorder stopped");
                    return Ok(());
                }
                Err(_) => warn!(pid, "recorder ignored SIGINT, killing it"),
            }
        }
    }

    child.kill().await.context("failed to stop recorder")
}

impl Drop for CommandRecognizer {
    fn drop(&mut self) {
        self.remove_output();
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
