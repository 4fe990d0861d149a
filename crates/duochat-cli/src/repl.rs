//! Interactive REPL.
//!
//! Uses `rustyline` for readline-style editing with persistent history.
//! Attachments picked with `/image`, `/file` or `/camera` are staged and go
//! out with the next message.

use anyhow::Result;
use colored::Colorize;
use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{DefaultEditor, Editor};
use tracing::debug;

use duochat_chat::collectors::{
    load_document, load_image, CameraSession, CameraState, CommandCamera, CommandRecognizer,
    VoiceRecorder,
};
use duochat_chat::{Capabilities, Conversation};
use duochat_core::config::{save_config, Config};
use duochat_core::types::{ApiConfig, FileAttachment, ProviderKind, UserInput};
use duochat_core::utils::{get_history_path, mask_secret};

use crate::helpers;

/// Exit commands (case-insensitive match).
const EXIT_COMMANDS: &[&str] = &["exit", "quit", "/exit", "/quit", ":q"];

// ─────────────────────────────────────────────
// Command parsing
// ─────────────────────────────────────────────

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Exit,
    Help,
    Clear,
    Drop,
    Camera,
    Voice,
    Provider(Option<&'a str>),
    Image(&'a str),
    File(&'a str),
    Unknown(&'a str),
    Message(&'a str),
}

fn parse_command(input: &str) -> Command<'_> {
    let trimmed = input.trim();
    if is_exit_command(trimmed) {
        return Command::Exit;
    }
    if !trimmed.starts_with('/') {
        return Command::Message(trimmed);
    }

    let (name, arg) = match trimmed.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (trimmed, ""),
    };

    match name.to_lowercase().as_str() {
        "/help" | "/?" => Command::Help,
        "/clear" => Command::Clear,
        "/drop" => Command::Drop,
        "/camera" => Command::Camera,
        "/voice" => Command::Voice,
        "/provider" => Command::Provider(if arg.is_empty() { None } else { Some(arg) }),
        "/image" => Command::Image(arg),
        "/file" => Command::File(arg),
        _ => Command::Unknown(name),
    }
}

/// Check if input is an exit command.
fn is_exit_command(input: &str) -> bool {
    let lower = input.to_lowercase();
    EXIT_COMMANDS.contains(&lower.as_str())
}

fn help_text(capabilities: Capabilities) -> String {
    let mut lines = vec![
        ("/image PATH", "attach an image to the next message"),
        ("/file PATH", "attach a PDF or text document to the next message"),
        ("/drop", "discard staged attachments"),
    ];
    if capabilities.camera {
        lines.push(("/camera", "take a photo and attach it"));
    }
    if capabilities.voice {
        lines.push(("/voice", "dictate a message"));
    }
    lines.extend([
        ("/clear", "start a new conversation"),
        ("/provider [NAME]", "show or switch the provider (openai, gemini)"),
        ("/help", "show this help"),
        ("exit", "quit"),
    ]);

    lines
        .iter()
        .map(|(cmd, desc)| format!("  {:<18} {}", cmd, desc))
        .collect::<Vec<_>>()
        .join("\n")
}

// ─────────────────────────────────────────────
// Staged attachments
// ─────────────────────────────────────────────

#[derive(Debug, Default)]
struct Staged {
    image: Option<String>,
    file: Option<FileAttachment>,
}

impl Staged {
    fn is_empty(&self) -> bool {
        self.image.is_none() && self.file.is_none()
    }

    /// Combine typed text with whatever is staged.
    fn to_input(&self, text: &str) -> UserInput {
        UserInput {
            text: text.to_string(),
            image: self.image.clone(),
            file: self.file.clone(),
        }
    }

    fn clear(&mut self) {
        self.image = None;
        self.file = None;
    }

    /// Short label for the prompt, e.g. `[image, report.pdf]`.
    fn label(&self) -> Option<String> {
        let mut parts = Vec::new();
        if self.image.is_some() {
            parts.push("image".to_string());
        }
        if let Some(ref file) = self.file {
            parts.push(file.name.clone());
        }
        if parts.is_empty() {
            None
        } else {
            Some(format!("[{}]", parts.join(", ")))
        }
    }
}

/// Where the text of a message came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InputSource {
    Typed,
    /// A voice transcript, sent as plain text.
    Voice,
}

impl InputSource {
    fn takes_staged(self) -> bool {
        self == InputSource::Typed
    }
}

/// Typed text picks up staged attachments; a transcript goes out alone and
/// leaves them staged.
fn build_input(source: InputSource, text: &str, staged: &Staged) -> UserInput {
    if source.takes_staged() {
        staged.to_input(text)
    } else {
        UserInput::text(text)
    }
}

// ─────────────────────────────────────────────
// REPL
// ─────────────────────────────────────────────

struct Repl {
    conversation: Conversation,
    config: Config,
    capabilities: Capabilities,
    staged: Staged,
    editor: Editor<(), DefaultHistory>,
}

/// Run the interactive REPL loop.
pub async fn run(conversation: Conversation, config: Config, capabilities: Capabilities) -> Result<()> {
    helpers::print_banner(config.provider, capabilities);

    let mut repl = Repl {
        conversation,
        config,
        capabilities,
        staged: Staged::default(),
        editor: create_editor()?,
    };

    loop {
        let prompt = match repl.staged.label() {
            Some(label) => format!("You {}: ", label),
            None => "You: ".to_string(),
        };

        let input = match repl.editor.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("Input error: {e}");
                break;
            }
        };

        if input.trim().is_empty() && repl.staged.is_empty() {
            continue;
        }
        let _ = repl.editor.add_history_entry(&input);

        match parse_command(&input) {
            Command::Exit => {
                println!("\nGoodbye!");
                break;
            }
            Command::Help => println!("{}", help_text(repl.capabilities)),
            Command::Clear => {
                repl.conversation.clear();
                repl.staged.clear();
                helpers::print_notice("conversation cleared");
            }
            Command::Drop => {
                repl.staged.clear();
                helpers::print_notice("attachments dropped");
            }
            Command::Image(path) => repl.stage_image(path).await,
            Command::File(path) => repl.stage_file(path).await,
            Command::Camera if repl.capabilities.camera => repl.camera().await,
            Command::Voice if repl.capabilities.voice => repl.voice().await,
            Command::Camera | Command::Voice => {
                helpers::print_error("that input device is not available on this machine")
            }
            Command::Provider(name) => repl.provider(name),
            Command::Unknown(name) => {
                helpers::print_error(format!("unknown command {name}; type /help for a list"))
            }
            Command::Message(text) => {
                let text = text.to_string();
                repl.send(InputSource::Typed, &text).await;
            }
        }
    }

    save_history(&mut repl.editor);

    Ok(())
}

impl Repl {
    async fn send(&mut self, source: InputSource, text: &str) {
        let input = build_input(source, text, &self.staged);
        debug!(
            chars = text.len(),
            source = ?source,
            attachments = input.image.is_some() || input.file.is_some(),
            "processing input"
        );

        helpers::print_thinking();
        let result = self.conversation.send(input, &self.config.api_config()).await;
        helpers::clear_thinking();

        match result {
            Ok(reply) => {
                if source.takes_staged() {
                    self.staged.clear();
                }
                helpers::print_reply(&reply, self.config.provider);
            }
            Err(e) => helpers::print_error(helpers::send_error(e)),
        }
    }

    async fn stage_image(&mut self, path: &str) {
        if path.is_empty() {
            helpers::print_error("usage: /image PATH");
            return;
        }
        match load_image(&helpers::expand_tilde(path)).await {
            Ok(uri) => {
                self.staged.image = Some(uri);
                helpers::print_notice(format!("image attached: {path}"));
            }
            Err(e) => helpers::print_error(e),
        }
    }

    async fn stage_file(&mut self, path: &str) {
        if path.is_empty() {
            helpers::print_error("usage: /file PATH");
            return;
        }
        match load_document(&helpers::expand_tilde(path)).await {
            Ok(file) => {
                helpers::print_notice(format!(
                    "file attached: {} ({} characters extracted)",
                    file.name,
                    file.extracted_text.chars().count()
                ));
                self.staged.file = Some(file);
            }
            Err(e) => helpers::print_error(e),
        }
    }

    async fn camera(&mut self) {
        let mut session = CameraSession::new(CommandCamera::from_config(&self.config.camera));
        if let Err(e) = session.start().await {
            helpers::print_error(e);
            return;
        }

        loop {
            let captured = matches!(session.state(), CameraState::Captured(_));
            let prompt = if captured {
                "photo taken: [u]se  [r]etake  [x] cancel > ".to_string()
            } else {
                format!(
                    "camera ({}): [c]apture  [s]witch  [x] cancel > ",
                    session.facing()
                )
            };

            let choice = match self.editor.readline(&prompt) {
                Ok(line) => line.trim().to_lowercase(),
                Err(_) => "x".to_string(),
            };

            let outcome = match (captured, choice.as_str()) {
                (false, "c" | "") => session.capture().await.map(|_| ()),
                (false, "s") => session.switch_facing().await.map(|_| ()),
                (true, "r") => session.retake(),
                (true, "u" | "") => match session.use_photo().await {
                    Ok(uri) => {
                        self.staged.image = Some(uri);
                        helpers::print_notice("photo attached to the next message");
                        return;
                    }
                    Err(e) => Err(e),
                },
                (_, "x" | "q") => {
                    session.cancel().await;
                    return;
                }
                _ => Ok(()),
            };

            if let Err(e) = outcome {
                helpers::print_error(e);
                if session.state() == &CameraState::Closed {
                    return;
                }
            }
        }
    }

    async fn voice(&mut self) {
        let Some(key) = self.config.transcription_key() else {
            helpers::print_error("voice input needs an OpenAI key; set voice.apiKey in the config");
            return;
        };

        let recognizer = CommandRecognizer::from_config(&self.config.voice, key);
        let mut recorder = VoiceRecorder::new(recognizer, self.config.voice.language.clone());
        if let Err(e) = recorder.start().await {
            helpers::print_error(format!("could not start recording: {e:#}"));
            return;
        }

        let _ = self.editor.readline(&format!("{} ", "recording... press Enter to stop".yellow()));

        match recorder.stop().await {
            Ok(Some(text)) => {
                println!("{} {}", "You said:".dimmed(), text);
                self.send(InputSource::Voice, &text).await;
            }
            Ok(None) => helpers::print_error("no speech recognized"),
            Err(e) => helpers::print_error(format!("transcription failed: {e:#}")),
        }
    }

    fn provider(&mut self, name: Option<&str>) {
        let Some(name) = name else {
            let key = if self.config.api_key.trim().is_empty() {
                "not set".to_string()
            } else {
                mask_secret(self.config.api_key.trim())
            };
            println!(
                "  {} (key: {})\n  available: {}",
                self.config.provider.display_name().bold(),
                key,
                ProviderKind::ALL.map(|k| k.name()).join(", ")
            );
            return;
        };

        let kind: ProviderKind = match name.parse() {
            Ok(kind) => kind,
            Err(e) => {
                helpers::print_error(e);
                return;
            }
        };

        let prompt = format!("{} API key (Enter to keep current): ", kind.display_name());
        let entered = self.editor.readline(&prompt).unwrap_or_default();
        let key = match entered.trim() {
            "" if kind == self.config.provider && !self.config.api_key.trim().is_empty() => {
                self.config.api_key.clone()
            }
            "" => {
                helpers::print_error("an API key is required to switch provider");
                return;
            }
            key => key.to_string(),
        };

        self.config.set_api_config(&ApiConfig::new(kind, key));
        match save_config(&self.config, None) {
            Ok(()) => helpers::print_notice(format!("now using {}", kind.display_name())),
            Err(e) => helpers::print_error(format!("switched for this session, but saving failed: {e}")),
        }
    }
}

/// Create a rustyline editor with history.
fn create_editor() -> Result<Editor<(), DefaultHistory>> {
    let mut editor = DefaultEditor::new()?;
    editor.set_max_history_size(1000)?;

    let history_path = get_history_path();
    if history_path.exists() {
        let _ = editor.load_history(&history_path);
        debug!("loaded REPL history from {}", history_path.display());
    }

    Ok(editor)
}

/// Save history to disk.
fn save_history(editor: &mut Editor<(), DefaultHistory>) {
    let path = get_history_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Err(e) = editor.save_history(&path) {
        debug!("failed to save history: {e}");
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
