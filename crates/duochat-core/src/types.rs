//! Core types for Duochat — the conversation model shared by every crate.
//!
//! These are provider-neutral. Each provider adapter translates a `&[Message]`
//! into its own wire format, so nothing here knows about OpenAI or Gemini JSON.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// Messages
// ─────────────────────────────────────────────

/// Who authored a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Text pulled out of a document the user attached.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileAttachment {
    /// Original file name (no directory).
    pub name: String,
    /// MIME type (e.g. "application/pdf", "text/plain").
    pub mime_type: String,
    /// Plain text extracted from the file.
    pub extracted_text: String,
}

/// One turn of the conversation.
///
/// `image` and `file` are only ever set on user turns; the assistant
/// constructor has no way to populate them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Opaque unique id.
    pub id: String,
    pub role: Role,
    /// Visible text. For user turns with a file this already includes the
    /// extracted text.
    pub content: String,
    /// Image as a data-URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileAttachment>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Create a user message.
    pub fn user(
        content: impl Into<String>,
        image: Option<String>,
        file: Option<FileAttachment>,
    ) -> Self {
        Message {
            id: new_id(),
            role: Role::User,
            content: content.into(),
            image,
            file,
            timestamp: Utc::now(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Message {
            id: new_id(),
            role: Role::Assistant,
            content: content.into(),
            image: None,
            file: None,
            timestamp: Utc::now(),
        }
    }

    /// Whether this turn carries an image or a file.
    pub fn has_attachment(&self) -> bool {
        self.image.is_some() || self.file.is_some()
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// ─────────────────────────────────────────────
// User input (what collectors hand to the controller)
// ─────────────────────────────────────────────

/// Everything the user staged for the next send.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserInput {
    pub text: String,
    pub image: Option<String>,
    pub file: Option<FileAttachment>,
}

impl UserInput {
    /// Plain text input (typed or transcribed).
    pub fn text(text: impl Into<String>) -> Self {
        UserInput {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }

    pub fn with_file(mut self, file: FileAttachment) -> Self {
        self.file = Some(file);
        self
    }

    /// Nothing to send: blank text and no attachment.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.image.is_none() && self.file.is_none()
    }
}

// ─────────────────────────────────────────────
// Provider selection
// ─────────────────────────────────────────────

/// The two supported LLM backends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    OpenAi,
    Gemini,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::OpenAi, ProviderKind::Gemini];

    /// Config/registry key.
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            ProviderKind::OpenAi => "OpenAI",
            ProviderKind::Gemini => "Gemini",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a provider name is not recognised.
#[derive(Debug, thiserror::Error)]
#[error("unknown provider '{0}' (expected 'openai' or 'gemini')")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderKind {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(ProviderKind::OpenAi),
            "gemini" => Ok(ProviderKind::Gemini),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

/// Provider + key, threaded explicitly into every send.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    pub provider: ProviderKind,
    pub api_key: String,
}

impl ApiConfig {
    pub fn new(provider: ProviderKind, api_key: impl Into<String>) -> Self {
        ApiConfig {
            provider,
            api_key: api_key.into(),
        }
    }

    /// Whether a non-blank API key is set.
    pub fn is_configured(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("provider", &self.provider)
            .field("api_key", &if self.is_configured() { "<set>" } else { "<empty>" })
            .finish()
    }
}

// ─────────────────────────────────────────────
// Chat response
// ─────────────────────────────────────────────

/// Result of one provider call: either completion text or an error description.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatResponse {
    Content(String),
    Error(String),
}

impl ChatResponse {
    pub fn error(msg: impl Into<String>) -> Self {
        ChatResponse::Error(msg.into())
    }

    /// Completion text; empty for errors.
    pub fn content(&self) -> &str {
        match self {
            ChatResponse::Content(text) => text,
            ChatResponse::Error(_) => "",
        }
    }

    /// Error description, if the call failed.
    pub fn error_message(&self) -> Option<&str> {
        match self {
            ChatResponse::Content(_) => None,
            ChatResponse::Error(msg) => Some(msg),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, ChatResponse::Error(_))
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_keeps_attachments() {
        let file = FileAttachment {
            name: "notes.txt".into(),
            mime_type: "text/plain".into(),
            extracted_text: "hello".into(),
        };
        let msg = Message::user("see attached", Some("data:image/png;base64,AAAA".into()), Some(file));

        assert_eq!(msg.role, Role::User);
        assert!(msg.has_attachment());
        assert_eq!(msg.file.as_ref().unwrap().name, "notes.txt");
    }

    #[test]
    fn test_assistant_message_has_no_attachments() {
        let msg = Message::assistant("Hi there");
        assert_eq!(msg.role, Role::Assistant);
        assert!(msg.image.is_none());
        assert!(msg.file.is_none());
    }

    #[test]
    fn test_message_ids_are_unique() {
        let a = Message::assistant("a");
        let b = Message::assistant("a");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_message_serialization_skips_empty_attachments() {
        let json = serde_json::to_value(Message::user("Hello", None, None)).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["content"], "Hello");
        assert!(json.get("image").is_none());
        assert!(json.get("file").is_none());
    }

    #[test]
    fn test_user_input_is_empty() {
        assert!(UserInput::text("   ").is_empty());
        assert!(!UserInput::text("hi").is_empty());
        assert!(!UserInput::text("").with_image("data:image/png;base64,AA").is_empty());
    }

    #[test]
    fn test_provider_kind_parse_and_serde() {
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAi);
        assert_eq!(" gemini ".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert!("claude".parse::<ProviderKind>().is_err());

        assert_eq!(serde_json::to_value(ProviderKind::OpenAi).unwrap(), "openai");
        let kind: ProviderKind = serde_json::from_str("\"gemini\"").unwrap();
        assert_eq!(kind, ProviderKind::Gemini);
    }

    #[test]
    fn test_api_config_debug_hides_key() {
        let config = ApiConfig::new(ProviderKind::OpenAi, "sk-secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<set>"));
    }

    #[test]
    fn test_api_config_blank_key_not_configured() {
        assert!(!ApiConfig::new(ProviderKind::Gemini, "  ").is_configured());
        assert!(ApiConfig::new(ProviderKind::Gemini, "k").is_configured());
    }

    #[test]
    fn test_chat_response_never_both() {
        let ok = ChatResponse::Content("Hi".into());
        assert_eq!(ok.content(), "Hi");
        assert!(ok.error_message().is_none());

        let err = ChatResponse::error("boom");
        assert_eq!(err.content(), "");
        assert_eq!(err.error_message(), Some("boom"));
        assert!(err.is_error());
    }
}
