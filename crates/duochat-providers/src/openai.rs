//! OpenAI chat-completions adapter.
//!
//! Replays the whole conversation on every call. User turns with an
//! attachment become multipart content (text + `image_url`), everything else
//! is a plain string.

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use duochat_core::types::{ChatResponse, Message, ProviderKind, Role};

use crate::factory::ProviderError;
use crate::http;
use crate::registry::Endpoint;
use crate::traits::ChatProvider;

// ─────────────────────────────────────────────
// Wire format
// ─────────────────────────────────────────────

/// Request body for `POST /chat/completions`.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// A `{role, content}` pair.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct WireMessage {
    pub role: &'static str,
    pub content: MessageContent,
}

/// Message content — either plain text or multipart (for vision/images).
///
/// When serialized: text becomes a plain string, parts become an array of objects.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

/// A single part of a multipart message.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum ContentPart {
    #[serde(rename = "text")]
    Text { text: String },
    /// Image URL part (a base64 data-URI here).
    #[serde(rename = "image_url")]
    ImageUrl { image_url: ImageUrl },
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ImageUrl {
    pub url: String,
}

// ─────────────────────────────────────────────
// Translation
// ─────────────────────────────────────────────

/// Translate one conversation turn.
pub fn to_wire_message(msg: &Message) -> WireMessage {
    let content = if msg.role == Role::User && msg.has_attachment() {
        let mut parts = vec![ContentPart::Text {
            text: msg.content.clone(),
        }];
        if let Some(ref url) = msg.image {
            parts.push(ContentPart::ImageUrl {
                image_url: ImageUrl { url: url.clone() },
            });
        }
        MessageContent::Parts(parts)
    } else {
        MessageContent::Text(msg.content.clone())
    };

    WireMessage {
        role: msg.role.as_str(),
        content,
    }
}

/// Build the request body for the full history.
pub fn build_request(messages: &[Message], endpoint: &Endpoint) -> ChatCompletionRequest {
    ChatCompletionRequest {
        model: endpoint.model.clone(),
        messages: messages.iter().map(to_wire_message).collect(),
        max_tokens: endpoint.max_tokens,
    }
}

/// Read `choices[0].message.content` from a 2xx body.
pub fn parse_response(body: &serde_json::Value) -> ChatResponse {
    match body
        .pointer("/choices/0/message/content")
        .and_then(|c| c.as_str())
    {
        Some(text) => ChatResponse::Content(text.to_string()),
        None => ChatResponse::error("OpenAI response is missing choices[0].message.content"),
    }
}

// ─────────────────────────────────────────────
// OpenAiProvider
// ─────────────────────────────────────────────

/// Adapter for OpenAI's `/chat/completions`.
pub struct OpenAiProvider {
    /// HTTP client (shared, connection-pooled).
    client: reqwest::Client,
    /// API key for Bearer authentication.
    api_key: String,
    endpoint: Endpoint,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("api_base", &self.endpoint.api_base)
            .field("model", &self.endpoint.model)
            .finish()
    }
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>, endpoint: Endpoint) -> Result<Self, ProviderError> {
        Ok(OpenAiProvider {
            client: http::build_client()?,
            api_key: api_key.into(),
            endpoint,
        })
    }

    /// Build the full chat completions URL.
    fn completions_url(&self) -> String {
        self.endpoint.url("chat/completions")
    }
}

#[async_trait]
impl ChatProvider for OpenAiProvider {
    async fn chat(&self, messages: &[Message]) -> ChatResponse {
        if messages.is_empty() {
            return ChatResponse::error("No messages to send");
        }

        let body = build_request(messages, &self.endpoint);

        debug!(
            provider = self.display_name(),
            model = %self.endpoint.model,
            messages = messages.len(),
            "Calling LLM"
        );

        let request = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&body);

        http::execute(self.display_name(), request, parse_response).await
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAi
    }

    fn model(&self) -> &str {
        &self.endpoint.model
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
