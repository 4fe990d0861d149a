//! Gemini `generateContent` adapter.
//!
//! Sends only the most recent message. An attached image is split from its
//! data-URI into `inline_data {mime_type, data}` and sent as a second part.

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use duochat_core::datauri::{DataUri, DataUriError};
use duochat_core::types::{ChatResponse, Message, ProviderKind};

use crate::factory::ProviderError;
use crate::http;
use crate::registry::Endpoint;
use crate::traits::ChatProvider;

// ─────────────────────────────────────────────
// Wire format
// ─────────────────────────────────────────────

/// Request body for `POST models/{model}:generateContent`.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Content {
    pub parts: Vec<Part>,
}

/// Text or inline media part.
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

/// Base64 image payload.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct InlineData {
    pub mime_type: String,
    pub data: String,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    pub max_output_tokens: u32,
}

// ─────────────────────────────────────────────
// Translation
// ─────────────────────────────────────────────

/// Build the request body from the latest message.
///
/// Returns `Ok(None)` for an empty conversation.
pub fn build_request(
    messages: &[Message],
    max_tokens: Option<u32>,
) -> Result<Option<GenerateContentRequest>, DataUriError> {
    let Some(last) = messages.last() else {
        return Ok(None);
    };

    let mut parts = vec![Part::Text {
        text: last.content.clone(),
    }];

    if let Some(ref image) = last.image {
        let uri = DataUri::parse(image)?;
        parts.push(Part::InlineData {
            inline_data: InlineData {
                data: uri.to_base64(),
                mime_type: uri.mime_type,
            },
        });
    }

    Ok(Some(GenerateContentRequest {
        contents: vec![Content { parts }],
        generation_config: max_tokens.map(|n| GenerationConfig {
            max_output_tokens: n,
        }),
    }))
}

/// Read `candidates[0].content.parts[0].text` from a 2xx body.
pub fn parse_response(body: &serde_json::Value) -> ChatResponse {
    match body
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(|t| t.as_str())
    {
        Some(text) => ChatResponse::Content(text.to_string()),
        None => {
            // A blocked prompt comes back 200 with no candidates.
            match body.pointer("/promptFeedback/blockReason").and_then(|r| r.as_str()) {
                Some(reason) => ChatResponse::error(format!("Gemini blocked the prompt: {}", reason)),
                None => ChatResponse::error(
                    "Gemini response is missing candidates[0].content.parts[0].text",
                ),
            }
        }
    }
}

// ─────────────────────────────────────────────
// GeminiProvider
// ─────────────────────────────────────────────

/// Adapter for Google's Generative Language API.
pub struct GeminiProvider {
    client: reqwest::Client,
    /// Sent as the `key` query parameter.
    api_key: String,
    endpoint: Endpoint,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_base", &self.endpoint.api_base)
            .field("model", &self.endpoint.model)
            .finish()
    }
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>, endpoint: Endpoint) -> Result<Self, ProviderError> {
        Ok(GeminiProvider {
            client: http::build_client()?,
            api_key: api_key.into(),
            endpoint,
        })
    }

    fn generate_url(&self) -> String {
        self.endpoint
            .url(&format!("models/{}:generateContent", self.endpoint.model))
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    async fn chat(&self, messages: &[Message]) -> ChatResponse {
        let body = match build_request(messages, self.endpoint.max_tokens) {
            Ok(Some(body)) => body,
            Ok(None) => return ChatResponse::error("No messages to send"),
            Err(e) => {
                warn!(provider = self.display_name(), error = %e, "Rejected image attachment");
                return ChatResponse::error(format!("Invalid image attachment: {}", e));
            }
        };

        debug!(
            provider = self.display_name(),
            model = %self.endpoint.model,
            parts = body.contents[0].parts.len(),
            "Calling LLM"
        );

        let request = self
            .client
            .post(self.generate_url())
            .query(&[("key", self.api_key.as_str())])
            .json(&body);

        http::execute(self.display_name(), request, parse_response).await
    }

    fn kind(&self) -> ProviderKind {
        ProviderKind::Gemini
    }

    fn model(&self) -> &str {
        &self.endpoint.model
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
