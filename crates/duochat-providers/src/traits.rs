//! Chat provider trait — the seam between the conversation and a vendor API.
//!
//! There are exactly two implementations, `OpenAiProvider` and
//! `GeminiProvider`. The conversation picks one per send through a
//! `ProviderFactory` and never branches on the vendor itself.

use async_trait::async_trait;
use duochat_core::types::{ChatResponse, Message, ProviderKind};

/// Trait that both LLM adapters implement.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send the conversation and wait for the full reply.
    ///
    /// Makes exactly one HTTP call. Transport, status and parse failures come
    /// back as `ChatResponse::Error` instead of propagating.
    async fn chat(&self, messages: &[Message]) -> ChatResponse;

    /// Which vendor this adapter talks to.
    fn kind(&self) -> ProviderKind;

    /// Model sent with each request.
    fn model(&self) -> &str;

    /// Display name for logging.
    fn display_name(&self) -> &str {
        self.kind().display_name()
    }
}
