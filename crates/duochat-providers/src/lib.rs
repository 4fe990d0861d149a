//! LLM provider layer for Duochat.
//!
//! # Architecture
//!
//! - [`traits::ChatProvider`] — trait both adapters implement
//! - [`openai::OpenAiProvider`] — `/chat/completions`, full history replay
//! - [`gemini::GeminiProvider`] — `:generateContent`, latest message only
//! - [`registry`] — static specs (defaults, display names) for the two providers
//! - [`factory::create_provider`] — picks the adapter for an `ApiConfig`
//! - [`transcription`] — Whisper-style speech-to-text for the voice collector

pub mod factory;
pub mod gemini;
mod http;
pub mod openai;
pub mod registry;
pub mod traits;
pub mod transcription;

// Re-export main types for convenience
pub use factory::{create_provider, HttpProviderFactory, ProviderError, ProviderFactory};
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use registry::{Endpoint, ProviderSpec, PROVIDERS};
pub use traits::ChatProvider;
pub use transcription::{TranscriptionProvider, WhisperTranscriber};
