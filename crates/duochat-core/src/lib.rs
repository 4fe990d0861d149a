//! Core types, data-URI codec, configuration, and path helpers for Duochat.

pub mod config;
pub mod datauri;
pub mod types;
pub mod utils;

pub use datauri::{DataUri, DataUriError};
pub use types::{
    ApiConfig, ChatResponse, FileAttachment, Message, ProviderKind, Role, UnknownProvider, UserInput,
};
