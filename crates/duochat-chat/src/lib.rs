//! Duochat chat — conversation controller and input collectors.
//!
//! This crate contains:
//! - **conversation**: the transcript and the one-at-a-time `send`
//! - **collectors**: file/PDF, camera and voice input
//! - **capabilities**: startup probe for the optional devices

pub mod capabilities;
pub mod collectors;
pub mod conversation;

pub use capabilities::Capabilities;
pub use collectors::CollectorError;
pub use conversation::{Conversation, SendError};
