//! Input collectors — each turns one kind of user input into a value the
//! conversation can send.

pub mod camera;
pub mod command;
pub mod file;
pub mod voice;

use std::fmt::Display;
use std::path::Path;

pub use camera::{CameraDevice, CameraError, CameraSession, CameraState, CommandCamera, Facing, Frame};
pub use file::{load_document, load_image};
pub use voice::{CommandRecognizer, SpeechRecognizer, VoiceRecorder};

/// Why a picked file could not be turned into input.
#[derive(Debug, thiserror::Error)]
pub enum CollectorError {
    #[error("unsupported file type: {0}")]
    UnsupportedFile(String),
    #[error("could not read {path}: {reason}")]
    Unreadable { path: String, reason: String },
}

impl CollectorError {
    pub(crate) fn unreadable(path: &Path, reason: impl Display) -> Self {
        CollectorError::Unreadable {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}
