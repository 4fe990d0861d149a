//! Startup probe for optional input devices.

use tracing::debug;

use duochat_core::config::Config;

use crate::collectors::command::program_on_path;

/// Which optional collectors can run on this machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub camera: bool,
    pub voice: bool,
}

impl Capabilities {
    /// Check once at startup; the UI hides what is missing.
    pub fn probe(config: &Config) -> Self {
        let camera = !config.camera.command.trim().is_empty() && program_on_path(&config.camera.command);

        let recorder = !config.voice.record_command.trim().is_empty()
            && program_on_path(&config.voice.record_command);
        let voice = recorder && config.transcription_key().is_some();

        debug!(camera, voice, recorder, "probed device capabilities");
        Capabilities { camera, voice }
    }
}
