//! Camera collector — preview, capture, retake, use.
//!
//! `CameraSession` owns the state machine; the hardware sits behind
//! `CameraDevice`. The stock device shells out to a capture command.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use duochat_core::config::CameraConfig;
use duochat_core::datauri::DataUri;

use super::command::{program_on_path, render_command, run_with_timeout, temp_output_path};

/// Which camera to use.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Facing {
    /// Front camera.
    User,
    /// Rear camera.
    #[default]
    Environment,
}

impl Facing {
    pub fn toggle(self) -> Self {
        match self {
            Facing::User => Facing::Environment,
            Facing::Environment => Facing::User,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Facing::User => "front",
            Facing::Environment => "rear",
        }
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One still image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Frame {
    pub fn jpeg(bytes: Vec<u8>) -> Self {
        Frame {
            mime_type: "image/jpeg".into(),
            bytes,
        }
    }

    pub fn to_data_uri(&self) -> String {
        DataUri::encode(&self.mime_type, &self.bytes)
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CameraError {
    #[error("camera unavailable: {0}")]
    Unavailable(String),
    #[error("capture failed: {0}")]
    CaptureFailed(String),
    #[error("cannot {action} while the camera is {state}")]
    InvalidState {
        action: &'static str,
        state: &'static str,
    },
}

/// Camera hardware.
#[async_trait]
pub trait CameraDevice: Send {
    /// Acquire the stream for `facing`.
    async fn open(&mut self, facing: Facing) -> Result<(), CameraError>;

    /// Grab one frame from the open stream.
    async fn capture(&mut self, facing: Facing) -> Result<Frame, CameraError>;

    /// Release the stream. Safe to call when already closed.
    async fn close(&mut self);
}

// ─────────────────────────────────────────────
// Session state machine
// ─────────────────────────────────────────────

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CameraState {
    #[default]
    Closed,
    Previewing,
    /// Holds the captured frame as a data-URI.
    Captured(String),
}

impl CameraState {
    pub fn name(&self) -> &'static str {
        match self {
            CameraState::Closed => "closed",
            CameraState::Previewing => "previewing",
            CameraState::Captured(_) => "showing a captured photo",
        }
    }
}

/// A single camera interaction, from `start` to `use_photo` or `cancel`.
pub struct CameraSession<D: CameraDevice> {
    device: D,
    facing: Facing,
    state: CameraState,
}

impl<D: CameraDevice> CameraSession<D> {
    pub fn new(device: D) -> Self {
        Self {
            device,
            facing: Facing::default(),
            state: CameraState::Closed,
        }
    }

    pub fn state(&self) -> &CameraState {
        &self.state
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    /// Open the stream, re-opening it if one is already live.
    pub async fn start(&mut self) -> Result<(), CameraError> {
        if self.state != CameraState::Closed {
            self.device.close().await;
            self.state = CameraState::Closed;
        }

        self.device.open(self.facing).await?;
        self.state = CameraState::Previewing;
        debug!(facing = %self.facing, "camera preview started");
        Ok(())
    }

    /// Flip between front and rear. A live preview is restarted on the new side.
    pub async fn switch_facing(&mut self) -> Result<Facing, CameraError> {
        self.facing = self.facing.toggle();
        if self.state == CameraState::Previewing {
            self.device.close().await;
            self.state = CameraState::Closed;
            self.device.open(self.facing).await?;
            self.state = CameraState::Previewing;
        }
        debug!(facing = %self.facing, "camera facing switched");
        Ok(self.facing)
    }

    /// Take a photo. Only valid while previewing.
    pub async fn capture(&mut self) -> Result<String, CameraError> {
        if self.state != CameraState::Previewing {
            return Err(self.invalid("capture"));
        }

        let frame = self.device.capture(self.facing).await?;
        info!(facing = %self.facing, bytes = frame.bytes.len(), "photo captured");
        let uri = frame.to_data_uri();
        self.state = CameraState::Captured(uri.clone());
        Ok(uri)
    }

    /// Discard the captured photo and return to the preview.
    pub fn retake(&mut self) -> Result<(), CameraError> {
        match self.state {
            CameraState::Captured(_) => {
                self.state = CameraState::Previewing;
                Ok(())
            }
            _ => Err(self.invalid("retake")),
        }
    }

    /// Accept the captured photo, close the camera and hand back the data-URI.
    pub async fn use_photo(&mut self) -> Result<String, CameraError> {
        match std::mem::take(&mut self.state) {
            CameraState::Captured(uri) => {
                self.device.close().await;
                Ok(uri)
            }
            other => {
                self.state = other;
                Err(self.invalid("use a photo"))
            }
        }
    }

    /// Close the camera and drop any captured photo.
    pub async fn cancel(&mut self) {
        if self.state != CameraState::Closed {
            self.device.close().await;
        }
        self.state = CameraState::Closed;
    }

    fn invalid(&self, action: &'static str) -> CameraError {
        CameraError::InvalidState {
            action,
            state: self.state.name(),
        }
    }
}

// ─────────────────────────────────────────────
// Command-backed device
// ─────────────────────────────────────────────

/// Captures stills by running a configured command such as `fswebcam`.
///
/// `{device}` is replaced with the front or rear device path and `{output}`
/// with a scratch JPEG path that is read back and removed.
#[derive(Clone, Debug)]
pub struct CommandCamera {
    command: String,
    front_device: String,
    rear_device: String,
    timeout: Duration,
    open: bool,
}

impl CommandCamera {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            command: config.command.trim().to_string(),
            front_device: config.front_device.clone(),
            rear_device: config.rear_device.clone(),
            timeout: Duration::from_secs(config.timeout_secs.max(1)),
            open: false,
        }
    }

    fn device_for(&self, facing: Facing) -> &str {
        match facing {
            Facing::User => &self.front_device,
            Facing::Environment => &self.rear_device,
        }
    }
}

#[async_trait]
impl CameraDevice for CommandCamera {
    async fn open(&mut self, facing: Facing) -> Result<(), CameraError> {
        if self.command.is_empty() {
            return Err(CameraError::Unavailable("no capture command configured".into()));
        }
        if !program_on_path(&self.command) {
            return Err(CameraError::Unavailable(format!(
                "capture program not found: {}",
                self.command.split_whitespace().next().unwrap_or_default()
            )));
        }

        let device = self.device_for(facing);
        if device.starts_with('/') && !std::path::Path::new(device).exists() {
            return Err(CameraError::Unavailable(format!("{} not found", device)));
        }

        self.open = true;
        Ok(())
    }

    async fn capture(&mut self, facing: Facing) -> Result<Frame, CameraError> {
        if !self.open {
            return Err(CameraError::Unavailable("camera is not open".into()));
        }

        let output = ScratchFile(temp_output_path("capture", "jpg"));
        let output_str = output.0.display().to_string();
        let cmd = render_command(
            &self.command,
            &[("device", self.device_for(facing)), ("output", &output_str)],
        );

        run_with_timeout(&cmd, self.timeout)
            .await
            .map_err(CameraError::CaptureFailed)?;

        let bytes = tokio::fs::read(&output.0)
            .await
            .map_err(|e| CameraError::CaptureFailed(format!("no image written: {e}")))?;

        if bytes.is_empty() {
            return Err(CameraError::CaptureFailed("capture produced an empty file".into()));
        }

        Ok(Frame::jpeg(bytes))
    }

    async fn close(&mut self) {
        self.open = false;
    }
}

/// Removes the file when dropped.
struct ScratchFile(PathBuf);

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if self.0.exists() {
            if let Err(e) = std::fs::remove_file(&self.0) {
                warn!(path = %self.0.display(), error = %e, "failed to remove scratch file");
            }
        }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Records every device call.
    #[derive(Clone, Default)]
    struct MockCamera {
        log: Arc<Mutex<Vec<String>>>,
        fail_open: bool,
    }

    impl MockCamera {
        fn calls(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CameraDevice for MockCamera {
        async fn open(&mut self, facing: Facing) -> Result<(), CameraError> {
            self.log.lock().unwrap().push(format!("open:{facing}"));
            if self.fail_open {
                return Err(CameraError::Unavailable("permission denied".into()));
            }
            Ok(())
        }

        async fn capture(&mut self, facing: Facing) -> Result<Frame, CameraError> {
            self.log.lock().unwrap().push(format!("capture:{facing}"));
            Ok(Frame::jpeg(vec![0xff, 0xd8, 0xff]))
        }

        async fn close(&mut self) {
            self.log.lock().unwrap().push("close".into());
        }
    }

    #[test]
    fn test_facing_defaults_to_rear() {
        assert_eq!(Facing::default(), Facing::Environment);
        assert_eq!(Facing::Environment.toggle(), Facing::User);
        assert_eq!(Facing::User.toggle(), Facing::Environment);
    }

    #[test]
    fn test_frame_data_uri() {
        assert_eq!(Frame::jpeg(vec![0xff, 0xd8, 0xff]).to_data_uri(), "data:image/jpeg;base64,/9j/");
    }

    #[tokio::test]
    async fn test_capture_and_use_photo() {
        let mock = MockCamera::default();
        let mut session = CameraSession::new(mock.clone());

        session.start().await.unwrap();
        assert_eq!(session.state(), &CameraState::Previewing);

        let uri = session.capture().await.unwrap();
        assert_eq!(session.state(), &CameraState::Captured(uri.clone()));
        assert_eq!(uri, "data:image/jpeg;base64,/9j/");

        let used = session.use_photo().await.unwrap();
        assert_eq!(used, uri);
        assert_eq!(session.state(), &CameraState::Closed);
        assert_eq!(mock.calls(), vec!["open:rear", "capture:rear", "close"]);
    }

    #[tokio::test]
    async fn test_retake_returns_to_preview() {
        let mut session = CameraSession::new(MockCamera::default());
        session.start().await.unwrap();
        session.capture().await.unwrap();

        session.retake().unwrap();
        assert_eq!(session.state(), &CameraState::Previewing);
        assert!(session.capture().await.is_ok());
    }

    #[tokio::test]
    async fn test_switch_facing_restarts_preview() {
        let mock = MockCamera::default();
        let mut session = CameraSession::new(mock.clone());
        session.start().await.unwrap();

        assert_eq!(session.switch_facing().await.unwrap(), Facing::User);
        session.capture().await.unwrap();

        assert_eq!(mock.calls(), vec!["open:rear", "close", "open:front", "capture:front"]);
    }

    #[tokio::test]
    async fn test_switch_facing_while_closed_only_flips() {
        let mock = MockCamera::default();
        let mut session = CameraSession::new(mock.clone());

        session.switch_facing().await.unwrap();
        assert_eq!(session.facing(), Facing::User);
        assert!(mock.calls().is_empty());
    }

    #[tokio::test]
    async fn test_start_twice_reopens() {
        let mock = MockCamera::default();
        let mut session = CameraSession::new(mock.clone());
        session.start().await.unwrap();
        session.start().await.unwrap();

        assert_eq!(mock.calls(), vec!["open:rear", "close", "open:rear"]);
    }

    #[tokio::test]
    async fn test_invalid_transitions() {
        let mut session = CameraSession::new(MockCamera::default());

        assert_eq!(
            session.capture().await.unwrap_err(),
            CameraError::InvalidState {
                action: "capture",
                state: "closed"
            }
        );
        assert!(session.retake().is_err());
        assert!(session.use_photo().await.is_err());
        assert_eq!(session.state(), &CameraState::Closed);

        session.start().await.unwrap();
        assert!(session.retake().is_err());
        assert!(session.use_photo().await.is_err());
        assert_eq!(session.state(), &CameraState::Previewing);
    }

    #[tokio::test]
    async fn test_cancel_drops_capture() {
        let mock = MockCamera::default();
        let mut session = CameraSession::new(mock.clone());
        session.start().await.unwrap();
        session.capture().await.unwrap();

        session.cancel().await;
        assert_eq!(session.state(), &CameraState::Closed);

        // Cancelling a closed session does not touch the device again.
        session.cancel().await;
        assert_eq!(mock.calls().iter().filter(|c| *c == "close").count(), 1);
    }

    #[tokio::test]
    async fn test_open_failure_leaves_session_closed() {
        let mock = MockCamera {
            fail_open: true,
            ..Default::default()
        };
        let mut session = CameraSession::new(mock);

        let err = session.start().await.unwrap_err();
        assert!(matches!(err, CameraError::Unavailable(_)));
        assert_eq!(session.state(), &CameraState::Closed);
    }

    // ── CommandCamera ──

    fn command_camera(command: &str) -> CommandCamera {
        CommandCamera::from_config(&CameraConfig {
            command: command.into(),
            front_device: "front0".into(),
            rear_device: "rear0".into(),
            timeout_secs: 5,
        })
    }

    #[tokio::test]
    async fn test_command_camera_capture() {
        let mut camera = command_camera("sh -c 'printf JPEG > \"$1\"' _ {output}");
        camera.open(Facing::Environment).await.unwrap();

        let frame = camera.capture(Facing::Environment).await.unwrap();
        assert_eq!(frame.mime_type, "image/jpeg");
        assert_eq!(frame.bytes, b"JPEG");
    }

    #[tokio::test]
    async fn test_command_camera_passes_device() {
        let mut camera = command_camera("sh -c 'printf %s \"$1\" > \"$2\"' _ {device} {output}");
        camera.open(Facing::User).await.unwrap();

        let frame = camera.capture(Facing::User).await.unwrap();
        assert_eq!(frame.bytes, b"front0");
    }

    #[tokio::test]
    async fn test_command_camera_failure() {
        let mut camera = command_camera("sh -c 'echo no device >&2; exit 1'");
        camera.open(Facing::Environment).await.unwrap();

        let err = camera.capture(Facing::Environment).await.unwrap_err();
        assert!(matches!(err, CameraError::CaptureFailed(ref m) if m.contains("no device")));
    }

    #[tokio::test]
    async fn test_command_camera_unavailable() {
        let mut missing = command_camera("no-such-capture-tool {output}");
        assert!(matches!(
            missing.open(Facing::Environment).await,
            Err(CameraError::Unavailable(_))
        ));

        let mut empty = command_camera("  ");
        assert!(matches!(
            empty.open(Facing::Environment).await,
            Err(CameraError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_command_camera_capture_requires_open() {
        let mut camera = command_camera("true");
        assert!(camera.capture(Facing::Environment).await.is_err());
    }
}
