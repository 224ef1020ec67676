//! Screen-share acquisition.
//!
//! Wraps a user-approved window capture stream as a lifecycle object.
//! The live stream never leaves the process; only a frame rasterized at
//! submit time does. Teardown stops every track synchronously so the OS
//! capture indicator cannot be left lit.

use image::RgbaImage;
use tracing::debug;

use crate::error::AcquireError;
use crate::payload::{CapturePayload, SourceKind};

/// A live window-capture stream obtained from the platform.
pub trait LiveStream: Send {
    /// Rasterizes the stream's current frame.
    fn grab_frame(&self) -> Result<RgbaImage, AcquireError>;

    /// Stops and disables every track backing the stream. Must be
    /// idempotent.
    fn stop_tracks(&mut self);

    /// True while at least one track is still live.
    fn is_live(&self) -> bool;
}

/// Screen-share source owning an optional active stream.
///
/// Owned by the capture dialog, not the process: constructed when the
/// dialog mounts and torn down deterministically when it closes.
#[derive(Default)]
pub struct ScreenShare {
    stream: Option<Box<dyn LiveStream>>,
}

impl ScreenShare {
    pub fn new() -> Self {
        Self { stream: None }
    }

    /// Adopts a freshly approved stream. Starting while already active is
    /// a no-op; the superfluous stream is stopped and dropped.
    pub fn start(&mut self, mut stream: Box<dyn LiveStream>) {
        if self.is_active() {
            debug!("screen share already active, stopping superfluous stream");
            stream.stop_tracks();
            return;
        }
        self.stream = Some(stream);
    }

    /// Stops and disables all tracks. No-op when inactive.
    pub fn stop(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop_tracks();
            debug!("screen share stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.stream.as_ref().is_some_and(|s| s.is_live())
    }

    /// Rasterizes the current frame into a payload. This is the only
    /// point where screen-share pixels leave the stream.
    pub fn snapshot(&self) -> Result<CapturePayload, AcquireError> {
        let stream = self.stream.as_ref().ok_or(AcquireError::NoStream)?;
        let frame = stream.grab_frame()?;
        CapturePayload::from_image(&frame, SourceKind::ScreenShare)
    }
}

impl Drop for ScreenShare {
    fn drop(&mut self) {
        self.stop();
    }
}
