//! Error taxonomy for the capture pipeline.
//!
//! Acquisition errors are surfaced inline next to the source control and
//! never move the session state machine. Recognition errors always land
//! the session in the error stage and require an explicit retry. Report
//! errors are notification-only.

use thiserror::Error;

/// An acquisition source failed to produce a payload.
#[derive(Debug, Error)]
pub enum AcquireError {
    /// Device enumeration returned zero video inputs.
    #[error("no camera device available")]
    NoDevice,
    /// The requested device id is not in the enumerated inventory.
    #[error("unknown video device: {0}")]
    UnknownDevice(String),
    /// The operator or OS denied access to the camera or screen.
    #[error("capture permission denied: {0}")]
    PermissionDenied(String),
    /// No live screen-share stream to snapshot.
    #[error("no active screen share")]
    NoStream,
    /// The chosen file or pasted item is not a decodable image.
    #[error("unsupported image: {0}")]
    UnsupportedImage(String),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

// io::Error is not Clone, so the Io variant is rebuilt from its kind
// and message.
impl Clone for AcquireError {
    fn clone(&self) -> Self {
        match self {
            Self::NoDevice => Self::NoDevice,
            Self::UnknownDevice(id) => Self::UnknownDevice(id.clone()),
            Self::PermissionDenied(why) => Self::PermissionDenied(why.clone()),
            Self::NoStream => Self::NoStream,
            Self::UnsupportedImage(why) => Self::UnsupportedImage(why.clone()),
            Self::Io(err) => Self::Io(std::io::Error::new(err.kind(), err.to_string())),
        }
    }
}

/// Recognition failed or returned nothing usable.
///
/// Carries the operator-visible message shown on the error screen. Both
/// the local worker and the remote service produce this same shape, so
/// the session cannot tell the strategies apart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("the scan could not be captured: {message}")]
pub struct RecognitionError {
    pub message: String,
}

impl RecognitionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// The failure-report upload could not complete.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The upload-credential request failed.
    #[error("credential request failed: {0}")]
    Credential(String),
    /// The blob upload to the signed destination failed.
    #[error("upload failed: {0}")]
    Upload(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognition_error_message() {
        let err = RecognitionError::new("nothing usable in frame");
        assert_eq!(
            err.to_string(),
            "the scan could not be captured: nothing usable in frame"
        );
    }

    #[test]
    fn test_acquire_io_clone_keeps_kind_and_message() {
        let original = AcquireError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "device node missing",
        ));
        let copy = original.clone();
        match copy {
            AcquireError::Io(err) => {
                assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
                assert_eq!(err.to_string(), "device node missing");
            }
            other => panic!("unexpected variant: {:?}", other),
        }
    }

    #[test]
    fn test_acquire_error_display() {
        assert_eq!(
            AcquireError::NoDevice.to_string(),
            "no camera device available"
        );
        assert_eq!(
            AcquireError::PermissionDenied("camera".to_string()).to_string(),
            "capture permission denied: camera"
        );
    }
}
