//! Acquisition sources.
//!
//! Four ways to get an image into the pipeline:
//! - Camera (`CameraSource`): enumerated devices, take-photo from a live feed
//! - Screen share (`ScreenShare`): a lifecycle-managed live stream
//! - File upload (`payload_from_file`): image files read into memory
//! - Clipboard paste (`PasteWatcher`): the first image item of a paste
//!
//! All four converge on [`crate::payload::CapturePayload`], so downstream
//! code is source-agnostic. Acquisition failures stay inline with the
//! source control; they never transition the session.

pub mod camera;
pub mod file;
pub mod paste;
pub mod screen;

pub use camera::{CameraSource, DeviceInventory, VideoDevice, VideoFeed};
pub use file::payload_from_file;
pub use paste::{ClipboardItem, PasteWatcher};
pub use screen::{LiveStream, ScreenShare};
