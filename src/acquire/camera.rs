//! Camera acquisition.
//!
//! Device enumeration happens once when the source is opened. The feed
//! itself is owned by the platform layer behind [`VideoFeed`]; taking a
//! photo rasterizes its most recent frame into an encoded payload.

use image::RgbaImage;

use crate::error::AcquireError;
use crate::payload::{CapturePayload, SourceKind};

/// One enumerated video-input device.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoDevice {
    pub id: String,
    pub label: String,
}

/// Platform device enumeration. The result may be empty.
pub trait DeviceInventory {
    /// Lists available video-input devices.
    ///
    /// Implementations report an OS permission denial as
    /// [`AcquireError::PermissionDenied`].
    fn video_inputs(&self) -> Result<Vec<VideoDevice>, AcquireError>;
}

/// A live camera feed that can be sampled for its current frame.
pub trait VideoFeed {
    fn current_frame(&self) -> Result<RgbaImage, AcquireError>;
}

/// Camera source with a selected active device.
pub struct CameraSource {
    devices: Vec<VideoDevice>,
    active: usize,
}

impl CameraSource {
    /// Enumerates devices and selects the first one.
    ///
    /// Fails with [`AcquireError::NoDevice`] when enumeration returns
    /// nothing; a permission denial propagates from the inventory.
    pub fn open(inventory: &dyn DeviceInventory) -> Result<Self, AcquireError> {
        let devices = inventory.video_inputs()?;
        if devices.is_empty() {
            return Err(AcquireError::NoDevice);
        }
        Ok(Self { devices, active: 0 })
    }

    pub fn devices(&self) -> &[VideoDevice] {
        &self.devices
    }

    pub fn active_device(&self) -> &VideoDevice {
        &self.devices[self.active]
    }

    /// Switches the active device by id.
    pub fn switch_device(&mut self, id: &str) -> Result<(), AcquireError> {
        match self.devices.iter().position(|d| d.id == id) {
            Some(index) => {
                self.active = index;
                Ok(())
            }
            None => Err(AcquireError::UnknownDevice(id.to_string())),
        }
    }

    /// Rasterizes the feed's current frame into a payload.
    pub fn take_photo(&self, feed: &dyn VideoFeed) -> Result<CapturePayload, AcquireError> {
        let frame = feed.current_frame()?;
        CapturePayload::from_image(&frame, SourceKind::Camera)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedInventory(Vec<VideoDevice>);

    impl DeviceInventory for FixedInventory {
        fn video_inputs(&self) -> Result<Vec<VideoDevice>, AcquireError> {
            Ok(self.0.clone())
        }
    }

    struct DeniedInventory;

    impl DeviceInventory for DeniedInventory {
        fn video_inputs(&self) -> Result<Vec<VideoDevice>, AcquireError> {
            Err(AcquireError::PermissionDenied("camera".to_string()))
        }
    }

    struct SolidFeed;

    impl VideoFeed for SolidFeed {
        fn current_frame(&self) -> Result<RgbaImage, AcquireError> {
            Ok(RgbaImage::from_pixel(8, 8, image::Rgba([255, 0, 0, 255])))
        }
    }

    fn device(id: &str) -> VideoDevice {
        VideoDevice {
            id: id.to_string(),
            label: format!("Camera {}", id),
        }
    }

    #[test]
    fn test_open_with_no_devices_fails() {
        let result = CameraSource::open(&FixedInventory(vec![]));
        assert!(matches!(result, Err(AcquireError::NoDevice)));
    }

    #[test]
    fn test_open_propagates_permission_denial() {
        let result = CameraSource::open(&DeniedInventory);
        assert!(matches!(result, Err(AcquireError::PermissionDenied(_))));
    }

    #[test]
    fn test_open_selects_first_device() {
        let source = CameraSource::open(&FixedInventory(vec![device("a"), device("b")])).unwrap();
        assert_eq!(source.active_device().id, "a");
        assert_eq!(source.devices().len(), 2);
    }

    #[test]
    fn test_switch_device() {
        let mut source =
            CameraSource::open(&FixedInventory(vec![device("a"), device("b")])).unwrap();
        source.switch_device("b").unwrap();
        assert_eq!(source.active_device().id, "b");
        assert!(matches!(
            source.switch_device("missing"),
            Err(AcquireError::UnknownDevice(_))
        ));
    }

    #[test]
    fn test_take_photo_produces_camera_payload() {
        let source = CameraSource::open(&FixedInventory(vec![device("a")])).unwrap();
        let payload = source.take_photo(&SolidFeed).unwrap();
        assert_eq!(payload.source, SourceKind::Camera);
        assert!(payload.data_url.starts_with("data:image/png;base64,"));
    }
}
