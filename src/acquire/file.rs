//! File-upload acquisition.
//!
//! Mirrors a native file chooser restricted to image MIME types: the
//! extension gate matches the chooser filter, and the content is decoded
//! to catch mislabeled files. The file is read fully into memory.

use std::fs;
use std::path::Path;

use crate::error::AcquireError;
use crate::payload::{CapturePayload, SourceKind, encode_data_url};

/// Extensions accepted by the chooser filter.
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp"];

/// Reads an image file fully into memory as a data-URL payload.
pub fn payload_from_file(path: &Path) -> Result<CapturePayload, AcquireError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AcquireError::UnsupportedImage(format!(
            "{} is not an image file",
            path.display()
        )));
    }

    let bytes = fs::read(path)?;
    let format = image::guess_format(&bytes).map_err(|e| {
        AcquireError::UnsupportedImage(format!("{}: {}", path.display(), e))
    })?;

    Ok(CapturePayload {
        data_url: encode_data_url(&bytes, format.to_mime_type()),
        source: SourceKind::FileUpload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::image_from_data_url;
    use image::RgbaImage;
    use tempfile::tempdir;

    #[test]
    fn test_reads_png_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shot.png");
        RgbaImage::from_pixel(5, 7, image::Rgba([1, 2, 3, 255]))
            .save(&path)
            .unwrap();

        let payload = payload_from_file(&path).unwrap();
        assert_eq!(payload.source, SourceKind::FileUpload);
        assert!(payload.data_url.starts_with("data:image/png;base64,"));
        assert_eq!(image_from_data_url(&payload.data_url).unwrap().dimensions(), (5, 7));
    }

    #[test]
    fn test_rejects_non_image_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello").unwrap();
        assert!(matches!(
            payload_from_file(&path),
            Err(AcquireError::UnsupportedImage(_))
        ));
    }

    #[test]
    fn test_rejects_mislabeled_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fake.png");
        std::fs::write(&path, "this is not a png").unwrap();
        assert!(matches!(
            payload_from_file(&path),
            Err(AcquireError::UnsupportedImage(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing.png");
        assert!(matches!(payload_from_file(&path), Err(AcquireError::Io(_))));
    }
}
