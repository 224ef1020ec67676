//! Image capabilities for recognition routines.
//!
//! Recognition routines were written against a drawing surface and an
//! image decoder. The worker thread provides neither natively, so both
//! are injected through [`ImageEnvironment`] instead of being reached
//! for as ambient globals. Production code uses [`BitmapEnvironment`];
//! tests may inject fakes.

use image::RgbaImage;

use crate::error::RecognitionError;
use crate::payload::{image_from_data_url, png_data_url};

/// A decoded bitmap with its dimensions exposed.
pub struct DecodedImage {
    bitmap: RgbaImage,
}

impl DecodedImage {
    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }

    pub fn bitmap(&self) -> &RgbaImage {
        &self.bitmap
    }
}

/// An off-thread drawing surface.
///
/// `draw_image` substitutes the decoded bitmap transparently, so a
/// routine can composite decoded images without knowing how they were
/// decoded.
pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Composites a decoded image onto the canvas at the given offset.
    pub fn draw_image(&mut self, src: &DecodedImage, x: i64, y: i64) {
        image::imageops::overlay(&mut self.image, &src.bitmap, x, y);
    }

    /// Read access to the composited pixels for routine math.
    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Re-encodes the canvas contents as a PNG data URL.
    pub fn to_data_url(&self) -> Result<String, RecognitionError> {
        png_data_url(&self.image).map_err(|e| RecognitionError::new(e.to_string()))
    }
}

/// The capability boundary recognition routines depend on.
pub trait ImageEnvironment: Send {
    fn create_canvas(&self, width: u32, height: u32) -> Canvas;

    fn decode_image(&self, data_url: &str) -> Result<DecodedImage, RecognitionError>;
}

/// Bitmap-based environment for the worker thread.
pub struct BitmapEnvironment;

impl ImageEnvironment for BitmapEnvironment {
    fn create_canvas(&self, width: u32, height: u32) -> Canvas {
        Canvas::new(width, height)
    }

    fn decode_image(&self, data_url: &str) -> Result<DecodedImage, RecognitionError> {
        let bitmap =
            image_from_data_url(data_url).map_err(|e| RecognitionError::new(e.to_string()))?;
        Ok(DecodedImage { bitmap })
    }
}
