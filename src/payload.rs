//! Capture payloads and structured recognition results.
//!
//! Every acquisition source converges on `CapturePayload`, so the rest of
//! the pipeline never cares where an image came from. Images travel as
//! data URLs and are dropped as soon as the session no longer needs them.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{ImageFormat, RgbaImage};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

use crate::error::AcquireError;

/// Which acquisition source produced a payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceKind {
    Camera,
    ScreenShare,
    FileUpload,
    Paste,
}

/// The category of on-screen UI being recognized.
///
/// Selects both the default crop region and the recognition routine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureKind {
    /// An order-confirmation screen.
    OrderConfirmation,
    /// A resource-scan readout.
    ResourceScan,
}

impl CaptureKind {
    /// All recognizable kinds, in a stable order.
    pub const ALL: [CaptureKind; 2] = [CaptureKind::OrderConfirmation, CaptureKind::ResourceScan];

    /// Key under which this kind's crop region is persisted.
    pub fn storage_key(self) -> &'static str {
        match self {
            CaptureKind::OrderConfirmation => "order_confirmation",
            CaptureKind::ResourceScan => "resource_scan",
        }
    }
}

/// An in-memory image produced by an acquisition source.
///
/// Immutable once produced. A new acquisition replaces it wholesale and a
/// session reset drops it.
#[derive(Clone, Debug, PartialEq)]
pub struct CapturePayload {
    /// Binary-encoded image as a `data:` URL.
    pub data_url: String,
    pub source: SourceKind,
}

impl CapturePayload {
    /// Rasterizes a frame into a PNG-encoded payload.
    pub fn from_image(img: &RgbaImage, source: SourceKind) -> Result<Self, AcquireError> {
        Ok(Self {
            data_url: png_data_url(img)?,
            source,
        })
    }
}

/// One recognized order line from an order-confirmation screen.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub material: String,
    pub quantity: u32,
    pub unit_price: f64,
}

/// A single resource reading from a scan readout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceReading {
    pub name: String,
    pub amount: u32,
}

/// A recognized resource-scan readout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScanRecord {
    pub mass: u32,
    pub resources: Vec<ResourceReading>,
}

/// Structured output of a recognition routine.
///
/// Produced only by the recognition runtime and never partially
/// constructed: a routine yields a complete record or fails.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RecognitionResult {
    Order(OrderRecord),
    Scan(ScanRecord),
}

/// Encodes raw image bytes as a data URL with the given MIME type.
pub fn encode_data_url(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

/// Decodes a data URL back into its MIME type and raw bytes.
pub fn decode_data_url(url: &str) -> Result<(String, Vec<u8>), AcquireError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| AcquireError::UnsupportedImage("not a data URL".to_string()))?;
    let (mime, encoded) = rest
        .split_once(";base64,")
        .ok_or_else(|| AcquireError::UnsupportedImage("data URL is not base64".to_string()))?;
    let bytes = BASE64
        .decode(encoded)
        .map_err(|e| AcquireError::UnsupportedImage(format!("bad base64 payload: {}", e)))?;
    Ok((mime.to_string(), bytes))
}

/// PNG-encodes a frame into a data URL.
pub fn png_data_url(img: &RgbaImage) -> Result<String, AcquireError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| AcquireError::UnsupportedImage(format!("PNG encode failed: {}", e)))?;
    Ok(encode_data_url(&buf, "image/png"))
}

/// Decodes a data URL into a pixel buffer.
pub fn image_from_data_url(url: &str) -> Result<RgbaImage, AcquireError> {
    let (_, bytes) = decode_data_url(url)?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| AcquireError::UnsupportedImage(format!("image decode failed: {}", e)))?;
    Ok(img.to_rgba8())
}
