//! Crop region persistence.
//!
//! One region is stored per capture kind in a JSON file under a fixed
//! key layout, so the choice survives restarts and is shared by every
//! dialog of the same kind. A missing or unparsable store falls back to
//! the built-in defaults.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use tracing::warn;

use crate::payload::CaptureKind;

/// Coordinate convention for a crop region.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionUnit {
    /// Values are 0-100, relative to the image dimensions.
    Percent,
    /// Values are absolute pixels.
    Pixel,
}

/// The sub-rectangle of an acquired image that is sent to recognition.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CropRegion {
    pub unit: RegionUnit,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CropRegion {
    /// The "use the entire image" region. Valid, and rendered differently
    /// from a partial crop by the host.
    pub const SELECT_ALL: CropRegion = CropRegion {
        unit: RegionUnit::Percent,
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    /// Zero width and height means the whole frame by convention.
    pub fn is_select_all(&self) -> bool {
        self.width == 0.0 && self.height == 0.0
    }

    pub fn percent(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            unit: RegionUnit::Percent,
            x,
            y,
            width,
            height,
        }
    }

    pub fn pixel(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            unit: RegionUnit::Pixel,
            x,
            y,
            width,
            height,
        }
    }
}

/// Built-in default region for a capture kind.
pub fn default_region(kind: CaptureKind) -> CropRegion {
    match kind {
        // Order confirmations sit in a centered dialog.
        CaptureKind::OrderConfirmation => CropRegion::percent(20.0, 10.0, 60.0, 80.0),
        // Scan readouts vary by screen layout; start with the whole frame.
        CaptureKind::ResourceScan => CropRegion::SELECT_ALL,
    }
}

/// Persisted crop regions, one optional override per capture kind.
///
/// `region()` never fails: a corrupt store is logged and treated as
/// empty. Writes merge with the overrides of unrelated kinds.
pub struct RegionStore {
    path: PathBuf,
}

impl RegionStore {
    /// Opens a store backed by the given JSON file. The file need not
    /// exist yet; it is created on the first write.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default store location under the user's config directory.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("capscan")
            .join("regions.json")
    }

    /// Returns the persisted override for `kind`, or the built-in default.
    pub fn region(&self, kind: CaptureKind) -> CropRegion {
        self.load()
            .get(kind.storage_key())
            .copied()
            .unwrap_or_else(|| default_region(kind))
    }

    /// Persists an override for `kind` without touching other kinds.
    pub fn set_region(&self, kind: CaptureKind, region: CropRegion) -> io::Result<()> {
        let mut stored = self.load();
        stored.insert(kind.storage_key().to_string(), region);
        self.save(&stored)
    }

    /// Removes the override for `kind`, reverting to the default.
    pub fn reset_region(&self, kind: CaptureKind) -> io::Result<()> {
        let mut stored = self.load();
        if stored.remove(kind.storage_key()).is_some() {
            self.save(&stored)?;
        }
        Ok(())
    }

    /// True when `kind` currently resolves to its built-in default.
    ///
    /// Drives whether a "reset" affordance is offered.
    pub fn is_default(&self, kind: CaptureKind) -> bool {
        self.region(kind) == default_region(kind)
    }

    fn load(&self) -> HashMap<String, CropRegion> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(_) => return HashMap::new(),
        };
        match serde_json::from_str(&contents) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "unreadable region store, using defaults");
                HashMap::new()
            }
        }
    }

    fn save(&self, stored: &HashMap<String, CropRegion>) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(stored).map_err(io::Error::other)?;
        fs::write(&self.path, json)
    }
}

/// Applies a crop region to a frame.
///
/// Percent regions scale with the frame; pixel regions are used as-is.
/// Out-of-bounds values are clamped rather than rejected, and the
/// select-all region returns the full frame.
pub fn crop_to_region(img: &image::RgbaImage, region: &CropRegion) -> image::RgbaImage {
    if region.is_select_all() {
        return img.clone();
    }

    let (w, h) = img.dimensions();
    let (rx, ry, rw, rh) = match region.unit {
        RegionUnit::Percent => (
            region.x / 100.0 * w as f32,
            region.y / 100.0 * h as f32,
            region.width / 100.0 * w as f32,
            region.height / 100.0 * h as f32,
        ),
        RegionUnit::Pixel => (region.x, region.y, region.width, region.height),
    };

    let x = (rx.max(0.0) as u32).min(w.saturating_sub(1));
    let y = (ry.max(0.0) as u32).min(h.saturating_sub(1));
    let cw = (rw.max(1.0) as u32).min(w - x);
    let ch = (rh.max(1.0) as u32).min(h - y);

    image::imageops::crop_imm(img, x, y, cw, ch).to_image()
}
