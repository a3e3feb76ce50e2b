use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use omr_core::{Barcode, BinaryImage, BinaryImageError, Marker, Region};

/// Base threshold the external binarizer combines with Otsu; recorded here so
/// every scan-dump producer agrees on the convention (inverted binary, max
/// value [`BINARIZE_MAX_VALUE`]).
pub const BINARIZE_BASE_THRESHOLD: u8 = 60;
pub const BINARIZE_MAX_VALUE: u8 = 200;

/// Serialized output of the external image primitives for one sheet.
///
/// This is the seam between the decoding engine and the image-processing
/// collaborator: marker/barcode detection, contour extraction and
/// binarization (with [`BINARIZE_BASE_THRESHOLD`] and [`BINARIZE_MAX_VALUE`])
/// all happen upstream; the engine only ever sees this value.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SheetScan {
    pub width: u32,
    pub height: u32,
    pub markers: Vec<Marker>,
    pub barcode: Option<Barcode>,
    /// Closed boundaries from the contour extractor, unfiltered.
    pub regions: Vec<Region>,
    /// Binarized image the fill detector counts against.
    pub binary: BinaryImage,
}

#[derive(thiserror::Error, Debug)]
pub enum ScanIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Binary(#[from] BinaryImageError),
}

impl SheetScan {
    /// Load a scan dump from a JSON file, validating the bitmap buffer.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ScanIoError> {
        let raw = fs::read_to_string(path)?;
        let scan: SheetScan = serde_json::from_str(&raw)?;
        scan.binary.validate()?;
        Ok(scan)
    }

    /// Write this scan dump to disk as JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ScanIoError> {
        let json = serde_json::to_string(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    #[inline]
    pub fn width_f(&self) -> f32 {
        self.width as f32
    }

    #[inline]
    pub fn height_f(&self) -> f32 {
        self.height as f32
    }
}
