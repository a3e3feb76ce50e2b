use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;

/// Borrowed view over a binarized (thresholded) image.
///
/// Row-major, one byte per pixel, any non-zero byte counts as foreground.
#[derive(Clone, Copy, Debug)]
pub struct BinaryImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8],
}

/// Owned binarized image, as produced by the external thresholding step and
/// carried inside a scan dump.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BinaryImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

#[derive(thiserror::Error, Debug)]
pub enum BinaryImageError {
    #[error("binary image buffer length mismatch (expected {expected} bytes, got {got})")]
    BufferLength { expected: usize, got: usize },
}

impl BinaryImage {
    pub fn new(width: usize, height: usize, data: Vec<u8>) -> Result<Self, BinaryImageError> {
        let expected = width * height;
        if data.len() != expected {
            return Err(BinaryImageError::BufferLength {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// All-background image of the given dimensions.
    pub fn blank(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            data: vec![0; width * height],
        }
    }

    pub fn view(&self) -> BinaryImageView<'_> {
        BinaryImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    /// Validate the buffer length after deserializing an untrusted dump.
    pub fn validate(&self) -> Result<(), BinaryImageError> {
        let expected = self.width * self.height;
        if self.data.len() != expected {
            return Err(BinaryImageError::BufferLength {
                expected,
                got: self.data.len(),
            });
        }
        Ok(())
    }
}

impl BinaryImageView<'_> {
    /// Count foreground pixels inside a rectangular mask.
    ///
    /// The rectangle is clipped to the image; off-image area contributes
    /// nothing. Both edges of the box are included, matching the filled
    /// rectangle mask the original pipeline drew.
    pub fn count_foreground_in_rect(&self, rect: &BoundingBox) -> u32 {
        if self.width == 0 || self.height == 0 {
            return 0;
        }
        let x0 = rect.x.max(0.0).floor() as usize;
        let y0 = rect.y.max(0.0).floor() as usize;
        let x1 = (rect.right().min(self.width as f32 - 1.0)).floor() as usize;
        let y1 = (rect.bottom().min(self.height as f32 - 1.0)).floor() as usize;
        if rect.right() < 0.0 || rect.bottom() < 0.0 || x0 > x1 || y0 > y1 {
            return 0;
        }

        let mut count = 0u32;
        for y in y0..=y1 {
            let row = &self.data[y * self.width..(y + 1) * self.width];
            count += row[x0..=x1].iter().filter(|&&v| v != 0).count() as u32;
        }
        count
    }
}
