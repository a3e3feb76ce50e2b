//! Fill detection: which ordered cells are actually marked.

use serde::{Deserialize, Serialize};

use omr_core::{BinaryImageView, BoundingBox};

/// Fill decision threshold.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FillParams {
    /// Minimum foreground pixel count inside a cell's bounding box for the
    /// cell to count as filled. Absolute pixels, calibrated per capture
    /// resolution.
    pub min_pixels: u32,
}

impl FillParams {
    /// Threshold used by the unguided pipeline.
    pub const HEURISTIC: FillParams = FillParams { min_pixels: 400 };
    /// Threshold used by the template-guided pipeline, whose reference
    /// captures run at a higher resolution.
    pub const TEMPLATE_GUIDED: FillParams = FillParams { min_pixels: 2000 };
}

impl Default for FillParams {
    fn default() -> Self {
        Self::HEURISTIC
    }
}

/// Return the grid indices of the filled cells, ascending.
///
/// Each cell is measured through its bounding box rather than its exact
/// boundary: bubble outlines are near-rectangular, and a rectangle mask is
/// cheaper and tolerant of boundary noise.
pub fn marked_cells(
    ordered_boxes: &[BoundingBox],
    binary: &BinaryImageView<'_>,
    params: &FillParams,
) -> Vec<usize> {
    ordered_boxes
        .iter()
        .enumerate()
        .filter(|(_, b)| binary.count_foreground_in_rect(b) > params.min_pixels)
        .map(|(idx, _)| idx)
        .collect()
}
