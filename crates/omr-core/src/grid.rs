use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;

/// Tuning for the row-major ordering of detected bubble boxes.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GridOrderParams {
    /// Row bucket size as a multiple of the tallest box in the group
    /// (dimensionless).
    ///
    /// The quantized `y / (factor * max_height)` value is the effective row.
    /// This assumes bubbles within one physical row vary in height by less
    /// than `factor - 1` and that the vertical gap between rows exceeds the
    /// bucket, both properties of the form layout rather than physics.
    pub row_unit_factor: f32,
}

impl Default for GridOrderParams {
    fn default() -> Self {
        Self {
            row_unit_factor: 1.2,
        }
    }
}

/// Row/column position derived from a flat grid index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPos {
    pub row: usize,
    pub col: usize,
}

impl GridPos {
    #[inline]
    pub fn from_index(index: usize, columns: usize) -> Self {
        Self {
            row: index / columns,
            col: index % columns,
        }
    }
}

/// Order an unordered set of bounding boxes into row-major grid positions.
///
/// Boxes whose `y` coordinates quantize to the same row bucket are treated as
/// one row and sorted left to right; buckets are sorted top to bottom. The
/// returned vector holds indices into `boxes`: position `k` in the result is
/// grid index `k`.
///
/// The sort key is a total order over the box fields, so any permutation of
/// the same box set yields the same sequence.
pub fn order_row_major(boxes: &[BoundingBox], params: &GridOrderParams) -> Vec<usize> {
    let Some(max_height) = boxes
        .iter()
        .map(|b| b.height)
        .max_by(f32::total_cmp)
    else {
        return Vec::new();
    };
    let row_unit = (params.row_unit_factor * max_height).max(1.0);

    let mut order: Vec<usize> = (0..boxes.len()).collect();
    order.sort_by(|&i, &j| {
        let (a, b) = (&boxes[i], &boxes[j]);
        let bucket_a = (row_unit * (a.y / row_unit).round()) as i64;
        let bucket_b = (row_unit * (b.y / row_unit).round()) as i64;
        bucket_a
            .cmp(&bucket_b)
            .then_with(|| a.x.total_cmp(&b.x))
            .then_with(|| a.y.total_cmp(&b.y))
            .then_with(|| a.width.total_cmp(&b.width))
            .then_with(|| a.height.total_cmp(&b.height))
    });
    order
}
