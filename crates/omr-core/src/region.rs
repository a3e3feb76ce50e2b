use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;

/// A detected closed boundary from the external contour extractor.
///
/// The boundary winding is preserved in `signed_area`: the extractor reports
/// one sign for outer/background boundaries and the opposite for the nested
/// boundaries the bubble filter keeps. `Region` values are transient, produced
/// per decoding run and discarded after classification.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Region {
    pub boundary: Vec<Point2<f32>>,
    pub bounding_box: BoundingBox,
    pub signed_area: f32,
}

impl Region {
    /// Build a region from a closed boundary, deriving the bounding box and
    /// the shoelace signed area.
    ///
    /// Returns `None` for boundaries with fewer than 3 vertices, which cannot
    /// enclose anything.
    pub fn from_boundary(boundary: Vec<Point2<f32>>) -> Option<Self> {
        if boundary.len() < 3 {
            return None;
        }
        let bounding_box = BoundingBox::around(&boundary)?;
        let signed_area = shoelace_area(&boundary);
        Some(Self {
            boundary,
            bounding_box,
            signed_area,
        })
    }

    /// Boundary-inclusive point-in-region test.
    ///
    /// The bounding box acts as a cheap reject before the polygon test.
    pub fn contains(&self, p: Point2<f32>) -> bool {
        self.bounding_box.contains(p) && point_in_polygon(&self.boundary, p)
    }
}

/// Shoelace formula. Positive for counter-clockwise winding in a y-down
/// image coordinate frame matches the convention of the contour extractor.
fn shoelace_area(boundary: &[Point2<f32>]) -> f32 {
    let mut acc = 0.0f32;
    for (i, a) in boundary.iter().enumerate() {
        let b = &boundary[(i + 1) % boundary.len()];
        acc += a.x * b.y - b.x * a.y;
    }
    acc * 0.5
}

/// Ray-crossing test, counting the point as inside when it lies on an edge.
fn point_in_polygon(boundary: &[Point2<f32>], p: Point2<f32>) -> bool {
    let n = boundary.len();
    let mut inside = false;
    for i in 0..n {
        let a = boundary[i];
        let b = boundary[(i + 1) % n];
        if on_segment(a, b, p) {
            return true;
        }
        // Horizontal ray to +x; half-open edge interval avoids double
        // counting at shared vertices.
        if (a.y > p.y) != (b.y > p.y) {
            let t = (p.y - a.y) / (b.y - a.y);
            let cross_x = a.x + t * (b.x - a.x);
            if p.x < cross_x {
                inside = !inside;
            }
        }
    }
    inside
}

fn on_segment(a: Point2<f32>, b: Point2<f32>, p: Point2<f32>) -> bool {
    let cross = (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x);
    if cross.abs() > 1e-4 {
        return false;
    }
    let dot = (p.x - a.x) * (b.x - a.x) + (p.y - a.y) * (b.y - a.y);
    let len2 = (b.x - a.x).powi(2) + (b.y - a.y).powi(2);
    dot >= 0.0 && dot <= len2
}
