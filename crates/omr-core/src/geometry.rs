use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// A location expressed as percentage of image width/height.
///
/// All template and registration data is stored in this form so that a
/// template built from one capture resolution can be projected onto any
/// other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NormPoint {
    /// Percent of image width, `0.0..=100.0` for on-image points.
    pub x: f32,
    /// Percent of image height.
    pub y: f32,
}

impl NormPoint {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Normalize a pixel-space point against image dimensions.
    pub fn from_pixel(p: Point2<f32>, width: f32, height: f32) -> Self {
        Self {
            x: p.x * 100.0 / width,
            y: p.y * 100.0 / height,
        }
    }

    /// Project back into pixel space for an image of the given dimensions.
    pub fn to_pixel(self, width: f32, height: f32) -> Point2<f32> {
        Point2::new(self.x * width / 100.0, self.y * height / 100.0)
    }
}

/// Axis-aligned bounding box in pixel coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> Point2<f32> {
        Point2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Width/height ratio. Returns `f32::INFINITY` for degenerate boxes.
    pub fn aspect_ratio(&self) -> f32 {
        if self.height <= 0.0 {
            f32::INFINITY
        } else {
            self.width / self.height
        }
    }

    /// Boundary-inclusive containment test.
    pub fn contains(&self, p: Point2<f32>) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }

    /// Smallest box covering a point set. `None` for an empty set.
    pub fn around(points: &[Point2<f32>]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y) = (first.x, first.y);
        let (mut max_x, mut max_y) = (first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        })
    }
}
