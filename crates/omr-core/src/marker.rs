use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// A fiducial marker reported by the external detector.
///
/// Corners follow the detection order: top-left, top-right, bottom-right,
/// bottom-left. Within one image marker ids are unique; the sheet layout
/// places markers 0 and 1 at fixed anchor positions.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Marker {
    pub id: u32,
    pub corners: [Point2<f32>; 4],
}

impl Marker {
    /// The corner used as the marker's anchor point.
    #[inline]
    pub fn top_left(&self) -> Point2<f32> {
        self.corners[0]
    }
}

/// Decoded 2D barcode: payload plus corner quad in detection order.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Barcode {
    pub payload: String,
    pub corners: [Point2<f32>; 4],
}

impl Barcode {
    #[inline]
    pub fn top_left(&self) -> Point2<f32> {
        self.corners[0]
    }
}
