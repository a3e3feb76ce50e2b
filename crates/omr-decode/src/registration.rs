//! Marker registration: normalized anchor frame and drift correction.

use omr_core::{Marker, NormPoint};
use omr_template::Template;

/// Errors from registering detected markers against the expected layout.
#[derive(thiserror::Error, Debug)]
pub enum RegistrationError {
    #[error("marker not found (expected {expected} markers, detected {got})")]
    MarkerNotFound { expected: usize, got: usize },
    #[error("marker id {id} missing from detection")]
    MarkerIdMissing { id: u32 },
}

/// Normalized coordinate frame derived from the two layout markers.
///
/// Anchors are the markers' top-left corners in percent-of-image-size,
/// indexed by marker id.
#[derive(Clone, Copy, Debug)]
pub struct MarkerFrame {
    pub anchors: [NormPoint; 2],
}

impl MarkerFrame {
    /// Build a frame from the detected marker set of an image of the given
    /// dimensions. Requires markers 0 and 1 to be present.
    pub fn from_markers(
        markers: &[Marker],
        width: f32,
        height: f32,
    ) -> Result<Self, RegistrationError> {
        if markers.len() < 2 {
            return Err(RegistrationError::MarkerNotFound {
                expected: 2,
                got: markers.len(),
            });
        }
        let anchor = |id: u32| -> Result<NormPoint, RegistrationError> {
            markers
                .iter()
                .find(|m| m.id == id)
                .map(|m| NormPoint::from_pixel(m.top_left(), width, height))
                .ok_or(RegistrationError::MarkerIdMissing { id })
        };
        Ok(Self {
            anchors: [anchor(0)?, anchor(1)?],
        })
    }

    /// Vertical drift of this sheet relative to the reference template, in
    /// percent of image height.
    ///
    /// Positive when the sheet's content sits higher than the reference.
    /// Subtracting the drift from a template cell's `y` before projection
    /// compensates for the scan offset; the correction is applied to every
    /// group uniformly.
    pub fn drift_y(&self, template: &Template) -> f32 {
        template.marker_anchors[1].y - self.anchors[1].y
    }
}

/// Check the minimum marker requirement of the unguided pipeline.
pub fn require_markers(markers: &[Marker]) -> Result<(), RegistrationError> {
    if markers.is_empty() {
        return Err(RegistrationError::MarkerNotFound {
            expected: 1,
            got: 0,
        });
    }
    Ok(())
}
