use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use omr_core::NormPoint;

use crate::layout::{BubbleGroup, FormLayout};

/// Calibration artifact built once from a blank reference sheet.
///
/// All positions are percent-of-image-size, so the template can be projected
/// onto scans of any resolution. Built by `omr-decode::calibrate`, persisted
/// as JSON, and read-only afterwards.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Template {
    /// Form geometry the cell sequences were calibrated against.
    pub layout: FormLayout,
    /// Top-left of the 2D barcode on the reference sheet.
    pub qr_anchor: NormPoint,
    /// Top-left corners of markers 0 and 1.
    pub marker_anchors: [NormPoint; 2],
    /// Width/height of the reference image.
    pub aspect_ratio: f32,
    /// Bubble centroids per group, in row-major grid order.
    pub exam_code_cells: Vec<NormPoint>,
    pub roll_cells: Vec<NormPoint>,
    pub answer_cells: Vec<NormPoint>,
    /// Mean bubble size as percent of image dimensions; a tolerance hint for
    /// consumers, not used in projection itself.
    pub avg_bubble_width: f32,
    pub avg_bubble_height: f32,
}

#[derive(thiserror::Error, Debug)]
pub enum TemplateError {
    #[error("{group} cell count mismatch (expected {expected}, got {got})")]
    CellCount {
        group: &'static str,
        expected: usize,
        got: usize,
    },
}

#[derive(thiserror::Error, Debug)]
pub enum TemplateIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Invalid(#[from] TemplateError),
}

impl Template {
    /// Cell sequence for a logical group.
    pub fn cells(&self, group: BubbleGroup) -> &[NormPoint] {
        match group {
            BubbleGroup::ExamCode => &self.exam_code_cells,
            BubbleGroup::Roll => &self.roll_cells,
            BubbleGroup::Answers => &self.answer_cells,
        }
    }

    /// Check every group's cell count against the recorded layout.
    pub fn check_counts(&self) -> Result<(), TemplateError> {
        for group in BubbleGroup::ALL {
            let expected = self.layout.group(group).expected_cells();
            let got = self.cells(group).len();
            if got != expected {
                return Err(TemplateError::CellCount {
                    group: group.name(),
                    expected,
                    got,
                });
            }
        }
        Ok(())
    }

    /// Load a template from a JSON file, validating cell counts.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, TemplateIoError> {
        let raw = fs::read_to_string(path)?;
        let template: Template = serde_json::from_str(&raw)?;
        template.check_counts()?;
        Ok(template)
    }

    /// Write this template to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), TemplateIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Aspect Ratio: {:.2}", self.aspect_ratio)?;
        writeln!(
            f,
            "Avg W,H: {:.2},{:.2}",
            self.avg_bubble_width, self.avg_bubble_height
        )?;
        writeln!(
            f,
            "    Marker #0: {:.2},{:.2}",
            self.marker_anchors[0].x, self.marker_anchors[0].y
        )?;
        write!(
            f,
            "    Marker #1: {:.2},{:.2}",
            self.marker_anchors[1].x, self.marker_anchors[1].y
        )
    }
}
