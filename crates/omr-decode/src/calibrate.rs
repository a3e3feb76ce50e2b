//! Template calibration from a blank reference sheet.

use serde::{Deserialize, Serialize};

use omr_core::{order_row_major, GridOrderParams, NormPoint, Region};
use omr_template::{BubbleGroup, FormLayout, Template};

use crate::classify::{
    filter_bubble_candidates, ClassifyError, ClassifyStrategy, HeuristicClassifier,
    HeuristicSplit, ShapeFilter,
};
use crate::registration::{MarkerFrame, RegistrationError};
use crate::scan::SheetScan;

/// Tuning for the one-time calibration run.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct CalibrationParams {
    #[serde(default)]
    pub shape: ShapeFilter,
    #[serde(default)]
    pub split: HeuristicSplit,
    #[serde(default)]
    pub order: GridOrderParams,
}

/// Calibration-fatal conditions: the reference sheet is malformed or
/// mis-scanned, and the operator must re-capture. No partial template is
/// produced.
#[derive(thiserror::Error, Debug)]
pub enum CalibrationError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error("barcode not decoded on the reference sheet")]
    BarcodeMissing,
    #[error(transparent)]
    Classify(#[from] ClassifyError),
}

/// Build a [`Template`] from a reference scan, assumed blank or
/// representative.
///
/// The reference must carry both markers, a decodable barcode, and exactly
/// the layout's bubble counts after shape filtering and the positional
/// split; any mismatch is fatal.
pub fn build_template(
    scan: &SheetScan,
    layout: FormLayout,
    params: &CalibrationParams,
) -> Result<Template, CalibrationError> {
    let (w, h) = (scan.width_f(), scan.height_f());

    let frame = MarkerFrame::from_markers(&scan.markers, w, h)?;
    let barcode = scan.barcode.as_ref().ok_or(CalibrationError::BarcodeMissing)?;
    let qr_anchor = NormPoint::from_pixel(barcode.top_left(), w, h);

    let candidates = filter_bubble_candidates(&scan.regions, &params.shape);
    log::debug!(
        "{} of {} regions pass the bubble shape gate",
        candidates.len(),
        scan.regions.len()
    );

    let classifier = HeuristicClassifier {
        split: params.split,
    };
    let grouped = classifier.classify(&candidates, w, h)?;
    grouped.check_counts(&layout)?;

    let ordered_cells = |group: BubbleGroup| -> Vec<NormPoint> {
        let regions = grouped.group(group);
        let boxes: Vec<_> = regions.iter().map(|r| r.bounding_box).collect();
        order_row_major(&boxes, &params.order)
            .into_iter()
            .map(|i| NormPoint::from_pixel(boxes[i].center(), w, h))
            .collect()
    };

    let exam_code_cells = ordered_cells(BubbleGroup::ExamCode);
    let roll_cells = ordered_cells(BubbleGroup::Roll);
    let answer_cells = ordered_cells(BubbleGroup::Answers);

    let (avg_bubble_width, avg_bubble_height) = average_bubble_size(
        grouped
            .exam_code
            .iter()
            .chain(&grouped.roll)
            .chain(&grouped.answers),
        w,
        h,
    );

    let template = Template {
        layout,
        qr_anchor,
        marker_anchors: frame.anchors,
        aspect_ratio: w / h,
        exam_code_cells,
        roll_cells,
        answer_cells,
        avg_bubble_width,
        avg_bubble_height,
    };
    log::info!(
        "calibrated template: {} bubbles, avg size {:.2}x{:.2}%",
        layout.total_cells(),
        template.avg_bubble_width,
        template.avg_bubble_height
    );
    Ok(template)
}

/// Mean bubble box size as percent of image dimensions.
fn average_bubble_size<'a>(
    regions: impl Iterator<Item = &'a Region>,
    width: f32,
    height: f32,
) -> (f32, f32) {
    let mut n = 0usize;
    let (mut w_sum, mut h_sum) = (0.0f32, 0.0f32);
    for r in regions {
        w_sum += r.bounding_box.width;
        h_sum += r.bounding_box.height;
        n += 1;
    }
    if n == 0 {
        return (0.0, 0.0);
    }
    let n = n as f32;
    (
        (w_sum / n) * 100.0 / width,
        (h_sum / n) * 100.0 / height,
    )
}
