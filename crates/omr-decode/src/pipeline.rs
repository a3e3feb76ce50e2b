//! End-to-end sheet decoding: scan dump in, report out.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use omr_core::{order_row_major, BinaryImageError, GridOrderParams};
use omr_template::{BubbleGroup, FormLayout, Template};

use crate::classify::{
    filter_bubble_candidates, ClassifyError, ClassifyStrategy, GroupedRegions,
    HeuristicClassifier, HeuristicSplit, ShapeFilter, TemplateClassifier,
};
use crate::decode::{decode_answers, decode_exam_code, decode_roll, CodeDigits, ConflictPolicy, Markings};
use crate::fill::{marked_cells, FillParams};
use crate::grade::{grade, AnswerKey, GradeResult, ScoringRules};
use crate::registration::{require_markers, MarkerFrame, RegistrationError};
use crate::scan::SheetScan;

/// Tuning for a decoding run.
///
/// Every field has a production default, so a JSON params file only needs
/// the overrides (e.g. a lower fill threshold for low-resolution captures).
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DecodeParams {
    #[serde(default)]
    pub shape: ShapeFilter,
    #[serde(default)]
    pub split: HeuristicSplit,
    #[serde(default)]
    pub order: GridOrderParams,
    /// Fill threshold for the unguided pipeline.
    #[serde(default = "default_fill_unguided")]
    pub fill_unguided: FillParams,
    /// Fill threshold for the template-guided pipeline.
    #[serde(default = "default_fill_guided")]
    pub fill_guided: FillParams,
    #[serde(default)]
    pub policy: ConflictPolicy,
    #[serde(default)]
    pub scoring: ScoringRules,
}

fn default_fill_unguided() -> FillParams {
    FillParams::HEURISTIC
}

fn default_fill_guided() -> FillParams {
    FillParams::TEMPLATE_GUIDED
}

#[derive(thiserror::Error, Debug)]
pub enum ParamsIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl DecodeParams {
    /// Load decode parameters from a JSON file; absent fields keep their
    /// defaults.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ParamsIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            shape: ShapeFilter::default(),
            split: HeuristicSplit::default(),
            order: GridOrderParams::default(),
            fill_unguided: FillParams::HEURISTIC,
            fill_guided: FillParams::TEMPLATE_GUIDED,
            policy: ConflictPolicy::default(),
            scoring: ScoringRules::default(),
        }
    }
}

/// Decode-fatal conditions. Each aborts the current sheet only; the template
/// and other sheets are unaffected.
#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error("barcode not decoded")]
    BarcodeMissing,
    #[error(transparent)]
    Classify(#[from] ClassifyError),
    #[error(transparent)]
    Scan(#[from] BinaryImageError),
}

/// Everything decoded from one sheet.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SheetReport {
    /// Barcode payload identifying the sheet.
    pub sheet_id: String,
    pub exam_code: CodeDigits,
    pub roll: CodeDigits,
    pub answers: Markings,
    pub grade: Option<GradeResult>,
}

/// Decode one scanned sheet.
///
/// With a template, classification projects the template cells (drift
/// corrected) onto the scan and the guided fill threshold applies; without
/// one, the positional heuristic and the unguided threshold are used.
/// Grading runs when an answer key is given.
pub fn decode_sheet(
    scan: &SheetScan,
    template: Option<&Template>,
    key: Option<&AnswerKey>,
    params: &DecodeParams,
) -> Result<SheetReport, DecodeError> {
    scan.binary.validate()?;
    let (w, h) = (scan.width_f(), scan.height_f());

    let barcode = scan.barcode.as_ref().ok_or(DecodeError::BarcodeMissing)?;
    let candidates = filter_bubble_candidates(&scan.regions, &params.shape);

    let (grouped, fill, layout) = match template {
        Some(template) => {
            let frame = MarkerFrame::from_markers(&scan.markers, w, h)?;
            let classifier = TemplateClassifier {
                template,
                drift_y: frame.drift_y(template),
            };
            log::info!("template-guided decode, drift {:.2}%", classifier.drift_y);
            (
                classifier.classify(&candidates, w, h)?,
                params.fill_guided,
                template.layout,
            )
        }
        None => {
            require_markers(&scan.markers)?;
            let classifier = HeuristicClassifier {
                split: params.split,
            };
            log::info!("unguided decode ({} candidates)", candidates.len());
            (
                classifier.classify(&candidates, w, h)?,
                params.fill_unguided,
                FormLayout::default(),
            )
        }
    };

    let filled = |group: BubbleGroup| -> Vec<usize> {
        filled_cells(&grouped, group, scan, &params.order, &fill)
    };

    let exam_code = decode_exam_code(&filled(BubbleGroup::ExamCode), &layout, params.policy);
    let roll = decode_roll(&filled(BubbleGroup::Roll), &layout, params.policy);
    let answers = decode_answers(&filled(BubbleGroup::Answers), &layout, params.policy);
    log::info!(
        "sheet {}: exam code {:?}, roll {:?}, {} answers",
        barcode.payload,
        exam_code.text(),
        roll.text(),
        answers.choices.len()
    );

    let grade = key.map(|key| grade(&answers, key, &params.scoring));

    Ok(SheetReport {
        sheet_id: barcode.payload.clone(),
        exam_code,
        roll,
        answers,
        grade,
    })
}

/// Order one group's regions row-major and measure which cells are filled.
fn filled_cells(
    grouped: &GroupedRegions,
    group: BubbleGroup,
    scan: &SheetScan,
    order: &GridOrderParams,
    fill: &FillParams,
) -> Vec<usize> {
    let boxes: Vec<_> = grouped
        .group(group)
        .iter()
        .map(|r| r.bounding_box)
        .collect();
    let ordered: Vec<_> = order_row_major(&boxes, order)
        .into_iter()
        .map(|i| boxes[i])
        .collect();
    marked_cells(&ordered, &scan.binary.view(), fill)
}

impl SheetReport {
    /// Console rendering: sheet id, codes, the marking table, and the marks
    /// summary when a grade is present.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "OMR ID: {}", self.sheet_id);
        let _ = writeln!(out, "Exam Code: {}", self.exam_code.text());
        let _ = writeln!(out, "Roll Code: {}", self.roll.text());
        for (qno, choice) in &self.answers.choices {
            let pad = " ".repeat((qno.to_string().len() as i32 - 3).unsigned_abs() as usize);
            let _ = writeln!(out, "{qno}:{pad}{choice}");
        }
        if !self.answers.ambiguous.is_empty() {
            let _ = writeln!(out, "Ambiguous: {:?}", self.answers.ambiguous);
        }
        if let Some(grade) = &self.grade {
            let _ = writeln!(out, "Marks:");
            let _ = writeln!(out, "\t- Correct:     {}", grade.correct.len());
            let _ = writeln!(out, "\t- Incorrect:   {}", grade.incorrect.len());
            let _ = writeln!(out, "\t- Total marks: {}", grade.score);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibrate::{build_template, CalibrationParams};
    use crate::scan::tests_support::{
        grid_xy, mark_bubble, reference_scan, ANSWER_GRID, EXAM_GRID, ROLL_GRID,
    };
    use std::collections::BTreeMap;

    fn params() -> DecodeParams {
        DecodeParams {
            // The synthetic bubbles are 45x30 px; keep the guided threshold
            // below their area so both pipelines see the same fills.
            fill_guided: FillParams { min_pixels: 400 },
            ..DecodeParams::default()
        }
    }

    /// Mark question `q` with the given choice on the synthetic sheet.
    fn mark_answer(scan: &mut SheetScan, q: usize, choice: usize, dy: f32) {
        let layout = FormLayout::default();
        let block = (q - 1) / layout.answers.rows;
        let row = (q - 1) % layout.answers.rows;
        let col = block * layout.choices_per_question + choice;
        let (x, y) = grid_xy(ANSWER_GRID.0, ANSWER_GRID.1, row, col, ANSWER_GRID.2, ANSWER_GRID.3);
        mark_bubble(scan, x, y + dy);
    }

    #[test]
    fn unguided_decode_reads_codes_and_answers() {
        let mut scan = reference_scan();
        // Exam code: row 2 in column 0 -> 'C'. Roll: row 0 col 0 -> '1'.
        let (x, y) = grid_xy(EXAM_GRID.0, EXAM_GRID.1, 2, 0, EXAM_GRID.2, EXAM_GRID.3);
        mark_bubble(&mut scan, x, y);
        let (x, y) = grid_xy(ROLL_GRID.0, ROLL_GRID.1, 0, 0, ROLL_GRID.2, ROLL_GRID.3);
        mark_bubble(&mut scan, x, y);
        mark_answer(&mut scan, 1, 0, 0.0); // Q1: A
        mark_answer(&mut scan, 2, 2, 0.0); // Q2: C
        mark_answer(&mut scan, 15, 3, 0.0); // Q15: D

        let key = AnswerKey(BTreeMap::from([(1, 'A'), (2, 'B'), (3, 'C')]));
        let report = decode_sheet(&scan, None, Some(&key), &params()).unwrap();

        assert_eq!(report.sheet_id, "FORM-42");
        assert_eq!(report.exam_code.text(), "C");
        assert_eq!(report.roll.text(), "1");
        assert_eq!(report.answers.choices.get(&1), Some(&'A'));
        assert_eq!(report.answers.choices.get(&2), Some(&'C'));
        assert_eq!(report.answers.choices.get(&15), Some(&'D'));

        let grade = report.grade.as_ref().unwrap();
        assert_eq!(grade.correct.len(), 1);
        assert_eq!(grade.incorrect.len(), 1);
        assert_eq!(grade.unmarked.len(), 1);
        assert_eq!(grade.score, 2);

        let rendered = report.render();
        assert!(rendered.contains("OMR ID: FORM-42"));
        assert!(rendered.contains("1:  A"));
        assert!(rendered.contains("15: D"));
        assert!(rendered.contains("\t- Total marks: 2"));
    }

    #[test]
    fn guided_decode_survives_vertical_drift() {
        // Calibrate on the blank reference, then decode a sheet whose whole
        // content (markers, regions, ink) sits 40 px lower.
        let reference = reference_scan();
        let template =
            build_template(&reference, FormLayout::default(), &CalibrationParams::default())
                .unwrap();

        let dy = 40.0;
        let mut shifted = reference_scan();
        for marker in &mut shifted.markers {
            for corner in &mut marker.corners {
                corner.y += dy;
            }
        }
        for region in &mut shifted.regions {
            for p in &mut region.boundary {
                p.y += dy;
            }
            region.bounding_box.y += dy;
        }
        mark_answer(&mut shifted, 7, 1, dy); // Q7: B

        let report = decode_sheet(&shifted, Some(&template), None, &params()).unwrap();
        assert_eq!(report.answers.choices.get(&7), Some(&'B'));
        assert_eq!(report.answers.choices.len(), 1);
        assert!(report.grade.is_none());
    }

    #[test]
    fn params_file_overrides_only_what_it_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        std::fs::write(
            &path,
            r#"{"fill_guided": {"min_pixels": 400}, "policy": "reject"}"#,
        )
        .unwrap();
        let loaded = DecodeParams::load_json(&path).unwrap();
        assert_eq!(loaded.fill_guided.min_pixels, 400);
        assert_eq!(loaded.policy, ConflictPolicy::Reject);
        // Everything absent from the file keeps its production default.
        assert_eq!(loaded.fill_unguided.min_pixels, FillParams::HEURISTIC.min_pixels);
        assert_eq!(loaded.scoring.correct_points, ScoringRules::default().correct_points);
        assert_eq!(loaded.shape.min_width_px, ShapeFilter::default().min_width_px);
    }

    #[test]
    fn zero_markers_abort_the_sheet() {
        let mut scan = reference_scan();
        scan.markers.clear();
        assert!(matches!(
            decode_sheet(&scan, None, None, &params()),
            Err(DecodeError::Registration(_))
        ));
    }

    #[test]
    fn missing_barcode_aborts_the_sheet() {
        let mut scan = reference_scan();
        scan.barcode = None;
        assert!(matches!(
            decode_sheet(&scan, None, None, &params()),
            Err(DecodeError::BarcodeMissing)
        ));
    }

    #[test]
    fn guided_decode_with_missing_bubbles_is_fatal() {
        let reference = reference_scan();
        let template =
            build_template(&reference, FormLayout::default(), &CalibrationParams::default())
                .unwrap();
        let mut scan = reference_scan();
        scan.regions.pop();
        assert!(matches!(
            decode_sheet(&scan, Some(&template), None, &params()),
            Err(DecodeError::Classify(_))
        ));
    }
}
