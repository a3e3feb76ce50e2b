//! Sheet decoding and grading pipeline for OMR answer forms.
//!
//! The pipeline consumes a [`SheetScan`] (the serialized output of the
//! external image primitives: markers, barcode, contour regions, binarized
//! bitmap) and turns it into structured markings and a grade:
//!
//! 1. marker registration and drift correction ([`registration`])
//! 2. bubble-candidate filtering and group classification ([`classify`]),
//!    heuristic when no template is available, template-projected otherwise
//! 3. deterministic row-major ordering (`omr_core::order_row_major`)
//! 4. fill detection ([`fill`])
//! 5. grid-index decoding into exam code / roll / answers ([`decode`])
//! 6. grading against an answer key ([`grade`])
//!
//! Template calibration from a blank reference sheet lives in [`calibrate`].

pub mod calibrate;
pub mod classify;
pub mod decode;
pub mod fill;
pub mod grade;
pub mod pipeline;
pub mod registration;
pub mod scan;

pub use calibrate::{build_template, CalibrationError, CalibrationParams};
pub use classify::{
    filter_bubble_candidates, ClassifyError, ClassifyStrategy, GroupedRegions,
    HeuristicClassifier, HeuristicSplit, ShapeFilter, TemplateClassifier,
};
pub use decode::{
    decode_answers, decode_exam_code, decode_roll, CodeDigits, ConflictPolicy, Markings,
};
pub use fill::{marked_cells, FillParams};
pub use grade::{grade, AnswerKey, GradeResult, KeyIoError, ScoringRules};
pub use pipeline::{decode_sheet, DecodeError, DecodeParams, ParamsIoError, SheetReport};
pub use registration::{MarkerFrame, RegistrationError};
pub use scan::{SheetScan, ScanIoError};
