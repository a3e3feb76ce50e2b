//! End-to-end regression: calibrate on a synthetic reference sheet, persist
//! the template, and decode a drifted, partially inked sheet through the
//! public API.

use nalgebra::Point2;

use omr_core::{Barcode, BinaryImage, Marker, Region};
use omr_decode::{
    build_template, decode_sheet, AnswerKey, CalibrationParams, DecodeParams, FillParams,
    SheetScan,
};
use omr_template::{FormLayout, Template};

const W: u32 = 1000;
const H: u32 = 1400;
const BUBBLE: (f32, f32) = (45.0, 30.0);

// (x0, y0, pitch_x, pitch_y) per group.
const EXAM: (f32, f32, f32, f32) = (100.0, 150.0, 60.0, 55.0);
const ROLL: (f32, f32, f32, f32) = (600.0, 80.0, 55.0, 45.0);
const ANSWERS: (f32, f32, f32, f32) = (60.0, 620.0, 75.0, 70.0);

fn bubble(x: f32, y: f32) -> Region {
    // Counter-clockwise: negative signed area, kept by the shape filter.
    Region::from_boundary(vec![
        Point2::new(x, y),
        Point2::new(x, y + BUBBLE.1),
        Point2::new(x + BUBBLE.0, y + BUBBLE.1),
        Point2::new(x + BUBBLE.0, y),
    ])
    .unwrap()
}

fn cell_xy(grid: (f32, f32, f32, f32), row: usize, col: usize) -> (f32, f32) {
    (grid.0 + col as f32 * grid.2, grid.1 + row as f32 * grid.3)
}

fn square(x: f32, y: f32, side: f32) -> [Point2<f32>; 4] {
    [
        Point2::new(x, y),
        Point2::new(x + side, y),
        Point2::new(x + side, y + side),
        Point2::new(x, y + side),
    ]
}

fn blank_sheet() -> SheetScan {
    let mut regions = Vec::new();
    for (grid, rows, cols) in [(EXAM, 5, 5), (ROLL, 10, 7), (ANSWERS, 10, 12)] {
        for row in 0..rows {
            for col in 0..cols {
                let (x, y) = cell_xy(grid, row, col);
                regions.push(bubble(x, y));
            }
        }
    }
    SheetScan {
        width: W,
        height: H,
        markers: vec![
            Marker {
                id: 0,
                corners: square(20.0, 28.0, 50.0),
            },
            Marker {
                id: 1,
                corners: square(20.0, 1330.0, 50.0),
            },
        ],
        barcode: Some(Barcode {
            payload: "MIDTERM-07".to_owned(),
            corners: square(850.0, 30.0, 60.0),
        }),
        regions,
        binary: BinaryImage::blank(W as usize, H as usize),
    }
}

fn shift_down(scan: &mut SheetScan, dy: f32) {
    for marker in &mut scan.markers {
        for c in &mut marker.corners {
            c.y += dy;
        }
    }
    for region in &mut scan.regions {
        for p in &mut region.boundary {
            p.y += dy;
        }
        region.bounding_box.y += dy;
    }
}

fn ink(scan: &mut SheetScan, x: f32, y: f32) {
    let (w, h) = (BUBBLE.0 as usize, BUBBLE.1 as usize);
    let (x, y) = (x as usize, y as usize);
    for py in y..y + h {
        for px in x..x + w {
            scan.binary.data[py * scan.binary.width + px] = 255;
        }
    }
}

fn ink_answer(scan: &mut SheetScan, question: usize, choice: usize, dy: f32) {
    let layout = FormLayout::default();
    let block = (question - 1) / layout.answers.rows;
    let row = (question - 1) % layout.answers.rows;
    let (x, y) = cell_xy(ANSWERS, row, block * layout.choices_per_question + choice);
    ink(scan, x, y + dy);
}

#[test]
fn calibrate_persist_and_decode_a_drifted_sheet() {
    let reference = blank_sheet();
    let template = build_template(&reference, FormLayout::default(), &CalibrationParams::default())
        .expect("calibration");

    // Round-trip the template through disk like the CLI does.
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("template.json");
    template.write_json(&path).unwrap();
    let template = Template::load_json(&path).unwrap();

    // The scanned sheet drifted 35 px down. Ink the exam code "B" in
    // column 0, roll digit '3' in column 0, and three answers.
    let dy = 35.0;
    let mut sheet = blank_sheet();
    shift_down(&mut sheet, dy);

    let (x, y) = cell_xy(EXAM, 1, 0);
    ink(&mut sheet, x, y + dy);
    let (x, y) = cell_xy(ROLL, 2, 0);
    ink(&mut sheet, x, y + dy);
    ink_answer(&mut sheet, 1, 0, dy); // Q1: A
    ink_answer(&mut sheet, 12, 1, dy); // Q12: B
    ink_answer(&mut sheet, 30, 3, dy); // Q30: D

    let key = AnswerKey(
        [(1u32, 'A'), (12, 'B'), (30, 'C'), (2, 'D')]
            .into_iter()
            .collect(),
    );
    let params = DecodeParams {
        // Synthetic bubbles are 45x30 px, below the production guided
        // threshold.
        fill_guided: FillParams { min_pixels: 400 },
        ..DecodeParams::default()
    };
    let report = decode_sheet(&sheet, Some(&template), Some(&key), &params).expect("decode");

    assert_eq!(report.sheet_id, "MIDTERM-07");
    assert_eq!(report.exam_code.text(), "B");
    assert_eq!(report.roll.text(), "3");
    assert_eq!(report.answers.choices.len(), 3);
    assert_eq!(report.answers.choices.get(&1), Some(&'A'));
    assert_eq!(report.answers.choices.get(&12), Some(&'B'));
    assert_eq!(report.answers.choices.get(&30), Some(&'D'));

    let grade = report.grade.unwrap();
    // Q1 and Q12 correct, Q30 wrong, Q2 unmarked: 2*3 - 1 = 5.
    assert_eq!(grade.correct.len(), 2);
    assert_eq!(grade.incorrect.len(), 1);
    assert_eq!(grade.unmarked.len(), 1);
    assert_eq!(grade.score, 5);
}

#[test]
fn unguided_and_guided_agree_on_an_undrifted_sheet() {
    let reference = blank_sheet();
    let template = build_template(&reference, FormLayout::default(), &CalibrationParams::default())
        .unwrap();

    let mut sheet = blank_sheet();
    ink_answer(&mut sheet, 5, 2, 0.0); // Q5: C

    let params = DecodeParams {
        fill_guided: FillParams { min_pixels: 400 },
        ..DecodeParams::default()
    };
    let guided = decode_sheet(&sheet, Some(&template), None, &params).unwrap();
    let unguided = decode_sheet(&sheet, None, None, &params).unwrap();
    assert_eq!(guided.answers, unguided.answers);
    assert_eq!(guided.answers.choices.get(&5), Some(&'C'));
}
