//! Bubble-candidate filtering and group classification.
//!
//! Two interchangeable strategies behind [`ClassifyStrategy`]: an
//! absolute-position heuristic for sheets decoded without calibration, and a
//! template-projected point-in-region matcher used once a [`Template`]
//! exists.

use serde::{Deserialize, Serialize};

use omr_core::Region;
use omr_template::{BubbleGroup, FormLayout, Template};

/// Shape gate separating bubble boundaries from everything else the contour
/// extractor returns.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ShapeFilter {
    /// Accepted width/height band (inclusive).
    pub min_aspect_ratio: f32,
    pub max_aspect_ratio: f32,
    /// Accepted pixel width band (exclusive). Absolute pixels: this is tied
    /// to the reference capture resolution, not normalized.
    pub min_width_px: f32,
    pub max_width_px: f32,
}

impl Default for ShapeFilter {
    fn default() -> Self {
        Self {
            min_aspect_ratio: 1.3,
            max_aspect_ratio: 1.7,
            min_width_px: 30.0,
            max_width_px: 120.0,
        }
    }
}

impl ShapeFilter {
    /// Whether a region looks like a bubble boundary.
    ///
    /// Negative signed area selects the inner contour winding, dropping
    /// outer/background boundaries of the same shapes.
    pub fn accepts(&self, region: &Region) -> bool {
        let ratio = region.bounding_box.aspect_ratio();
        ratio >= self.min_aspect_ratio
            && ratio <= self.max_aspect_ratio
            && region.bounding_box.width > self.min_width_px
            && region.bounding_box.width < self.max_width_px
            && region.signed_area < 0.0
    }
}

/// Keep only the regions that pass the bubble shape gate.
pub fn filter_bubble_candidates(regions: &[Region], filter: &ShapeFilter) -> Vec<Region> {
    regions
        .iter()
        .filter(|r| filter.accepts(r))
        .cloned()
        .collect()
}

/// Candidate regions split into the three logical groups.
#[derive(Clone, Debug, Default)]
pub struct GroupedRegions {
    pub exam_code: Vec<Region>,
    pub roll: Vec<Region>,
    pub answers: Vec<Region>,
}

impl GroupedRegions {
    pub fn group(&self, group: BubbleGroup) -> &[Region] {
        match group {
            BubbleGroup::ExamCode => &self.exam_code,
            BubbleGroup::Roll => &self.roll,
            BubbleGroup::Answers => &self.answers,
        }
    }

    fn group_mut(&mut self, group: BubbleGroup) -> &mut Vec<Region> {
        match group {
            BubbleGroup::ExamCode => &mut self.exam_code,
            BubbleGroup::Roll => &mut self.roll,
            BubbleGroup::Answers => &mut self.answers,
        }
    }

    /// Check each group's region count against the layout's expected bubble
    /// counts.
    pub fn check_counts(&self, layout: &FormLayout) -> Result<(), ClassifyError> {
        for group in BubbleGroup::ALL {
            let expected = layout.group(group).expected_cells();
            let got = self.group(group).len();
            if got != expected {
                return Err(ClassifyError::BubbleCount {
                    group: group.name(),
                    expected,
                    got,
                });
            }
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ClassifyError {
    #[error("{group} bubble count mismatch (expected {expected}, got {got})")]
    BubbleCount {
        group: &'static str,
        expected: usize,
        got: usize,
    },
}

/// Partition shape-qualified candidates into exam-code / roll / answer
/// groups.
pub trait ClassifyStrategy {
    fn classify(
        &self,
        candidates: &[Region],
        width: f32,
        height: f32,
    ) -> Result<GroupedRegions, ClassifyError>;
}

/// Fixed-layout position split, used when no calibration exists.
///
/// Assumes the exam-code block top-left, the roll block top-right, and the
/// answer block spanning the lower part of the page. Brittle to layout
/// drift.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct HeuristicSplit {
    /// Fraction of image width separating exam-code (left) from roll
    /// (right).
    pub mid_x_frac: f32,
    /// Fraction of image height above which everything is an answer bubble.
    pub answer_band_frac: f32,
}

impl Default for HeuristicSplit {
    fn default() -> Self {
        Self {
            mid_x_frac: 0.5,
            answer_band_frac: 0.4,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicClassifier {
    pub split: HeuristicSplit,
}

impl ClassifyStrategy for HeuristicClassifier {
    fn classify(
        &self,
        candidates: &[Region],
        width: f32,
        height: f32,
    ) -> Result<GroupedRegions, ClassifyError> {
        let mid_x = width * self.split.mid_x_frac;
        let answer_y = height * self.split.answer_band_frac;

        let mut grouped = GroupedRegions::default();
        for region in candidates {
            let b = &region.bounding_box;
            if b.y > answer_y {
                grouped.answers.push(region.clone());
            } else if b.x > mid_x {
                grouped.roll.push(region.clone());
            } else if b.x < mid_x {
                grouped.exam_code.push(region.clone());
            }
            // A box exactly on the split line belongs to neither block.
        }
        log::debug!(
            "heuristic split: {} exam-code, {} roll, {} answer candidates",
            grouped.exam_code.len(),
            grouped.roll.len(),
            grouped.answers.len()
        );
        Ok(grouped)
    }
}

/// Template-projected classification: a candidate joins a group when at
/// least one of that group's template cells, projected into pixel space with
/// the drift correction applied, lands inside the candidate's boundary.
///
/// Counts are checked against the template's layout; a mismatch aborts the
/// run (a single bad scan, not a calibration problem).
#[derive(Clone, Copy, Debug)]
pub struct TemplateClassifier<'a> {
    pub template: &'a Template,
    /// Vertical drift in percent of image height, from
    /// `MarkerFrame::drift_y`.
    pub drift_y: f32,
}

impl ClassifyStrategy for TemplateClassifier<'_> {
    fn classify(
        &self,
        candidates: &[Region],
        width: f32,
        height: f32,
    ) -> Result<GroupedRegions, ClassifyError> {
        let mut grouped = GroupedRegions::default();
        for group in BubbleGroup::ALL {
            let members = grouped.group_mut(group);
            for region in candidates {
                let hit = self.template.cells(group).iter().any(|cell| {
                    let corrected = omr_core::NormPoint::new(cell.x, cell.y - self.drift_y);
                    region.contains(corrected.to_pixel(width, height))
                });
                if hit {
                    members.push(region.clone());
                }
            }
        }
        grouped.check_counts(&self.template.layout)?;
        Ok(grouped)
    }
}
