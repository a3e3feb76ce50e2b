use serde::{Deserialize, Serialize};

/// The three logical bubble groups on a sheet.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BubbleGroup {
    ExamCode,
    Roll,
    Answers,
}

impl BubbleGroup {
    pub const ALL: [BubbleGroup; 3] = [
        BubbleGroup::ExamCode,
        BubbleGroup::Roll,
        BubbleGroup::Answers,
    ];

    pub fn name(self) -> &'static str {
        match self {
            BubbleGroup::ExamCode => "exam-code",
            BubbleGroup::Roll => "roll",
            BubbleGroup::Answers => "answers",
        }
    }
}

/// Grid dimensions of one bubble group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupLayout {
    pub rows: usize,
    pub columns: usize,
}

impl GroupLayout {
    pub const fn new(rows: usize, columns: usize) -> Self {
        Self { rows, columns }
    }

    /// Number of bubbles the group must contain.
    #[inline]
    pub const fn expected_cells(&self) -> usize {
        self.rows * self.columns
    }
}

/// Geometry of a whole form: all group grids plus the answer-block shape.
///
/// Decoding arithmetic (row/column splits, question numbering) derives from
/// these values, so an alternate form layout is a data change rather than a
/// code change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormLayout {
    pub exam_code: GroupLayout,
    pub roll: GroupLayout,
    pub answers: GroupLayout,
    /// Answer choices per question; the answer grid is
    /// `answers.columns / choices_per_question` side-by-side question blocks.
    pub choices_per_question: usize,
}

impl Default for FormLayout {
    /// The stock sheet: 5×5 exam code, 10×7 roll, 10×12 answers in three
    /// 4-choice blocks of 10 questions each.
    fn default() -> Self {
        Self {
            exam_code: GroupLayout::new(5, 5),
            roll: GroupLayout::new(10, 7),
            answers: GroupLayout::new(10, 12),
            choices_per_question: 4,
        }
    }
}

impl FormLayout {
    pub fn group(&self, group: BubbleGroup) -> &GroupLayout {
        match group {
            BubbleGroup::ExamCode => &self.exam_code,
            BubbleGroup::Roll => &self.roll,
            BubbleGroup::Answers => &self.answers,
        }
    }

    /// Number of side-by-side question blocks in the answer grid.
    #[inline]
    pub fn answer_blocks(&self) -> usize {
        self.answers.columns / self.choices_per_question
    }

    /// Questions covered by the answer grid.
    #[inline]
    pub fn question_count(&self) -> usize {
        self.answers.rows * self.answer_blocks()
    }

    /// Total bubbles across all groups.
    pub fn total_cells(&self) -> usize {
        BubbleGroup::ALL
            .iter()
            .map(|&g| self.group(g).expected_cells())
            .sum()
    }
}
