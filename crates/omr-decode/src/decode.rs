//! Grid decoding: filled grid indices to exam code, roll number and answers.
//!
//! All decoders are pure functions over the filled-index set. Collisions
//! (several filled cells mapping to the same logical slot) are resolved by an
//! explicit [`ConflictPolicy`] instead of silent overwrite.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use omr_core::GridPos;
use omr_template::FormLayout;

/// Characters printed alongside the exam-code rows, top to bottom.
pub const EXAM_CODE_ROW_CHARS: [char; 5] = ['A', 'B', 'C', '1', '2'];

/// How to resolve several candidate fills landing in one logical slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
    /// Keep the first candidate in grid order.
    FirstMark,
    /// Keep the last candidate in grid order (the overwrite order of the
    /// historical pipeline).
    #[default]
    LastMark,
    /// Leave the slot empty and report it as ambiguous.
    Reject,
}

impl ConflictPolicy {
    fn resolve<T: Copy>(self, candidates: &[T]) -> Option<T> {
        match self {
            ConflictPolicy::FirstMark => candidates.first().copied(),
            ConflictPolicy::LastMark => candidates.last().copied(),
            ConflictPolicy::Reject => {
                if candidates.len() == 1 {
                    Some(candidates[0])
                } else {
                    None
                }
            }
        }
    }
}

/// Decoded answer markings: at most one choice per question.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Markings {
    pub choices: BTreeMap<u32, char>,
    /// Questions with more than one filled choice, resolved (or dropped)
    /// per the conflict policy.
    pub ambiguous: Vec<u32>,
}

/// Decoded positional code (exam code or roll number), one slot per column.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeDigits {
    pub columns: Vec<Option<char>>,
    /// Columns with more than one filled row.
    pub ambiguous: Vec<usize>,
}

impl CodeDigits {
    /// Concatenation of the present columns. An unmarked column contributes
    /// nothing, so a partially marked code comes out shorter than the column
    /// count.
    pub fn text(&self) -> String {
        self.columns.iter().flatten().collect()
    }
}

fn collect_slots<K: Ord + Copy, V: Copy>(
    filled: impl Iterator<Item = (K, V)>,
) -> BTreeMap<K, Vec<V>> {
    let mut slots: BTreeMap<K, Vec<V>> = BTreeMap::new();
    for (slot, value) in filled {
        slots.entry(slot).or_default().push(value);
    }
    slots
}

/// Decode filled answer-grid indices into per-question choices.
///
/// The answer grid is `layout.answer_blocks()` side-by-side question blocks
/// of `choices_per_question` columns each: for a filled index,
/// `question = row + block * rows + 1` and the choice letter is `'A'` plus
/// the column within the block.
pub fn decode_answers(filled: &[usize], layout: &FormLayout, policy: ConflictPolicy) -> Markings {
    let columns = layout.answers.columns;
    let choices = layout.choices_per_question;
    let rows_per_block = layout.answers.rows;

    let slots = collect_slots(filled.iter().map(|&idx| {
        let pos = GridPos::from_index(idx, columns);
        let block = pos.col / choices;
        let question = (pos.row + block * rows_per_block + 1) as u32;
        let choice = (b'A' + (pos.col % choices) as u8) as char;
        (question, choice)
    }));

    let mut markings = Markings::default();
    for (question, candidates) in slots {
        if candidates.len() > 1 {
            log::warn!(
                "question {question} has {} filled choices: {candidates:?}",
                candidates.len()
            );
            markings.ambiguous.push(question);
        }
        if let Some(choice) = policy.resolve(&candidates) {
            markings.choices.insert(question, choice);
        }
    }
    markings
}

fn decode_code<F>(filled: &[usize], columns: usize, policy: ConflictPolicy, row_char: F) -> CodeDigits
where
    F: Fn(usize) -> Option<char>,
{
    let slots = collect_slots(
        filled
            .iter()
            .map(|&idx| GridPos::from_index(idx, columns))
            .filter_map(|pos| row_char(pos.row).map(|c| (pos.col, c))),
    );

    let mut digits = CodeDigits {
        columns: vec![None; columns],
        ambiguous: Vec::new(),
    };
    for (col, candidates) in slots {
        if candidates.len() > 1 {
            log::warn!("code column {col} has {} filled rows", candidates.len());
            digits.ambiguous.push(col);
        }
        digits.columns[col] = policy.resolve(&candidates);
    }
    digits
}

/// Decode filled exam-code indices: each row maps to a fixed character from
/// [`EXAM_CODE_ROW_CHARS`], each column holds one character of the code.
pub fn decode_exam_code(
    filled: &[usize],
    layout: &FormLayout,
    policy: ConflictPolicy,
) -> CodeDigits {
    decode_code(filled, layout.exam_code.columns, policy, |row| {
        EXAM_CODE_ROW_CHARS.get(row).copied()
    })
}

/// Decode filled roll-number indices: row `r` means digit `(r + 1) mod 10`.
pub fn decode_roll(filled: &[usize], layout: &FormLayout, policy: ConflictPolicy) -> CodeDigits {
    decode_code(filled, layout.roll.columns, policy, |row| {
        char::from_digit(((row + 1) % 10) as u32, 10)
    })
}
