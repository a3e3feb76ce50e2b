//! Grading: compare decoded markings against an answer key.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::decode::Markings;

/// Correct choice per question; the key's domain defines the full question
/// set.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerKey(pub BTreeMap<u32, char>);

#[derive(thiserror::Error, Debug)]
pub enum KeyIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl AnswerKey {
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, KeyIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Demo key covering questions `1..=questions`: question `q` answers
    /// `'A' + q % 4`.
    pub fn demo(questions: u32) -> Self {
        Self(
            (1..=questions)
                .map(|q| (q, (b'A' + (q % 4) as u8) as char))
                .collect(),
        )
    }
}

/// Points awarded / deducted per question.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ScoringRules {
    pub correct_points: i32,
    pub incorrect_penalty: i32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            correct_points: 3,
            incorrect_penalty: 1,
        }
    }
}

/// Strict partition of the key's question domain plus the total score.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeResult {
    pub correct: BTreeSet<u32>,
    pub incorrect: BTreeSet<u32>,
    pub unmarked: BTreeSet<u32>,
    pub score: i32,
}

/// Partition the key's questions into correct / incorrect / unmarked and
/// compute the score. Never fails: a question absent from the markings is
/// unmarked, and markings outside the key's domain are ignored.
pub fn grade(markings: &Markings, key: &AnswerKey, rules: &ScoringRules) -> GradeResult {
    let mut result = GradeResult::default();
    for (&question, &expected) in &key.0 {
        match markings.choices.get(&question) {
            Some(&choice) if choice == expected => {
                result.correct.insert(question);
            }
            Some(_) => {
                result.incorrect.insert(question);
            }
            None => {
                result.unmarked.insert(question);
            }
        }
    }
    for question in markings.choices.keys() {
        if !key.0.contains_key(question) {
            log::warn!("marking for question {question} is outside the answer key; ignored");
        }
    }
    result.score = rules.correct_points * result.correct.len() as i32
        - rules.incorrect_penalty * result.incorrect.len() as i32;
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markings(entries: &[(u32, char)]) -> Markings {
        Markings {
            choices: entries.iter().copied().collect(),
            ambiguous: Vec::new(),
        }
    }

    fn key(entries: &[(u32, char)]) -> AnswerKey {
        AnswerKey(entries.iter().copied().collect())
    }

    #[test]
    fn partitions_the_key_domain() {
        let k = key(&[(1, 'A'), (2, 'B'), (3, 'C')]);
        let m = markings(&[(1, 'A'), (2, 'C')]);
        let g = grade(&m, &k, &ScoringRules::default());
        assert_eq!(g.correct, BTreeSet::from([1]));
        assert_eq!(g.incorrect, BTreeSet::from([2]));
        assert_eq!(g.unmarked, BTreeSet::from([3]));
        assert_eq!(g.score, 2);

        // The three sets are pairwise disjoint and cover the key.
        let mut all = BTreeSet::new();
        all.extend(&g.correct);
        all.extend(&g.incorrect);
        all.extend(&g.unmarked);
        assert_eq!(all.len(), g.correct.len() + g.incorrect.len() + g.unmarked.len());
        assert_eq!(all, k.0.keys().copied().collect::<BTreeSet<u32>>());
    }

    #[test]
    fn empty_markings_score_zero() {
        let k = key(&[(1, 'A'), (2, 'B')]);
        let g = grade(&Markings::default(), &k, &ScoringRules::default());
        assert_eq!(g.score, 0);
        assert_eq!(g.unmarked.len(), 2);
        assert!(g.correct.is_empty() && g.incorrect.is_empty());
    }

    #[test]
    fn score_may_go_negative() {
        let k = key(&[(1, 'A'), (2, 'B'), (3, 'C')]);
        let m = markings(&[(1, 'B'), (2, 'C'), (3, 'D')]);
        let g = grade(&m, &k, &ScoringRules::default());
        assert_eq!(g.score, -3);
    }

    #[test]
    fn markings_outside_the_key_are_ignored() {
        let k = key(&[(1, 'A')]);
        let m = markings(&[(1, 'A'), (99, 'D')]);
        let g = grade(&m, &k, &ScoringRules::default());
        assert_eq!(g.correct, BTreeSet::from([1]));
        assert_eq!(g.score, 3);
    }

    #[test]
    fn demo_key_pattern() {
        let k = AnswerKey::demo(8);
        assert_eq!(k.0.len(), 8);
        assert_eq!(k.0[&1], 'B');
        assert_eq!(k.0[&4], 'A');
        assert_eq!(k.0[&7], 'D');
    }
}
