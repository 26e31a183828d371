use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::Question;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewFilter {
    #[default]
    All,
    Correct,
    Incorrect,
    Unanswered,
}

impl ReviewFilter {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "all" => Some(ReviewFilter::All),
            "correct" => Some(ReviewFilter::Correct),
            "incorrect" | "wrong" => Some(ReviewFilter::Incorrect),
            "unanswered" | "skipped" => Some(ReviewFilter::Unanswered),
            _ => None,
        }
    }

    pub fn matches(self, question: &Question, answer: Option<usize>) -> bool {
        match (self, answer) {
            (ReviewFilter::All, _) => true,
            (ReviewFilter::Correct, Some(a)) => question.is_correct(a),
            (ReviewFilter::Incorrect, Some(a)) => !question.is_correct(a),
            (ReviewFilter::Unanswered, None) => true,
            _ => false,
        }
    }
}

/// Original-set indices that pass `filter`, in original order. Never touches
/// the answer map; the returned indices are the new working view.
pub fn filter_indices(
    original: &[Arc<Question>],
    answers: &BTreeMap<usize, usize>,
    filter: ReviewFilter,
) -> Vec<usize> {
    original
        .iter()
        .enumerate()
        .filter(|(i, q)| filter.matches(q, answers.get(i).copied()))
        .map(|(i, _)| i)
        .collect()
}
