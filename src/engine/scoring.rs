use std::collections::BTreeMap;
use std::sync::Arc;

use crate::catalog::Question;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub total: usize,
    pub answered: usize,
    pub correct: usize,
    pub wrong: usize,
    pub unanswered: usize,
}

/// Recount an attempt from scratch. Keys of `answers` are original-set indices.
pub fn tally(original: &[Arc<Question>], answers: &BTreeMap<usize, usize>) -> Tally {
    let mut t = Tally {
        total: original.len(),
        ..Default::default()
    };
    for (i, q) in original.iter().enumerate() {
        match answers.get(&i) {
            Some(&choice) if q.is_correct(choice) => {
                t.answered += 1;
                t.correct += 1;
            }
            Some(_) => {
                t.answered += 1;
                t.wrong += 1;
            }
            None => t.unanswered += 1,
        }
    }
    t
}

pub fn percentage(score: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (score as f64 / total as f64 * 100.0).round() as u32
}

#[derive(Clone, Debug, PartialEq)]
pub struct SourceBreakdown {
    pub topic_id: String,
    pub topic_name: String,
    pub total: usize,
    pub answered: usize,
    pub correct: usize,
    pub accuracy: f64,
}

/// Per-source-topic results of a mock exam, best accuracy first. Questions
/// without a source tag are ignored.
pub fn mock_breakdown(
    original: &[Arc<Question>],
    answers: &BTreeMap<usize, usize>,
) -> Vec<SourceBreakdown> {
    let mut rows: Vec<SourceBreakdown> = Vec::new();
    for (i, q) in original.iter().enumerate() {
        let Some(topic_id) = q.source_topic_id.as_deref() else {
            continue;
        };
        let pos = match rows.iter().position(|r| r.topic_id == topic_id) {
            Some(pos) => pos,
            None => {
                rows.push(SourceBreakdown {
                    topic_id: topic_id.to_string(),
                    topic_name: q
                        .source_topic_name
                        .clone()
                        .unwrap_or_else(|| topic_id.to_string()),
                    total: 0,
                    answered: 0,
                    correct: 0,
                    accuracy: 0.0,
                });
                rows.len() - 1
            }
        };
        let row = &mut rows[pos];
        row.total += 1;
        if let Some(&choice) = answers.get(&i) {
            row.answered += 1;
            if q.is_correct(choice) {
                row.correct += 1;
            }
        }
    }

    for row in &mut rows {
        row.accuracy = row.correct as f64 / row.total as f64 * 100.0;
    }
    rows.sort_by(|a, b| b.accuracy.total_cmp(&a.accuracy));
    rows
}
