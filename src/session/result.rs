use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::TopicDescriptor;
use crate::engine::scoring::{self, Tally};
use crate::session::QuizMode;

/// Outcome of one finalized attempt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    pub mode: QuizMode,
    pub total: usize,
    pub answered: usize,
    pub correct: usize,
    pub wrong: usize,
    pub unanswered: usize,
    /// Number of correct answers, recomputed from the answer map.
    pub score: usize,
    /// Countdown remainder (exam) or elapsed seconds (practice).
    pub clock_secs: u32,
    #[serde(default)]
    pub timed_out: bool,
    pub completed_at: DateTime<Utc>,
}

impl QuizResult {
    pub fn from_tally(mode: QuizMode, tally: Tally, clock_secs: u32, timed_out: bool) -> Self {
        Self {
            mode,
            total: tally.total,
            answered: tally.answered,
            correct: tally.correct,
            wrong: tally.wrong,
            unanswered: tally.unanswered,
            score: tally.correct,
            clock_secs,
            timed_out,
            completed_at: Utc::now(),
        }
    }

    pub fn percentage(&self) -> u32 {
        scoring::percentage(self.score, self.total)
    }
}

/// One line of per-user history, the input to progress analytics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub topic_id: String,
    pub topic_name: String,
    pub mode: QuizMode,
    pub score_percentage: u32,
    pub total_questions: usize,
    pub created_at: DateTime<Utc>,
}

impl AttemptRecord {
    pub fn from_result(topic: &TopicDescriptor, result: &QuizResult) -> Self {
        Self {
            topic_id: topic.id.clone(),
            topic_name: topic.name.clone(),
            mode: result.mode,
            score_percentage: result.percentage(),
            total_questions: result.total,
            created_at: result.completed_at,
        }
    }
}
