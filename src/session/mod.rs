pub mod quiz;
pub mod result;
pub mod review;
pub mod timer;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizMode {
    Practice,
    Exam,
    Review,
}

impl QuizMode {
    pub fn as_str(self) -> &'static str {
        match self {
            QuizMode::Practice => "practice",
            QuizMode::Exam => "exam",
            QuizMode::Review => "review",
        }
    }

    /// Only live attempts are snapshotted; reviews are re-derivable.
    pub fn is_resumable(self) -> bool {
        matches!(self, QuizMode::Practice | QuizMode::Exam)
    }
}

/// Which kind of review a `Review` session is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewContext {
    /// Walkthrough of an unattempted set with every answer revealed.
    Study,
    /// Inspection of a finished attempt.
    Session,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    PracticeActive,
    ExamActive,
    ReviewStudy,
    ReviewSession,
    Completed,
}
