use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{debug, info};

use crate::catalog::Question;
use crate::engine::scoring;
use crate::session::result::QuizResult;
use crate::session::review::{self, ReviewFilter};
use crate::session::timer::{Timer, TimerDirection, TimerNotice, TimerSettings};
use crate::session::{QuizMode, ReviewContext, SessionState};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReviewExit {
    /// Study walkthrough finished; back to choosing a mode.
    ToModeSelection,
    /// Post-attempt review finished; show the results.
    ToResults,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NavOutcome {
    Moved(usize),
    /// Gated by mode rules; nothing changed.
    Blocked,
    Finished(QuizResult),
    ExitReview(ReviewExit),
    /// The session is already completed.
    Ignored,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Revealed { correct: bool },
    Ignored,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickOutcome {
    pub notices: Vec<TimerNotice>,
    pub finished: Option<QuizResult>,
}

/// Session state persisted mid-attempt, replayed by [`QuizSession::restore`].
#[derive(Clone, Debug)]
pub struct ResumeParts {
    pub mode: QuizMode,
    pub questions: Vec<Arc<Question>>,
    pub current_index: usize,
    pub answers: Vec<Option<usize>>,
    pub feedback_shown: Vec<bool>,
    pub time_left: u32,
}

/// One quiz attempt or review pass.
///
/// `answers` and `feedback` are keyed by position in the original set; the
/// working view is a list of original indices, so filtering never disturbs
/// recorded answers.
#[derive(Clone, Debug)]
pub struct QuizSession {
    mode: QuizMode,
    review_context: Option<ReviewContext>,
    /// Mode the answers were given in; differs from `mode` while reviewing.
    attempt_mode: QuizMode,
    original: Vec<Arc<Question>>,
    working: Vec<usize>,
    current: usize,
    answers: BTreeMap<usize, usize>,
    feedback: BTreeSet<usize>,
    timer: Timer,
    settings: TimerSettings,
    filter: ReviewFilter,
    completed: bool,
    timed_out: bool,
    full_set: Option<Vec<Arc<Question>>>,
}

impl QuizSession {
    /// Start a fresh session. `Review` mode starts a study walkthrough.
    /// Returns `None` for an empty pool.
    pub fn new(mode: QuizMode, pool: Vec<Arc<Question>>, settings: TimerSettings) -> Option<Self> {
        if pool.is_empty() {
            return None;
        }
        let timer = match mode {
            QuizMode::Exam => Timer::countdown(pool.len(), settings.clone()),
            QuizMode::Practice => Timer::count_up(pool.len(), settings.clone()),
            QuizMode::Review => Timer::idle(settings.clone()),
        };
        let review_context = (mode == QuizMode::Review).then_some(ReviewContext::Study);
        info!(mode = mode.as_str(), questions = pool.len(), "session started");
        Some(Self {
            mode,
            review_context,
            attempt_mode: mode,
            working: (0..pool.len()).collect(),
            original: pool,
            current: 0,
            answers: BTreeMap::new(),
            feedback: BTreeSet::new(),
            timer,
            settings,
            filter: ReviewFilter::All,
            completed: false,
            timed_out: false,
            full_set: None,
        })
    }

    /// Rebuild a live session from persisted parts, clamping every replayed
    /// value into range for the restored question set.
    pub fn restore(parts: ResumeParts, settings: TimerSettings) -> Option<Self> {
        if !parts.mode.is_resumable() {
            return None;
        }
        let mut session = Self::new(parts.mode, parts.questions, settings)?;
        let len = session.original.len();

        session.answers = parts
            .answers
            .into_iter()
            .take(len)
            .enumerate()
            .filter_map(|(i, a)| a.map(|a| (i, a)))
            .filter(|&(i, a)| a < session.original[i].options.len())
            .collect();
        if session.mode == QuizMode::Practice {
            session.feedback = parts
                .feedback_shown
                .into_iter()
                .take(len)
                .enumerate()
                .filter(|&(i, shown)| shown && session.answers.contains_key(&i))
                .map(|(i, _)| i)
                .collect();
        }
        session.current = parts.current_index.min(len - 1);

        let direction = match session.mode {
            QuizMode::Exam => TimerDirection::Down,
            _ => TimerDirection::Up,
        };
        let time_left = match direction {
            TimerDirection::Down => parts.time_left.min(session.settings.budget_for(len)),
            TimerDirection::Up => parts.time_left,
        };
        session.timer = Timer::resume(direction, time_left, len, session.settings.clone());
        info!(
            mode = session.mode.as_str(),
            current = session.current,
            answered = session.answers.len(),
            time_left,
            "session restored"
        );
        Some(session)
    }

    pub fn state(&self) -> SessionState {
        if self.completed {
            return SessionState::Completed;
        }
        match (self.mode, self.review_context) {
            (QuizMode::Practice, _) => SessionState::PracticeActive,
            (QuizMode::Exam, _) => SessionState::ExamActive,
            (QuizMode::Review, Some(ReviewContext::Session)) => SessionState::ReviewSession,
            (QuizMode::Review, _) => SessionState::ReviewStudy,
        }
    }

    pub fn mode(&self) -> QuizMode {
        self.mode
    }

    pub fn attempt_mode(&self) -> QuizMode {
        self.attempt_mode
    }

    pub fn review_context(&self) -> Option<ReviewContext> {
        self.review_context
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn is_live(&self) -> bool {
        !self.completed && self.mode.is_resumable()
    }

    pub fn questions(&self) -> &[Arc<Question>] {
        &self.original
    }

    pub fn question_count(&self) -> usize {
        self.original.len()
    }

    pub fn working_indices(&self) -> &[usize] {
        &self.working
    }

    pub fn working_len(&self) -> usize {
        self.working.len()
    }

    pub fn filter(&self) -> ReviewFilter {
        self.filter
    }

    /// Position within the working set.
    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Position of the current question within the original set.
    pub fn current_original_index(&self) -> usize {
        self.working[self.current]
    }

    pub fn current_question(&self) -> &Arc<Question> {
        &self.original[self.current_original_index()]
    }

    pub fn answers(&self) -> &BTreeMap<usize, usize> {
        &self.answers
    }

    pub fn answer_for(&self, original_index: usize) -> Option<usize> {
        self.answers.get(&original_index).copied()
    }

    pub fn current_answer(&self) -> Option<usize> {
        self.answer_for(self.current_original_index())
    }

    pub fn feedback_shown(&self, original_index: usize) -> bool {
        self.feedback.contains(&original_index)
    }

    pub fn timer(&self) -> &Timer {
        &self.timer
    }

    pub fn time_left(&self) -> u32 {
        self.timer.value()
    }

    /// Whether the current question's correct option may be shown.
    pub fn reveals_answer(&self) -> bool {
        match self.mode {
            QuizMode::Review => true,
            QuizMode::Practice => self.feedback_shown(self.current_original_index()),
            QuizMode::Exam => false,
        }
    }

    /// Answers as one slot per original question.
    pub fn answers_dense(&self) -> Vec<Option<usize>> {
        (0..self.original.len()).map(|i| self.answer_for(i)).collect()
    }

    pub fn feedback_dense(&self) -> Vec<bool> {
        (0..self.original.len()).map(|i| self.feedback_shown(i)).collect()
    }

    /// Correct answers so far, always recounted.
    pub fn score(&self) -> usize {
        scoring::tally(&self.original, &self.answers).correct
    }

    pub fn can_select(&self) -> bool {
        match self.state() {
            SessionState::ExamActive => true,
            SessionState::PracticeActive => !self.feedback_shown(self.current_original_index()),
            _ => false,
        }
    }

    pub fn can_submit(&self) -> bool {
        let idx = self.current_original_index();
        self.state() == SessionState::PracticeActive
            && self.answers.contains_key(&idx)
            && !self.feedback.contains(&idx)
    }

    pub fn can_next(&self) -> bool {
        let idx = self.current_original_index();
        match self.state() {
            SessionState::ExamActive => self.answers.contains_key(&idx),
            SessionState::PracticeActive => self.feedback.contains(&idx),
            SessionState::ReviewStudy | SessionState::ReviewSession => true,
            SessionState::Completed => false,
        }
    }

    pub fn can_previous(&self) -> bool {
        !self.completed && self.current > 0
    }

    /// Record a choice for the current question. Ignored in review, after
    /// completion, once practice feedback is shown, or for an out-of-range option.
    pub fn select_option(&mut self, choice: usize) -> bool {
        if !self.can_select() || choice >= self.current_question().options.len() {
            return false;
        }
        let idx = self.current_original_index();
        self.answers.insert(idx, choice);
        debug!(question = idx, choice, "option selected");
        true
    }

    /// Reveal correctness of the pending practice answer.
    pub fn submit(&mut self) -> SubmitOutcome {
        if !self.can_submit() {
            return SubmitOutcome::Ignored;
        }
        let idx = self.current_original_index();
        self.feedback.insert(idx);
        let correct = self
            .answers
            .get(&idx)
            .is_some_and(|&a| self.original[idx].is_correct(a));
        SubmitOutcome::Revealed { correct }
    }

    pub fn next(&mut self) -> NavOutcome {
        if self.completed {
            return NavOutcome::Ignored;
        }
        if !self.can_next() {
            return NavOutcome::Blocked;
        }
        self.advance_to(self.current + 1)
    }

    pub fn previous(&mut self) -> NavOutcome {
        if self.completed {
            return NavOutcome::Ignored;
        }
        if !self.can_previous() {
            return NavOutcome::Blocked;
        }
        self.current -= 1;
        NavOutcome::Moved(self.current)
    }

    /// Jump within the working set. Backward jumps are free; forward jumps obey
    /// the same gate as `next`. An index past the end finishes the set.
    pub fn jump_to(&mut self, index: usize) -> NavOutcome {
        if self.completed {
            return NavOutcome::Ignored;
        }
        if index <= self.current {
            self.current = index;
            return NavOutcome::Moved(index);
        }
        if !self.can_next() {
            return NavOutcome::Blocked;
        }
        self.advance_to(index)
    }

    fn advance_to(&mut self, index: usize) -> NavOutcome {
        if index < self.working.len() {
            self.current = index;
            return NavOutcome::Moved(index);
        }
        match (self.mode, self.review_context) {
            (QuizMode::Review, Some(ReviewContext::Session)) => {
                NavOutcome::ExitReview(ReviewExit::ToResults)
            }
            (QuizMode::Review, _) => NavOutcome::ExitReview(ReviewExit::ToModeSelection),
            _ => match self.finalize() {
                Some(result) => NavOutcome::Finished(result),
                None => NavOutcome::Ignored,
            },
        }
    }

    /// One timer second. An exam reaching zero finalizes with whatever is answered.
    pub fn tick(&mut self) -> TickOutcome {
        if self.completed {
            return TickOutcome::default();
        }
        let notices = self.timer.tick();
        let finished = if notices.contains(&TimerNotice::Expired) {
            self.timed_out = true;
            info!("exam time expired");
            self.finalize()
        } else {
            None
        };
        TickOutcome { notices, finished }
    }

    /// Stop the clock and score the attempt. `None` if already completed or
    /// if this is a review.
    pub fn finalize(&mut self) -> Option<QuizResult> {
        if self.completed || !self.mode.is_resumable() {
            return None;
        }
        self.timer.stop();
        self.completed = true;
        let tally = scoring::tally(&self.original, &self.answers);
        let result = QuizResult::from_tally(self.mode, tally, self.timer.value(), self.timed_out);
        info!(
            mode = self.mode.as_str(),
            score = result.score,
            total = result.total,
            unanswered = result.unanswered,
            timed_out = self.timed_out,
            "session finalized"
        );
        Some(result)
    }

    /// Switch a completed attempt into post-session review.
    pub fn enter_review(&mut self) -> bool {
        if !self.completed {
            return false;
        }
        self.mode = QuizMode::Review;
        self.review_context = Some(ReviewContext::Session);
        self.completed = false;
        self.working = (0..self.original.len()).collect();
        self.filter = ReviewFilter::All;
        self.current = 0;
        true
    }

    /// Narrow the working set by outcome. Only for post-session reviews; a
    /// filter matching nothing leaves the working set unchanged.
    pub fn apply_review_filter(&mut self, filter: ReviewFilter) -> bool {
        if self.state() != SessionState::ReviewSession {
            return false;
        }
        let indices = review::filter_indices(&self.original, &self.answers, filter);
        if indices.is_empty() {
            return false;
        }
        self.working = indices;
        self.filter = filter;
        self.current = 0;
        true
    }

    /// Only a finished attempt, on its results or in its review, can be retaken.
    pub fn can_retake(&self) -> bool {
        self.attempt_mode.is_resumable()
            && (self.completed || self.state() == SessionState::ReviewSession)
    }

    /// Start a new attempt, in the original attempt mode, over only the
    /// questions matching `filter`. The full set is remembered for `retake_full`.
    pub fn retake_filtered(&mut self, filter: ReviewFilter) -> bool {
        if !self.can_retake() {
            return false;
        }
        let subset: Vec<Arc<Question>> = review::filter_indices(&self.original, &self.answers, filter)
            .into_iter()
            .map(|i| Arc::clone(&self.original[i]))
            .collect();
        let full = self
            .full_set
            .take()
            .unwrap_or_else(|| self.original.clone());
        match Self::new(self.attempt_mode, subset, self.settings.clone()) {
            Some(mut fresh) => {
                fresh.full_set = Some(full);
                *self = fresh;
                true
            }
            None => {
                self.full_set = Some(full);
                false
            }
        }
    }

    /// Re-run the whole remembered set. `false` means there was nothing
    /// narrower to widen back out; start a fresh session instead.
    pub fn retake_full(&mut self) -> bool {
        if !self.can_retake() {
            return false;
        }
        let full = match self.full_set.take() {
            Some(full) => full,
            None if self.working.len() < self.original.len() => self.original.clone(),
            None => return false,
        };
        match Self::new(self.attempt_mode, full, self.settings.clone()) {
            Some(fresh) => {
                *self = fresh;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::question;

    fn pool(n: usize) -> Vec<Arc<Question>> {
        // Question i has correct option i % 4.
        (0..n).map(|i| Arc::new(question(&format!("q{i}"), i % 4))).collect()
    }

    fn session(mode: QuizMode, n: usize) -> QuizSession {
        QuizSession::new(mode, pool(n), TimerSettings::default()).unwrap()
    }

    fn answer_all_exam(s: &mut QuizSession, choices: &[usize]) -> Option<QuizResult> {
        let mut last = None;
        for &c in choices {
            assert!(s.select_option(c));
            if let NavOutcome::Finished(r) = s.next() {
                last = Some(r);
            }
        }
        last
    }

    #[test]
    fn empty_pool_makes_no_session() {
        assert!(QuizSession::new(QuizMode::Exam, Vec::new(), TimerSettings::default()).is_none());
    }

    #[test]
    fn states_follow_mode() {
        assert_eq!(session(QuizMode::Exam, 2).state(), SessionState::ExamActive);
        assert_eq!(session(QuizMode::Practice, 2).state(), SessionState::PracticeActive);
        let study = session(QuizMode::Review, 2);
        assert_eq!(study.state(), SessionState::ReviewStudy);
        assert!(study.reveals_answer());
        assert!(!study.timer().is_running());
    }

    #[test]
    fn exam_next_requires_answer_and_hides_correctness() {
        let mut s = session(QuizMode::Exam, 3);
        assert_eq!(s.next(), NavOutcome::Blocked);
        assert!(s.select_option(2));
        assert!(!s.reveals_answer());
        assert_eq!(s.submit(), SubmitOutcome::Ignored);
        assert_eq!(s.next(), NavOutcome::Moved(1));
        assert_eq!(s.previous(), NavOutcome::Moved(0));
        // Revision before submission is allowed.
        assert!(s.select_option(0));
        assert_eq!(s.answer_for(0), Some(0));
    }

    #[test]
    fn exam_finishing_last_question_finalizes() {
        let mut s = session(QuizMode::Exam, 3);
        let result = answer_all_exam(&mut s, &[0, 0, 2]).unwrap();
        assert_eq!(s.state(), SessionState::Completed);
        assert_eq!(result.score, 2);
        assert_eq!(result.answered, 3);
        assert!(!s.timer().is_running());
        assert_eq!(s.finalize(), None);
        assert_eq!(s.next(), NavOutcome::Ignored);
        assert!(!s.select_option(1));
    }

    #[test]
    fn practice_wrong_answer_then_submit_locks_question() {
        let mut s = session(QuizMode::Practice, 3);
        assert_eq!(s.next(), NavOutcome::Blocked);
        assert!(s.select_option(3));
        // Unsubmitted answer still blocks advancing.
        assert_eq!(s.next(), NavOutcome::Blocked);
        assert_eq!(s.submit(), SubmitOutcome::Revealed { correct: false });
        assert!(s.feedback_shown(0));
        assert!(s.reveals_answer());
        assert!(s.can_next());

        assert!(!s.select_option(0));
        assert_eq!(s.answer_for(0), Some(3));
        assert_eq!(s.submit(), SubmitOutcome::Ignored);
        assert_eq!(s.next(), NavOutcome::Moved(1));
    }

    #[test]
    fn practice_revisit_keeps_feedback_and_score_stable() {
        let mut s = session(QuizMode::Practice, 2);
        s.select_option(0);
        s.submit();
        s.next();
        s.previous();
        assert_eq!(s.submit(), SubmitOutcome::Ignored);
        assert!(s.can_next());
        s.next();
        s.select_option(1);
        assert_eq!(s.submit(), SubmitOutcome::Revealed { correct: true });
        let NavOutcome::Finished(result) = s.next() else {
            panic!("expected completion");
        };
        assert_eq!(result.score, 2);
        assert_eq!(result.mode, QuizMode::Practice);
    }

    #[test]
    fn out_of_range_option_is_ignored() {
        let mut s = session(QuizMode::Exam, 1);
        assert!(!s.select_option(9));
        assert_eq!(s.current_answer(), None);
    }

    #[test]
    fn exam_expiry_with_no_answers_scores_zero() {
        let n = 4;
        let mut s = session(QuizMode::Exam, n);
        assert_eq!(s.time_left(), 45 * n as u32);
        let mut finished = None;
        for _ in 0..45 * n {
            let out = s.tick();
            if out.finished.is_some() {
                finished = out.finished;
            }
        }
        let result = finished.expect("timer should force completion");
        assert_eq!(s.state(), SessionState::Completed);
        assert_eq!(result.score, 0);
        assert_eq!(result.unanswered, n);
        assert!(result.timed_out);
        assert_eq!(s.tick(), TickOutcome::default());
    }

    #[test]
    fn exam_expiry_scores_partial_answers() {
        let mut s = session(QuizMode::Exam, 10);
        // Six answers: four correct (q0..q3 correct = 0..3), two wrong.
        for (i, choice) in [0, 1, 2, 3, 3, 3].into_iter().enumerate() {
            assert_eq!(s.current_index(), i);
            s.select_option(choice);
            s.next();
        }
        let mut finished = None;
        while finished.is_none() {
            finished = s.tick().finished;
        }
        let result = finished.unwrap();
        assert_eq!(result.answered, 6);
        assert_eq!(result.unanswered, 4);
        assert_eq!(result.score, 4);
        assert_eq!(result.wrong, 2);
    }

    #[test]
    fn practice_timer_counts_up_with_pacing() {
        let mut s = session(QuizMode::Practice, 1);
        for _ in 0..45 {
            assert!(s.tick().notices.is_empty());
        }
        assert_eq!(s.tick().notices, vec![TimerNotice::Pacing { overrun: 1 }]);
        assert_eq!(s.time_left(), 46);
        assert_eq!(s.state(), SessionState::PracticeActive);
    }

    #[test]
    fn study_review_exits_to_mode_selection() {
        let mut s = session(QuizMode::Review, 2);
        assert!(!s.select_option(0));
        assert_eq!(s.next(), NavOutcome::Moved(1));
        assert_eq!(s.next(), NavOutcome::ExitReview(ReviewExit::ToModeSelection));
        assert!(!s.apply_review_filter(ReviewFilter::Incorrect));
        assert_eq!(s.finalize(), None);
    }

    #[test]
    fn review_filter_keeps_answers_aligned() {
        let mut s = session(QuizMode::Exam, 5);
        // q0 correct, q1 wrong, q2 correct, q3 wrong, q4 correct.
        answer_all_exam(&mut s, &[0, 0, 2, 0, 0]).unwrap();
        assert!(s.enter_review());
        assert_eq!(s.state(), SessionState::ReviewSession);
        let before = s.answers().clone();

        assert!(s.apply_review_filter(ReviewFilter::Incorrect));
        assert_eq!(s.working_indices(), &[1, 3]);
        assert_eq!(s.current_index(), 0);
        assert_eq!(s.current_original_index(), 1);
        assert_eq!(s.current_answer(), Some(0));
        assert_eq!(s.next(), NavOutcome::Moved(1));
        assert_eq!(s.current_original_index(), 3);

        assert!(s.apply_review_filter(ReviewFilter::All));
        assert!(s.apply_review_filter(ReviewFilter::Incorrect));
        assert_eq!(s.answers(), &before);
        assert!(!s.apply_review_filter(ReviewFilter::Unanswered));
        assert_eq!(s.filter(), ReviewFilter::Incorrect);

        s.next();
        assert_eq!(s.next(), NavOutcome::ExitReview(ReviewExit::ToResults));
    }

    #[test]
    fn retake_incorrect_then_full() {
        let mut s = session(QuizMode::Exam, 4);
        answer_all_exam(&mut s, &[0, 0, 0, 3]).unwrap();
        s.enter_review();
        assert!(!s.retake_full());

        assert!(s.retake_filtered(ReviewFilter::Incorrect));
        assert_eq!(s.state(), SessionState::ExamActive);
        assert_eq!(s.question_count(), 2);
        assert!(s.answers().is_empty());
        assert_eq!(s.time_left(), 90);
        assert!(!s.retake_full());

        s.finalize().unwrap();
        assert!(s.retake_full());
        assert_eq!(s.question_count(), 4);
        assert_eq!(s.mode(), QuizMode::Exam);
        assert!(!s.retake_full());
    }

    #[test]
    fn live_attempt_cannot_be_retaken() {
        let mut s = session(QuizMode::Exam, 4);
        s.select_option(0);
        assert!(!s.can_retake());
        assert!(!s.retake_filtered(ReviewFilter::Unanswered));
        assert!(!s.retake_full());
        assert_eq!(s.question_count(), 4);
        assert_eq!(s.answer_for(0), Some(0));
        assert_eq!(s.state(), SessionState::ExamActive);

        s.finalize().unwrap();
        assert!(s.can_retake());
        assert!(s.retake_filtered(ReviewFilter::Unanswered));
        assert_eq!(s.question_count(), 3);
    }

    #[test]
    fn retake_full_after_review_filter() {
        let mut s = session(QuizMode::Practice, 3);
        for c in [0, 0, 0] {
            s.select_option(c);
            s.submit();
            s.next();
        }
        s.enter_review();
        s.apply_review_filter(ReviewFilter::Incorrect);
        assert!(s.retake_full());
        assert_eq!(s.state(), SessionState::PracticeActive);
        assert_eq!(s.working_len(), 3);
    }

    #[test]
    fn jump_past_end_finishes() {
        let mut s = session(QuizMode::Exam, 3);
        s.select_option(0);
        assert_eq!(s.jump_to(2), NavOutcome::Moved(2));
        assert_eq!(s.jump_to(0), NavOutcome::Moved(0));
        assert!(matches!(s.jump_to(10), NavOutcome::Finished(_)));
    }

    #[test]
    fn restore_replays_and_clamps() {
        let parts = ResumeParts {
            mode: QuizMode::Exam,
            questions: pool(5),
            current_index: 3,
            answers: vec![Some(0), None, Some(9), Some(3), None, Some(1), Some(1)],
            feedback_shown: vec![true; 5],
            time_left: 500,
        };
        let s = QuizSession::restore(parts.clone(), TimerSettings::default()).unwrap();
        assert_eq!(s.current_index(), 3);
        // Budget is 225 for five questions; a larger value is clamped.
        assert_eq!(s.time_left(), 225);
        assert_eq!(s.answers_dense(), vec![Some(0), None, None, Some(3), None]);
        // Exams never carry feedback flags.
        assert_eq!(s.feedback_dense(), vec![false; 5]);
        assert_eq!(s.timer().direction(), Some(TimerDirection::Down));

        let mut far = parts;
        far.current_index = 99;
        far.mode = QuizMode::Practice;
        let s = QuizSession::restore(far, TimerSettings::default()).unwrap();
        assert_eq!(s.current_index(), 4);
        assert_eq!(s.feedback_dense(), vec![true, false, false, true, false]);
        assert_eq!(s.timer().direction(), Some(TimerDirection::Up));
        assert_eq!(s.time_left(), 500);
    }
}
