use std::sync::mpsc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::{Local, TimeDelta, Utc};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::{info, warn};

use crate::catalog::pool::{PoolAssembler, PoolError, PoolRequest};
use crate::catalog::source::TopicSource;
use crate::catalog::validate::{self, ValidationReport};
use crate::catalog::{Catalog, CategorySelection, TopicDescriptor};
use crate::config::Config;
use crate::engine::analytics::{self, ProgressReport};
use crate::engine::scoring::{self, SourceBreakdown};
use crate::event::{AppEvent, Ticker};
use crate::identity::{Entitlement, IdentityProvider, User};
use crate::session::QuizMode;
use crate::session::quiz::{NavOutcome, QuizSession, ReviewExit, SubmitOutcome, TickOutcome};
use crate::session::result::{AttemptRecord, QuizResult};
use crate::session::review::ReviewFilter;
use crate::session::timer::TimerSettings;
use crate::store::json_store::JsonStore;
use crate::store::schema::{AttemptHistoryData, SnapshotTopic};
use crate::store::snapshot::{self, ResumeError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppScreen {
    TopicSelect,
    Quiz,
    Results,
    Review,
}

pub struct App {
    pub screen: AppScreen,
    pub config: Config,
    pub catalog: Catalog,
    pub session: Option<QuizSession>,
    pub topic: Option<TopicDescriptor>,
    pub category: CategorySelection,
    pub last_result: Option<QuizResult>,
    pub history: Vec<AttemptRecord>,
    source: Box<dyn TopicSource>,
    store: Option<JsonStore>,
    identity: Box<dyn IdentityProvider>,
    tick_tx: Option<mpsc::Sender<AppEvent>>,
    ticker: Option<Ticker>,
    generation: u64,
    rng: SmallRng,
}

impl App {
    pub fn new(
        config: Config,
        source: Box<dyn TopicSource>,
        store: Option<JsonStore>,
        identity: Box<dyn IdentityProvider>,
    ) -> Result<Self> {
        let catalog = Catalog::load(source.as_ref()).context("loading topic catalog")?;
        let mut app = Self {
            screen: AppScreen::TopicSelect,
            config,
            catalog,
            session: None,
            topic: None,
            category: CategorySelection::All,
            last_result: None,
            history: Vec::new(),
            source,
            store,
            identity,
            tick_tx: None,
            ticker: None,
            generation: 0,
            rng: SmallRng::from_entropy(),
        };
        app.reload_history();
        Ok(app)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    /// Route one-second ticks for timed sessions into `tx`.
    pub fn attach_ticker(&mut self, tx: mpsc::Sender<AppEvent>) {
        self.tick_tx = Some(tx);
        self.restart_ticker();
    }

    pub fn current_user(&self) -> Option<User> {
        self.identity.current_user()
    }

    pub fn entitlement(&self) -> Entitlement {
        self.identity.entitlement()
    }

    fn timer_settings(&self) -> TimerSettings {
        TimerSettings::from(&self.config)
    }

    /// Every catalog topic with whether the current plan may open it.
    pub fn topics(&self) -> Vec<(&TopicDescriptor, bool)> {
        let entitlement = self.entitlement();
        self.catalog
            .topics
            .iter()
            .map(|t| (t, self.catalog.is_unlocked(&t.id, &entitlement)))
            .collect()
    }

    /// Start a fresh session, superseding and discarding any prior one.
    pub fn start(
        &mut self,
        topic_id: &str,
        mode: QuizMode,
        category: CategorySelection,
    ) -> Result<(), PoolError> {
        let entitlement = self.entitlement();
        let topic = self
            .catalog
            .find(topic_id)
            .cloned()
            .ok_or_else(|| PoolError::UnknownTopic(topic_id.to_string()))?;
        if !self.catalog.is_unlocked(&topic.id, &entitlement) {
            return Err(PoolError::TopicLocked(topic.id));
        }

        self.discard_session();

        let request = PoolRequest {
            topic: &topic,
            category: category.clone(),
            entitlement,
            tolerant: self.config.tolerant_loading,
            default_cap: self.config.default_question_cap,
        };
        let pool = PoolAssembler::new(self.source.as_ref(), &self.catalog)
            .assemble(&request, &mut self.rng)?;
        let session = QuizSession::new(mode, pool, self.timer_settings()).ok_or_else(|| {
            PoolError::Empty {
                topic_id: topic.id.clone(),
            }
        })?;

        self.install(session, topic, category);
        Ok(())
    }

    /// Pick up the saved session for the current user, if one is valid.
    /// Any rejected snapshot is removed.
    pub fn resume(&mut self) -> Result<(), ResumeError> {
        let user = self.current_user().ok_or(ResumeError::UserMismatch)?;
        let store = self.store.as_ref().ok_or(ResumeError::Missing)?;
        let max_age = TimeDelta::hours(self.config.snapshot_max_age_hours);

        let restored = snapshot::load(store, &user.id, Utc::now(), max_age).and_then(|snap| {
            snapshot::restore(snap, &self.catalog, &self.entitlement(), self.timer_settings())
        });
        let restored = match restored {
            Ok(restored) => restored,
            Err(ResumeError::Missing) => return Err(ResumeError::Missing),
            Err(e) => {
                info!(reason = %e, "discarding saved session");
                snapshot::clear(store);
                return Err(e);
            }
        };

        self.ticker = None;
        self.last_result = None;
        self.install(restored.session, restored.topic, restored.category);
        Ok(())
    }

    fn install(&mut self, session: QuizSession, topic: TopicDescriptor, category: CategorySelection) {
        self.screen = if session.mode() == QuizMode::Review {
            AppScreen::Review
        } else {
            AppScreen::Quiz
        };
        self.session = Some(session);
        self.topic = Some(topic);
        self.category = category;
        self.restart_ticker();
        self.persist();
    }

    /// Drop the active session and its snapshot.
    fn discard_session(&mut self) {
        self.ticker = None;
        self.session = None;
        self.last_result = None;
        if let Some(ref store) = self.store {
            snapshot::clear(store);
        }
    }

    fn restart_ticker(&mut self) {
        self.ticker = None;
        let running = self
            .session
            .as_ref()
            .is_some_and(|s| s.timer().is_running());
        if let (true, Some(tx)) = (running, &self.tick_tx) {
            self.generation += 1;
            self.ticker = Some(Ticker::start(
                tx.clone(),
                self.generation,
                Duration::from_secs(1),
            ));
        }
    }

    fn persist(&self) {
        let (Some(store), Some(session)) = (&self.store, &self.session) else {
            return;
        };
        let user = self.current_user();
        let topic = self
            .topic
            .as_ref()
            .map(|t| SnapshotTopic::from_descriptor(t, &self.category));
        snapshot::save(store, user.as_ref(), topic.as_ref(), session);
    }

    pub fn select_option(&mut self, choice: usize) -> bool {
        let changed = self
            .session
            .as_mut()
            .is_some_and(|s| s.select_option(choice));
        if changed {
            self.persist();
        }
        changed
    }

    pub fn submit(&mut self) -> SubmitOutcome {
        let outcome = match self.session.as_mut() {
            Some(s) => s.submit(),
            None => SubmitOutcome::Ignored,
        };
        if outcome != SubmitOutcome::Ignored {
            self.persist();
        }
        outcome
    }

    pub fn next(&mut self) -> NavOutcome {
        let outcome = self.session.as_mut().map_or(NavOutcome::Ignored, |s| s.next());
        self.after_navigation(&outcome);
        outcome
    }

    pub fn previous(&mut self) -> NavOutcome {
        let outcome = self
            .session
            .as_mut()
            .map_or(NavOutcome::Ignored, |s| s.previous());
        self.after_navigation(&outcome);
        outcome
    }

    pub fn jump_to(&mut self, index: usize) -> NavOutcome {
        let outcome = self
            .session
            .as_mut()
            .map_or(NavOutcome::Ignored, |s| s.jump_to(index));
        self.after_navigation(&outcome);
        outcome
    }

    fn after_navigation(&mut self, outcome: &NavOutcome) {
        match outcome {
            NavOutcome::Moved(_) => self.persist(),
            NavOutcome::Finished(result) => self.complete(result.clone()),
            NavOutcome::ExitReview(ReviewExit::ToResults) => self.screen = AppScreen::Results,
            NavOutcome::ExitReview(ReviewExit::ToModeSelection) => self.go_to_topics(),
            NavOutcome::Blocked | NavOutcome::Ignored => {}
        }
    }

    /// Handle a tick from the background ticker; ticks from a cancelled
    /// ticker are dropped.
    pub fn on_tick(&mut self, generation: u64) -> TickOutcome {
        if self.ticker.as_ref().map(Ticker::generation) != Some(generation) {
            return TickOutcome::default();
        }
        self.tick()
    }

    /// Advance the session clock by one second.
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = match self.session.as_mut() {
            Some(s) => s.tick(),
            None => return TickOutcome::default(),
        };
        if let Some(ref result) = outcome.finished {
            self.complete(result.clone());
        }
        outcome
    }

    /// Finish the attempt now, scoring whatever is answered.
    pub fn finish(&mut self) -> Option<QuizResult> {
        let result = self.session.as_mut()?.finalize()?;
        self.complete(result.clone());
        Some(result)
    }

    fn complete(&mut self, result: QuizResult) {
        self.ticker = None;
        if let Some(ref topic) = self.topic {
            let record = AttemptRecord::from_result(topic, &result);
            analytics::record_attempt(&mut self.history, record, self.config.history_cap);
            self.save_history();
        }
        if let Some(ref store) = self.store {
            snapshot::clear(store);
        }
        info!(
            score = result.score,
            total = result.total,
            percentage = result.percentage(),
            "attempt recorded"
        );
        self.last_result = Some(result);
        self.screen = AppScreen::Results;
    }

    fn save_history(&self) {
        let (Some(store), Some(user)) = (&self.store, self.current_user()) else {
            return;
        };
        let data = AttemptHistoryData {
            attempts: self.history.clone(),
            ..Default::default()
        };
        if let Err(e) = store.save_history(&user.id, &data) {
            warn!(error = %e, "failed to save attempt history");
        }
    }

    fn reload_history(&mut self) {
        self.history = match (&self.store, self.current_user()) {
            (Some(store), Some(user)) => store.load_history(&user.id).attempts,
            _ => Vec::new(),
        };
    }

    pub fn enter_review(&mut self) -> bool {
        let entered = self.session.as_mut().is_some_and(|s| s.enter_review());
        if entered {
            self.screen = AppScreen::Review;
        }
        entered
    }

    pub fn apply_review_filter(&mut self, filter: ReviewFilter) -> bool {
        self.session
            .as_mut()
            .is_some_and(|s| s.apply_review_filter(filter))
    }

    /// New attempt over only the questions matching `filter`.
    pub fn retake_filtered(&mut self, filter: ReviewFilter) -> bool {
        let started = self
            .session
            .as_mut()
            .is_some_and(|s| s.retake_filtered(filter));
        if started {
            self.relaunch();
        }
        started
    }

    /// Re-run the remembered full set, or assemble a fresh pool for the same
    /// topic when there is nothing to widen back to. `Ok(false)` while the
    /// current attempt is still live.
    pub fn retake(&mut self) -> Result<bool, PoolError> {
        if self.session.as_ref().is_some_and(|s| s.is_live()) {
            return Ok(false);
        }
        if self.session.as_mut().is_some_and(|s| s.retake_full()) {
            self.relaunch();
            return Ok(true);
        }
        let Some(topic_id) = self.topic.as_ref().map(|t| t.id.clone()) else {
            return Err(PoolError::UnknownTopic(String::new()));
        };
        let mode = self
            .session
            .as_ref()
            .map_or(QuizMode::Practice, |s| s.attempt_mode());
        let category = self.category.clone();
        self.start(&topic_id, mode, category).map(|()| true)
    }

    fn relaunch(&mut self) {
        self.last_result = None;
        self.screen = AppScreen::Quiz;
        self.restart_ticker();
        self.persist();
    }

    /// Save now; the process may be about to go away.
    pub fn suspend(&mut self) {
        self.persist();
    }

    pub fn go_to_topics(&mut self) {
        self.ticker = None;
        self.session = None;
        self.screen = AppScreen::TopicSelect;
    }

    pub fn logout(&mut self) {
        self.discard_session();
        self.topic = None;
        self.identity.logout();
        self.history.clear();
        self.screen = AppScreen::TopicSelect;
        info!("logged out");
    }

    pub fn progress_report(&self) -> ProgressReport {
        let today = Local::now().date_naive();
        let current = self.topic.as_ref().map(|t| t.id.as_str());
        analytics::progress_report(&self.history, today, &Local, current)
    }

    /// Per-source results of the active mock exam.
    pub fn mock_breakdown(&self) -> Option<Vec<SourceBreakdown>> {
        let topic = self.topic.as_ref()?;
        let session = self.session.as_ref()?;
        if !topic.is_mock_exam() {
            return None;
        }
        Some(scoring::mock_breakdown(session.questions(), session.answers()))
    }

    pub fn validate_catalog(&self, strict_duplicates: bool) -> ValidationReport {
        validate::validate_catalog(&self.catalog, self.source.as_ref(), strict_duplicates)
    }
}
