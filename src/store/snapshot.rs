use chrono::{DateTime, TimeDelta, Utc};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, CategorySelection, TopicDescriptor};
use crate::identity::{Entitlement, User};
use crate::session::quiz::{QuizSession, ResumeParts};
use crate::session::timer::TimerSettings;
use crate::store::json_store::{JsonStore, SNAPSHOT_KEY};
use crate::store::schema::{SCHEMA_VERSION, SnapshotData, SnapshotTopic};

/// Why a persisted session was not resumed. Never shown to the user.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResumeError {
    #[error("no saved session")]
    Missing,
    #[error("snapshot schema version {0} is not supported")]
    UnsupportedSchema(u32),
    #[error("snapshot belongs to another user")]
    UserMismatch,
    #[error("snapshot mode cannot be resumed")]
    NotResumable,
    #[error("snapshot holds no questions")]
    NoQuestions,
    #[error("snapshot has no usable topic reference")]
    MissingTopic,
    #[error("snapshot is {age_hours}h old")]
    Stale { age_hours: i64 },
    #[error("topic {0} is locked for the current plan")]
    TopicLocked(String),
}

/// A session rebuilt from a snapshot, with the catalog's current view of its topic.
#[derive(Debug)]
pub struct Restored {
    pub session: QuizSession,
    pub topic: TopicDescriptor,
    pub category: CategorySelection,
}

/// Persist the live session. Clears any previous snapshot instead when
/// there is nothing resumable to write. Failures are logged, not returned.
pub fn save(
    store: &JsonStore,
    user: Option<&User>,
    topic: Option<&SnapshotTopic>,
    session: &QuizSession,
) {
    let (Some(user), Some(topic)) = (user, topic) else {
        clear(store);
        return;
    };
    if !session.is_live() {
        clear(store);
        return;
    }

    let data = SnapshotData {
        schema_version: SCHEMA_VERSION,
        user_id: user.id.clone(),
        mode: session.mode(),
        topic: Some(topic.clone()),
        questions: session.questions().to_vec(),
        current_index: session.current_index(),
        answers: session.answers_dense(),
        feedback_shown: session.feedback_dense(),
        time_left: session.time_left(),
        saved_at: Utc::now(),
    };
    match store.set(SNAPSHOT_KEY, &data) {
        Ok(()) => debug!(
            topic = %topic.id,
            index = data.current_index,
            time_left = data.time_left,
            "snapshot saved"
        ),
        Err(e) => warn!(error = %e, "failed to save session snapshot"),
    }
}

pub fn clear(store: &JsonStore) {
    if let Err(e) = store.remove(SNAPSHOT_KEY) {
        warn!(error = %e, "failed to clear session snapshot");
    }
}

/// Read the saved snapshot if it is valid for `user_id` at `now`.
pub fn load(
    store: &JsonStore,
    user_id: &str,
    now: DateTime<Utc>,
    max_age: TimeDelta,
) -> Result<SnapshotData, ResumeError> {
    let snapshot: SnapshotData = store.get(SNAPSHOT_KEY).ok_or(ResumeError::Missing)?;
    check(&snapshot, user_id, now, max_age)?;
    Ok(snapshot)
}

pub fn check(
    snapshot: &SnapshotData,
    user_id: &str,
    now: DateTime<Utc>,
    max_age: TimeDelta,
) -> Result<(), ResumeError> {
    if snapshot.needs_reset() {
        return Err(ResumeError::UnsupportedSchema(snapshot.schema_version));
    }
    if snapshot.user_id != user_id {
        return Err(ResumeError::UserMismatch);
    }
    if !snapshot.mode.is_resumable() {
        return Err(ResumeError::NotResumable);
    }
    if snapshot.questions.is_empty() {
        return Err(ResumeError::NoQuestions);
    }
    if snapshot.topic.as_ref().is_none_or(|t| t.id.is_empty()) {
        return Err(ResumeError::MissingTopic);
    }
    let age = now - snapshot.saved_at;
    if age > max_age {
        return Err(ResumeError::Stale {
            age_hours: age.num_hours(),
        });
    }
    Ok(())
}

/// Rebuild the session, re-checking the topic against the current catalog
/// and entitlement.
pub fn restore(
    snapshot: SnapshotData,
    catalog: &Catalog,
    entitlement: &Entitlement,
    settings: TimerSettings,
) -> Result<Restored, ResumeError> {
    let saved_topic = snapshot.topic.ok_or(ResumeError::MissingTopic)?;
    let topic = catalog
        .find(&saved_topic.id)
        .ok_or(ResumeError::MissingTopic)?;
    if !catalog.is_unlocked(&topic.id, entitlement) {
        return Err(ResumeError::TopicLocked(topic.id.clone()));
    }

    let parts = ResumeParts {
        mode: snapshot.mode,
        questions: snapshot.questions,
        current_index: snapshot.current_index,
        answers: snapshot.answers,
        feedback_shown: snapshot.feedback_shown,
        time_left: snapshot.time_left,
    };
    let session = QuizSession::restore(parts, settings).ok_or(ResumeError::NoQuestions)?;
    info!(topic = %topic.id, "resumed saved session");
    Ok(Restored {
        session,
        topic: topic.clone(),
        category: saved_topic.selected_category,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::tests::question;
    use crate::catalog::Question;
    use crate::identity::Plan;
    use crate::session::timer::TimerDirection;
    use crate::session::{QuizMode, SessionState};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn make_test_store() -> (TempDir, JsonStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::with_base_dir(dir.path().to_path_buf()).unwrap();
        (dir, store)
    }

    fn catalog() -> Catalog {
        let topic = |id: &str, premium: bool| TopicDescriptor {
            id: id.into(),
            name: id.to_uppercase(),
            file: Some(format!("{id}.json")),
            requires_premium: premium,
            ..Default::default()
        };
        Catalog {
            topics: vec![topic("a", false), topic("paid", true)],
        }
    }

    fn user(id: &str) -> User {
        User {
            id: id.into(),
            plan: Plan::Free,
        }
    }

    fn snapshot_topic(id: &str) -> SnapshotTopic {
        let catalog = catalog();
        SnapshotTopic::from_descriptor(catalog.find(id).unwrap(), &CategorySelection::All)
    }

    fn exam(n: usize) -> QuizSession {
        let pool: Vec<Arc<Question>> = (0..n).map(|i| Arc::new(question(&format!("q{i}"), 0))).collect();
        QuizSession::new(QuizMode::Exam, pool, TimerSettings::default()).unwrap()
    }

    fn day() -> TimeDelta {
        TimeDelta::hours(24)
    }

    #[test]
    fn exam_resume_keeps_index_and_time() {
        let (_dir, store) = make_test_store();
        let mut session = exam(20);
        for _ in 0..3 {
            session.select_option(0);
            session.next();
        }
        for _ in 0..(900 - 500) {
            session.tick();
        }
        assert_eq!((session.current_index(), session.time_left()), (3, 500));
        save(&store, Some(&user("u1")), Some(&snapshot_topic("a")), &session);

        let snapshot = load(&store, "u1", Utc::now(), day()).unwrap();
        let restored = restore(snapshot, &catalog(), &Plan::Free.entitlement(), TimerSettings::default()).unwrap();
        let mut resumed = restored.session;
        assert_eq!(resumed.current_index(), 3);
        assert_eq!(resumed.time_left(), 500);
        assert_eq!(resumed.answers(), session.answers());
        assert_eq!(resumed.timer().direction(), Some(TimerDirection::Down));
        resumed.tick();
        assert_eq!(resumed.time_left(), 499);
        assert_eq!(restored.topic.id, "a");
    }

    #[test]
    fn other_user_cannot_resume() {
        let (_dir, store) = make_test_store();
        save(&store, Some(&user("u1")), Some(&snapshot_topic("a")), &exam(2));
        assert_eq!(
            load(&store, "u2", Utc::now(), day()).unwrap_err(),
            ResumeError::UserMismatch
        );
    }

    #[test]
    fn stale_snapshot_rejected() {
        let (_dir, store) = make_test_store();
        save(&store, Some(&user("u1")), Some(&snapshot_topic("a")), &exam(2));
        let later = Utc::now() + TimeDelta::hours(25);
        assert!(matches!(
            load(&store, "u1", later, day()),
            Err(ResumeError::Stale { .. })
        ));
    }

    #[test]
    fn save_without_user_or_topic_clears_prior_snapshot() {
        let (_dir, store) = make_test_store();
        save(&store, Some(&user("u1")), Some(&snapshot_topic("a")), &exam(2));
        assert!(store.contains(SNAPSHOT_KEY));
        save(&store, None, Some(&snapshot_topic("a")), &exam(2));
        assert!(!store.contains(SNAPSHOT_KEY));

        save(&store, Some(&user("u1")), Some(&snapshot_topic("a")), &exam(2));
        save(&store, Some(&user("u1")), None, &exam(2));
        assert_eq!(
            load(&store, "u1", Utc::now(), day()).unwrap_err(),
            ResumeError::Missing
        );
    }

    #[test]
    fn completed_session_is_not_saved() {
        let (_dir, store) = make_test_store();
        let mut session = exam(1);
        session.select_option(0);
        session.next();
        assert_eq!(session.state(), SessionState::Completed);
        save(&store, Some(&user("u1")), Some(&snapshot_topic("a")), &session);
        assert!(!store.contains(SNAPSHOT_KEY));
    }

    #[test]
    fn locked_topic_fails_restore() {
        let (_dir, store) = make_test_store();
        save(&store, Some(&user("u1")), Some(&snapshot_topic("paid")), &exam(2));
        let snapshot = load(&store, "u1", Utc::now(), day()).unwrap();
        let err = restore(snapshot.clone(), &catalog(), &Plan::Free.entitlement(), TimerSettings::default())
            .unwrap_err();
        assert_eq!(err, ResumeError::TopicLocked("paid".into()));
        assert!(restore(snapshot, &catalog(), &Plan::Premium.entitlement(), TimerSettings::default()).is_ok());
    }

    #[test]
    fn malformed_snapshots_are_rejected() {
        let (_dir, store) = make_test_store();
        save(&store, Some(&user("u1")), Some(&snapshot_topic("a")), &exam(2));
        let good = load(&store, "u1", Utc::now(), day()).unwrap();
        let now = Utc::now();

        let mut s = good.clone();
        s.schema_version = 0;
        assert_eq!(check(&s, "u1", now, day()), Err(ResumeError::UnsupportedSchema(0)));

        let mut s = good.clone();
        s.questions.clear();
        assert_eq!(check(&s, "u1", now, day()), Err(ResumeError::NoQuestions));

        let mut s = good.clone();
        s.mode = QuizMode::Review;
        assert_eq!(check(&s, "u1", now, day()), Err(ResumeError::NotResumable));

        let mut s = good.clone();
        s.topic = None;
        assert_eq!(check(&s, "u1", now, day()), Err(ResumeError::MissingTopic));

        let mut s = good;
        s.topic.as_mut().unwrap().id = "gone".into();
        let err = restore(s, &catalog(), &Plan::Premium.entitlement(), TimerSettings::default()).unwrap_err();
        assert_eq!(err, ResumeError::MissingTopic);
    }

    #[test]
    fn unreadable_snapshot_is_missing() {
        let (dir, store) = make_test_store();
        std::fs::write(dir.path().join("active_session.json"), "[1,2,3]").unwrap();
        assert_eq!(
            load(&store, "u1", Utc::now(), day()).unwrap_err(),
            ResumeError::Missing
        );
    }
}
