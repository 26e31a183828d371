use std::collections::BTreeSet;

use chrono::{Days, NaiveDate, TimeZone};

use crate::session::result::AttemptRecord;

/// Append `record`, evicting the oldest entries beyond `cap`.
pub fn record_attempt(history: &mut Vec<AttemptRecord>, record: AttemptRecord, cap: usize) {
    history.push(record);
    if history.len() > cap {
        let excess = history.len() - cap;
        history.drain(..excess);
    }
}

/// Calendar days with an attempt, as seen in `tz`.
fn practice_days<Tz: TimeZone>(history: &[AttemptRecord], tz: &Tz) -> BTreeSet<NaiveDate> {
    history
        .iter()
        .map(|a| a.created_at.with_timezone(tz).date_naive())
        .collect()
}

/// Consecutive days with at least one attempt, walking back from `today`.
/// Not having practised yet today does not break the streak.
pub fn streak_days<Tz: TimeZone>(history: &[AttemptRecord], today: NaiveDate, tz: &Tz) -> u32 {
    let days = practice_days(history, tz);
    let mut cursor = if days.contains(&today) {
        today
    } else {
        match today.checked_sub_days(Days::new(1)) {
            Some(d) => d,
            None => return 0,
        }
    };

    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        match cursor.checked_sub_days(Days::new(1)) {
            Some(d) => cursor = d,
            None => break,
        }
    }
    streak
}

pub fn best_streak<Tz: TimeZone>(history: &[AttemptRecord], tz: &Tz) -> u32 {
    let mut best = 0;
    let mut run = 0;
    let mut prev: Option<NaiveDate> = None;
    for day in practice_days(history, tz) {
        run = match prev {
            Some(p) if p.checked_add_days(Days::new(1)) == Some(day) => run + 1,
            _ => 1,
        };
        best = best.max(run);
        prev = Some(day);
    }
    best
}

#[derive(Clone, Debug, PartialEq)]
pub struct TopicAverage {
    pub topic_id: String,
    pub topic_name: String,
    pub average: f64,
    pub attempts: usize,
}

/// Mean score per topic, in order of first appearance.
pub fn topic_averages(history: &[AttemptRecord]) -> Vec<TopicAverage> {
    let mut sums: Vec<(TopicAverage, u64)> = Vec::new();
    for attempt in history {
        match sums.iter_mut().find(|(t, _)| t.topic_id == attempt.topic_id) {
            Some((t, sum)) => {
                t.attempts += 1;
                *sum += u64::from(attempt.score_percentage);
            }
            None => sums.push((
                TopicAverage {
                    topic_id: attempt.topic_id.clone(),
                    topic_name: attempt.topic_name.clone(),
                    average: 0.0,
                    attempts: 1,
                },
                u64::from(attempt.score_percentage),
            )),
        }
    }
    sums.into_iter()
        .map(|(mut t, sum)| {
            t.average = sum as f64 / t.attempts as f64;
            t
        })
        .collect()
}

fn pick(history: &[AttemptRecord], better: impl Fn(f64, f64) -> bool) -> Option<TopicAverage> {
    let mut chosen: Option<TopicAverage> = None;
    for t in topic_averages(history) {
        let replace = match &chosen {
            Some(c) => better(t.average, c.average),
            None => true,
        };
        if replace {
            chosen = Some(t);
        }
    }
    chosen
}

/// Lowest average; the first topic encountered wins ties.
pub fn weakest_topic(history: &[AttemptRecord]) -> Option<TopicAverage> {
    pick(history, |candidate, current| candidate < current)
}

/// Highest average; the first topic encountered wins ties.
pub fn strongest_topic(history: &[AttemptRecord]) -> Option<TopicAverage> {
    pick(history, |candidate, current| candidate > current)
}

/// The weakest topic's name, unless that is where the user already is.
pub fn recommended_topic(history: &[AttemptRecord], current_topic_id: Option<&str>) -> Option<String> {
    let weakest = weakest_topic(history)?;
    if current_topic_id == Some(weakest.topic_id.as_str()) {
        return None;
    }
    Some(weakest.topic_name)
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProgressReport {
    pub total_attempts: usize,
    pub average_score: f64,
    pub streak_days: u32,
    pub best_streak: u32,
    pub weakest: Option<TopicAverage>,
    pub strongest: Option<TopicAverage>,
    pub recommended: Option<String>,
}

/// `today` and every attempt's day are calendar days in `tz`.
pub fn progress_report<Tz: TimeZone>(
    history: &[AttemptRecord],
    today: NaiveDate,
    tz: &Tz,
    current_topic_id: Option<&str>,
) -> ProgressReport {
    let average_score = if history.is_empty() {
        0.0
    } else {
        history
            .iter()
            .map(|a| f64::from(a.score_percentage))
            .sum::<f64>()
            / history.len() as f64
    };
    ProgressReport {
        total_attempts: history.len(),
        average_score,
        streak_days: streak_days(history, today, tz),
        best_streak: best_streak(history, tz),
        weakest: weakest_topic(history),
        strongest: strongest_topic(history),
        recommended: recommended_topic(history, current_topic_id),
    }
}
