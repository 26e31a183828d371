use crate::config::Config;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TimerSettings {
    pub seconds_per_question: u32,
    /// Remaining-time marks that raise a one-off warning, highest first.
    pub warning_thresholds: Vec<u32>,
    /// Below this many seconds every tick warns.
    pub final_countdown: u32,
    /// Above this many seconds no urgency indicator is shown.
    pub urgency_clear: u32,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

impl From<&Config> for TimerSettings {
    fn from(config: &Config) -> Self {
        Self {
            seconds_per_question: config.exam_seconds_per_question,
            warning_thresholds: config.warning_thresholds_secs.clone(),
            final_countdown: config.final_countdown_secs,
            urgency_clear: config.urgency_clear_secs,
        }
    }
}

impl TimerSettings {
    /// Exam budget in seconds, saturating at `u32::MAX`.
    pub fn budget_for(&self, question_count: usize) -> u32 {
        u32::try_from(question_count)
            .unwrap_or(u32::MAX)
            .saturating_mul(self.seconds_per_question)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerDirection {
    Down,
    Up,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Urgency {
    Calm,
    Low,
    Critical,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimerNotice {
    Warning { remaining: u32 },
    UrgencyChanged(Urgency),
    Pacing { overrun: u32 },
    PacingCleared,
    Expired,
}

/// Per-session clock. Counts down from the exam budget, or up from zero in
/// practice. Driven externally, one `tick()` per second.
#[derive(Clone, Debug)]
pub struct Timer {
    direction: Option<TimerDirection>,
    value: u32,
    budget: u32,
    running: bool,
    urgency: Urgency,
    overrun: Option<u32>,
    settings: TimerSettings,
}

impl Timer {
    /// A timer that never runs (review sessions).
    pub fn idle(settings: TimerSettings) -> Self {
        Self {
            direction: None,
            value: 0,
            budget: 0,
            running: false,
            urgency: Urgency::Calm,
            overrun: None,
            settings,
        }
    }

    pub fn countdown(question_count: usize, settings: TimerSettings) -> Self {
        let budget = settings.budget_for(question_count);
        Self::resume(TimerDirection::Down, budget, question_count, settings)
    }

    pub fn count_up(question_count: usize, settings: TimerSettings) -> Self {
        Self::resume(TimerDirection::Up, 0, question_count, settings)
    }

    /// Start from a persisted value, in the given direction.
    pub fn resume(
        direction: TimerDirection,
        value: u32,
        question_count: usize,
        settings: TimerSettings,
    ) -> Self {
        let budget = settings.budget_for(question_count);
        let mut timer = Self {
            direction: Some(direction),
            value,
            budget,
            running: true,
            urgency: Urgency::Calm,
            overrun: None,
            settings,
        };
        timer.urgency = timer.urgency_for(value);
        if direction == TimerDirection::Up && value > budget {
            timer.overrun = Some(value - budget);
        }
        timer
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn direction(&self) -> Option<TimerDirection> {
        self.direction
    }

    pub fn budget(&self) -> u32 {
        self.budget
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn urgency(&self) -> Urgency {
        self.urgency
    }

    /// Seconds past the exam-equivalent budget, practice only.
    pub fn pacing_overrun(&self) -> Option<u32> {
        self.overrun
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    pub fn tick(&mut self) -> Vec<TimerNotice> {
        if !self.running {
            return Vec::new();
        }
        match self.direction {
            Some(TimerDirection::Down) => self.tick_down(),
            Some(TimerDirection::Up) => self.tick_up(),
            None => Vec::new(),
        }
    }

    fn tick_down(&mut self) -> Vec<TimerNotice> {
        let mut notices = Vec::new();
        self.value = self.value.saturating_sub(1);

        if self.value == 0 {
            self.running = false;
            notices.push(TimerNotice::Expired);
            return notices;
        }

        let in_final_countdown = self.value <= self.settings.final_countdown;
        if in_final_countdown || self.settings.warning_thresholds.contains(&self.value) {
            notices.push(TimerNotice::Warning {
                remaining: self.value,
            });
        }

        let urgency = self.urgency_for(self.value);
        if urgency != self.urgency {
            self.urgency = urgency;
            notices.push(TimerNotice::UrgencyChanged(urgency));
        }
        notices
    }

    fn tick_up(&mut self) -> Vec<TimerNotice> {
        self.value = self.value.saturating_add(1);
        if self.value > self.budget {
            let overrun = self.value - self.budget;
            self.overrun = Some(overrun);
            vec![TimerNotice::Pacing { overrun }]
        } else if self.overrun.take().is_some() {
            vec![TimerNotice::PacingCleared]
        } else {
            Vec::new()
        }
    }

    fn urgency_for(&self, remaining: u32) -> Urgency {
        if self.direction != Some(TimerDirection::Down) || remaining > self.settings.urgency_clear {
            Urgency::Calm
        } else if remaining <= self.settings.final_countdown {
            Urgency::Critical
        } else {
            Urgency::Low
        }
    }
}
