use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::identity::Plan;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_exam_seconds_per_question")]
    pub exam_seconds_per_question: u32,
    #[serde(default = "default_question_cap")]
    pub default_question_cap: usize,
    #[serde(default = "default_snapshot_max_age_hours")]
    pub snapshot_max_age_hours: i64,
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,
    #[serde(default = "default_warning_thresholds_secs")]
    pub warning_thresholds_secs: Vec<u32>,
    #[serde(default = "default_final_countdown_secs")]
    pub final_countdown_secs: u32,
    #[serde(default = "default_urgency_clear_secs")]
    pub urgency_clear_secs: u32,
    #[serde(default = "default_tolerant_loading")]
    pub tolerant_loading: bool,
    #[serde(default)]
    pub catalog_dir: Option<String>,
    #[serde(default)]
    pub catalog_url: Option<String>,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default = "default_plan")]
    pub plan: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_exam_seconds_per_question() -> u32 {
    45
}
fn default_question_cap() -> usize {
    40
}
fn default_snapshot_max_age_hours() -> i64 {
    24
}
fn default_history_cap() -> usize {
    50
}
fn default_warning_thresholds_secs() -> Vec<u32> {
    vec![300, 180, 60, 30]
}
fn default_final_countdown_secs() -> u32 {
    10
}
fn default_urgency_clear_secs() -> u32 {
    120
}
fn default_tolerant_loading() -> bool {
    true
}
fn default_user_id() -> String {
    "local".to_string()
}
fn default_plan() -> String {
    "free".to_string()
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            exam_seconds_per_question: default_exam_seconds_per_question(),
            default_question_cap: default_question_cap(),
            snapshot_max_age_hours: default_snapshot_max_age_hours(),
            history_cap: default_history_cap(),
            warning_thresholds_secs: default_warning_thresholds_secs(),
            final_countdown_secs: default_final_countdown_secs(),
            urgency_clear_secs: default_urgency_clear_secs(),
            tolerant_loading: default_tolerant_loading(),
            catalog_dir: None,
            catalog_url: None,
            user_id: default_user_id(),
            plan: default_plan(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quizdr")
            .join("config.toml")
    }

    /// Clamp values that would break timer or pool math back into range.
    /// Call after deserialization; hand-edited files are not trusted.
    pub fn validate(&mut self) {
        self.exam_seconds_per_question = self.exam_seconds_per_question.clamp(5, 600);
        self.default_question_cap = self.default_question_cap.clamp(1, 200);
        self.history_cap = self.history_cap.clamp(1, 500);
        self.snapshot_max_age_hours = self.snapshot_max_age_hours.clamp(1, 168);
        self.warning_thresholds_secs.sort_unstable_by(|a, b| b.cmp(a));
        self.warning_thresholds_secs.dedup();
        if Plan::from_name(&self.plan).is_none() {
            self.plan = default_plan();
        }
    }

    pub fn plan(&self) -> Plan {
        Plan::from_name(&self.plan).unwrap_or(Plan::Free)
    }
}
