use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::{CategorySelection, Question, TopicDescriptor};
use crate::session::QuizMode;
use crate::session::result::AttemptRecord;

pub const SCHEMA_VERSION: u32 = 1;

/// The part of a topic a snapshot needs to find it again in the catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotTopic {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub selected_category: CategorySelection,
    #[serde(default)]
    pub is_mock_exam: bool,
}

impl SnapshotTopic {
    pub fn from_descriptor(topic: &TopicDescriptor, category: &CategorySelection) -> Self {
        Self {
            id: topic.id.clone(),
            name: topic.name.clone(),
            selected_category: category.clone(),
            is_mock_exam: topic.is_mock_exam(),
        }
    }
}

/// One in-flight session, enough to rebuild it after a restart.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotData {
    pub schema_version: u32,
    pub user_id: String,
    pub mode: QuizMode,
    pub topic: Option<SnapshotTopic>,
    pub questions: Vec<Arc<Question>>,
    pub current_index: usize,
    /// One slot per question; `None` is unanswered.
    pub answers: Vec<Option<usize>>,
    pub feedback_shown: Vec<bool>,
    pub time_left: u32,
    pub saved_at: DateTime<Utc>,
}

impl SnapshotData {
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptHistoryData {
    pub schema_version: u32,
    pub attempts: Vec<AttemptRecord>,
}

impl Default for AttemptHistoryData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            attempts: Vec::new(),
        }
    }
}

impl AttemptHistoryData {
    pub fn needs_reset(&self) -> bool {
        self.schema_version != SCHEMA_VERSION
    }
}
