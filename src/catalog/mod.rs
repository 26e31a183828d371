pub mod document;
pub mod pool;
pub mod source;
pub mod validate;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

use crate::identity::Entitlement;
use source::{SourceError, TopicSource};

pub const CATALOG_LOCATOR: &str = "topics.json";

/// A single multiple-choice question. Shared behind `Arc` once loaded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(
        default,
        deserialize_with = "string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    pub question: String,
    pub options: Vec<String>,
    pub correct: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_topic_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_topic_name: Option<String>,
}

impl Question {
    pub fn is_well_formed(&self) -> bool {
        self.options.len() >= 2 && self.correct < self.options.len()
    }

    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.correct
    }

    /// Copy of this question tagged with the topic it was sampled from.
    pub fn tagged(&self, topic_id: &str, topic_name: &str) -> Self {
        Self {
            source_topic_id: Some(topic_id.to_string()),
            source_topic_name: Some(topic_name.to_string()),
            ..self.clone()
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// "all" or one subcategory id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategorySelection {
    #[default]
    All,
    Subcategory(String),
}

impl From<String> for CategorySelection {
    fn from(value: String) -> Self {
        if value.is_empty() || value == "all" {
            CategorySelection::All
        } else {
            CategorySelection::Subcategory(value)
        }
    }
}

impl From<CategorySelection> for String {
    fn from(value: CategorySelection) -> Self {
        match value {
            CategorySelection::All => "all".to_string(),
            CategorySelection::Subcategory(id) => id,
        }
    }
}

impl fmt::Display for CategorySelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategorySelection::All => f.write_str("all"),
            CategorySelection::Subcategory(id) => f.write_str(id),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlueprintEntry {
    #[serde(alias = "sourceTopicId")]
    pub topic_id: String,
    pub count: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubcategoryInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicDescriptor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subcategories: Vec<SubcategoryInfo>,
    #[serde(default)]
    pub requires_premium: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_category_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mock_exam_blueprint: Option<Vec<BlueprintEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mock_exam_question_count: Option<usize>,
}

impl TopicDescriptor {
    pub fn locators(&self) -> Vec<&str> {
        self.file
            .iter()
            .chain(self.files.iter())
            .map(String::as_str)
            .collect()
    }

    pub fn is_mock_exam(&self) -> bool {
        self.mock_exam_blueprint
            .as_ref()
            .is_some_and(|bp| !bp.is_empty())
    }

    pub fn allows_category(&self, subcategory_id: &str) -> bool {
        match &self.allowed_category_ids {
            Some(ids) => ids.iter().any(|id| id == subcategory_id),
            None => true,
        }
    }

    pub fn subcategory_name(&self, subcategory_id: &str) -> Option<&str> {
        self.subcategories
            .iter()
            .find(|s| s.id == subcategory_id)
            .map(|s| s.name.as_str())
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Catalog {
    pub topics: Vec<TopicDescriptor>,
}

impl Catalog {
    pub fn load(source: &dyn TopicSource) -> Result<Self, SourceError> {
        let raw = source.fetch(CATALOG_LOCATOR)?;
        serde_json::from_str(&raw).map_err(|e| SourceError::Parse {
            locator: CATALOG_LOCATOR.to_string(),
            message: e.to_string(),
        })
    }

    pub fn find(&self, topic_id: &str) -> Option<&TopicDescriptor> {
        self.topics.iter().find(|t| t.id == topic_id)
    }

    /// Restricted plans see only the first `max_topics` free topics, and
    /// never a premium one.
    pub fn is_unlocked(&self, topic_id: &str, entitlement: &Entitlement) -> bool {
        let Some(topic) = self.find(topic_id) else {
            return false;
        };
        let Some(max_topics) = entitlement.max_topics else {
            return true;
        };
        if topic.requires_premium {
            return false;
        }
        self.topics
            .iter()
            .filter(|t| !t.requires_premium)
            .take(max_topics)
            .any(|t| t.id == topic_id)
    }
}
