use std::sync::Arc;

use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::document::{self, Subcategory};
use crate::catalog::source::{SourceError, TopicSource};
use crate::catalog::{Catalog, CategorySelection, Question, TopicDescriptor};
use crate::identity::Entitlement;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("no questions available for '{topic_id}'; pick another topic or category")]
    Empty { topic_id: String },
    #[error("unknown topic '{0}'")]
    UnknownTopic(String),
    #[error("topic '{0}' is locked for the current plan")]
    TopicLocked(String),
    #[error("category '{category}' is not available for topic '{topic_id}'")]
    CategoryLocked { topic_id: String, category: String },
    #[error(transparent)]
    SourceLoad(#[from] SourceError),
}

/// What to assemble.
#[derive(Clone, Debug)]
pub struct PoolRequest<'a> {
    pub topic: &'a TopicDescriptor,
    pub category: CategorySelection,
    pub entitlement: Entitlement,
    /// Omit sources that fail to load instead of aborting.
    pub tolerant: bool,
    /// Ceiling when the topic does not set `mockExamQuestionCount`.
    pub default_cap: usize,
}

pub struct PoolAssembler<'a, S: ?Sized> {
    source: &'a S,
    catalog: &'a Catalog,
}

impl<'a, S: TopicSource + ?Sized> PoolAssembler<'a, S> {
    pub fn new(source: &'a S, catalog: &'a Catalog) -> Self {
        Self { source, catalog }
    }

    /// Build a shuffled, capped question pool for one session.
    pub fn assemble<R: Rng + ?Sized>(
        &self,
        request: &PoolRequest<'_>,
        rng: &mut R,
    ) -> Result<Vec<Arc<Question>>, PoolError> {
        let topic = request.topic;
        let mut pool = if topic.is_mock_exam() {
            let mut composite = self.compose_mock_exam(topic, request.tolerant, rng)?;
            composite.shuffle(rng);
            composite
        } else {
            self.collect_topic(request)?
        };

        pool.shuffle(rng);
        let cap = topic.mock_exam_question_count.unwrap_or(request.default_cap);
        pool.truncate(cap);

        if pool.is_empty() {
            return Err(PoolError::Empty {
                topic_id: topic.id.clone(),
            });
        }
        info!(
            topic = %topic.id,
            category = %request.category,
            questions = pool.len(),
            "assembled question pool"
        );
        Ok(pool)
    }

    /// Sample each blueprint entry from its source topic, tagging every question
    /// with where it came from. The result is in blueprint order, unshuffled.
    /// Blueprint sampling ignores entitlement caps.
    pub fn compose_mock_exam<R: Rng + ?Sized>(
        &self,
        topic: &TopicDescriptor,
        tolerant: bool,
        rng: &mut R,
    ) -> Result<Vec<Arc<Question>>, PoolError> {
        let blueprint = topic.mock_exam_blueprint.as_deref().unwrap_or_default();
        let mut composite = Vec::new();

        for entry in blueprint {
            let Some(source_topic) = self.catalog.find(&entry.topic_id) else {
                if tolerant {
                    warn!(mock = %topic.id, missing = %entry.topic_id, "blueprint names unknown topic");
                    continue;
                }
                return Err(PoolError::UnknownTopic(entry.topic_id.clone()));
            };

            let mut source_pool: Vec<Arc<Question>> = self
                .load_subcategories(source_topic, tolerant)?
                .into_iter()
                .flat_map(|s| s.questions)
                .collect();
            source_pool.shuffle(rng);

            let take = entry.count.min(source_pool.len());
            composite.extend(
                source_pool
                    .into_iter()
                    .take(take)
                    .map(|q| Arc::new(q.tagged(&source_topic.id, &source_topic.name))),
            );
        }
        Ok(composite)
    }

    fn collect_topic(&self, request: &PoolRequest<'_>) -> Result<Vec<Arc<Question>>, PoolError> {
        let topic = request.topic;
        let allowed: Vec<Subcategory> = self
            .load_subcategories(topic, request.tolerant)?
            .into_iter()
            .filter(|s| topic.allows_category(&s.id))
            .take(request.entitlement.max_subcategories.unwrap_or(usize::MAX))
            .collect();

        match &request.category {
            CategorySelection::All => {
                let per_sub = request
                    .entitlement
                    .max_questions_per_subcategory
                    .unwrap_or(usize::MAX);
                Ok(allowed
                    .into_iter()
                    .flat_map(|s| s.questions.into_iter().take(per_sub))
                    .collect())
            }
            CategorySelection::Subcategory(id) => allowed
                .into_iter()
                .find(|s| &s.id == id)
                .map(|s| s.questions)
                .ok_or_else(|| PoolError::CategoryLocked {
                    topic_id: topic.id.clone(),
                    category: id.clone(),
                }),
        }
    }

    /// Load and resolve every document of `topic`, in locator order.
    pub fn load_subcategories(
        &self,
        topic: &TopicDescriptor,
        tolerant: bool,
    ) -> Result<Vec<Subcategory>, PoolError> {
        let mut subcategories = Vec::new();
        for locator in topic.locators() {
            let loaded = self
                .source
                .fetch(locator)
                .and_then(|raw| document::resolve(locator, &raw));
            match loaded {
                Ok(mut subs) => {
                    for sub in &mut subs {
                        if sub.name.is_none() {
                            sub.name = topic.subcategory_name(&sub.id).map(str::to_string);
                        }
                    }
                    subcategories.extend(subs);
                }
                Err(e) if tolerant => {
                    warn!(topic = %topic.id, locator, error = %e, "skipping source that failed to load");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Ok(subcategories)
    }
}
