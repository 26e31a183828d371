use std::collections::{BTreeMap, HashSet};

use crate::catalog::source::TopicSource;
use crate::catalog::{Catalog, TopicDescriptor, document};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TopicSummary {
    pub topic_id: String,
    pub subcategories: usize,
    pub questions: usize,
}

#[derive(Clone, Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub topics: Vec<TopicSummary>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Load every topic document in the catalog and report structural problems.
/// Duplicate question ids are warnings unless `strict_duplicates` is set;
/// everything else is an error.
pub fn validate_catalog(
    catalog: &Catalog,
    source: &dyn TopicSource,
    strict_duplicates: bool,
) -> ValidationReport {
    let mut report = ValidationReport::default();

    let mut seen_topics = HashSet::new();
    for topic in &catalog.topics {
        if !seen_topics.insert(topic.id.as_str()) {
            report.errors.push(format!("duplicate topic id '{}'", topic.id));
        }
    }

    let mut question_ids: BTreeMap<String, Vec<String>> = BTreeMap::new();

    for topic in &catalog.topics {
        if let Some(blueprint) = &topic.mock_exam_blueprint {
            for entry in blueprint {
                if catalog.find(&entry.topic_id).is_none() {
                    report.errors.push(format!(
                        "mock exam '{}' samples unknown topic '{}'",
                        topic.id, entry.topic_id
                    ));
                }
            }
            if topic.locators().is_empty() {
                continue;
            }
        }

        let locators = topic.locators();
        if locators.is_empty() {
            report
                .errors
                .push(format!("topic '{}' has no data file configured", topic.id));
            continue;
        }

        let mut summary = TopicSummary {
            topic_id: topic.id.clone(),
            subcategories: 0,
            questions: 0,
        };
        // Subcategory id -> usable question count, across all of the topic's files.
        let mut loaded: BTreeMap<String, usize> = BTreeMap::new();
        let mut load_failed = false;
        for locator in locators {
            let subs = match source
                .fetch(locator)
                .and_then(|raw| document::resolve(locator, &raw))
            {
                Ok(subs) => subs,
                Err(e) => {
                    report.errors.push(format!("topic '{}': {e}", topic.id));
                    load_failed = true;
                    continue;
                }
            };
            for sub in subs {
                summary.subcategories += 1;
                summary.questions += sub.questions.len();
                *loaded.entry(sub.id.clone()).or_default() += sub.questions.len();
                for q in &sub.questions {
                    if let Some(id) = &q.id {
                        question_ids
                            .entry(id.clone())
                            .or_default()
                            .push(format!("{}/{}", topic.id, sub.id));
                    }
                }
            }
        }
        if summary.questions == 0 {
            report
                .warnings
                .push(format!("topic '{}' has no usable questions", topic.id));
        }
        check_subcategories(topic, &loaded, load_failed, &mut report);
        report.topics.push(summary);
    }

    for (id, places) in question_ids {
        if places.len() > 1 {
            let message = format!(
                "question id '{id}' appears {} times ({})",
                places.len(),
                places.join(", ")
            );
            if strict_duplicates {
                report.errors.push(message);
            } else {
                report.warnings.push(message);
            }
        }
    }

    report
}

/// Cross-check a topic's declared subcategories against what its documents hold.
fn check_subcategories(
    topic: &TopicDescriptor,
    loaded: &BTreeMap<String, usize>,
    load_failed: bool,
    report: &mut ValidationReport,
) {
    let mut declared = HashSet::new();
    for info in &topic.subcategories {
        if !declared.insert(info.id.as_str()) {
            report.errors.push(format!(
                "topic '{}' declares subcategory '{}' more than once",
                topic.id, info.id
            ));
            continue;
        }
        match loaded.get(&info.id) {
            Some(0) => report.warnings.push(format!(
                "topic '{}' subcategory '{}' has zero questions",
                topic.id, info.id
            )),
            Some(_) => {}
            // A failed load is already reported; don't pile on.
            None if load_failed => {}
            None => report.errors.push(format!(
                "topic '{}' declares subcategory '{}' that no document contains",
                topic.id, info.id
            )),
        }
    }
}
