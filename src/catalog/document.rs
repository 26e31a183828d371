//! Topic documents come in several historical shapes. They are resolved once,
//! at load time, into a flat list of [`Subcategory`] groups; nothing past this
//! module needs to know which shape a file used.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::catalog::Question;
use crate::catalog::source::SourceError;

/// The one subcategory whose questions were exported wrapped one level deeper,
/// as `questions: [ { "<id>": [ ...questions ] } ]`. Only this id is unwrapped.
pub const LEGACY_NESTED_SUBCATEGORY_ID: &str = "psr_interpretation";

#[derive(Clone, Debug)]
pub struct Subcategory {
    pub id: String,
    pub name: Option<String>,
    pub questions: Vec<Arc<Question>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TopicDocument {
    Wrapped { subcategories: Vec<RawSubcategory> },
    Domains { domains: Vec<RawDomain> },
    List(Vec<RawSubcategory>),
    Keyed(BTreeMap<String, RawSubcategoryBody>),
}

#[derive(Deserialize)]
struct RawSubcategory {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    questions: Vec<Value>,
}

#[derive(Deserialize)]
struct RawDomain {
    #[serde(default)]
    topics: Vec<RawSubcategory>,
}

#[derive(Deserialize)]
struct RawSubcategoryBody {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    questions: Vec<Value>,
}

pub fn resolve(locator: &str, raw: &str) -> Result<Vec<Subcategory>, SourceError> {
    let doc: TopicDocument = serde_json::from_str(raw).map_err(|e| SourceError::Parse {
        locator: locator.to_string(),
        message: e.to_string(),
    })?;

    let raw_subcategories: Vec<RawSubcategory> = match doc {
        TopicDocument::Wrapped { subcategories } => subcategories,
        TopicDocument::Domains { domains } => domains.into_iter().flat_map(|d| d.topics).collect(),
        TopicDocument::List(list) => list,
        TopicDocument::Keyed(map) => map
            .into_iter()
            .map(|(id, body)| RawSubcategory {
                id,
                name: body.name,
                questions: body.questions,
            })
            .collect(),
    };

    Ok(raw_subcategories
        .into_iter()
        .map(|raw| {
            let questions = extract_questions(locator, &raw.id, raw.questions);
            Subcategory {
                id: raw.id,
                name: raw.name,
                questions,
            }
        })
        .collect())
}

fn extract_questions(locator: &str, subcategory_id: &str, values: Vec<Value>) -> Vec<Arc<Question>> {
    let values = if subcategory_id == LEGACY_NESTED_SUBCATEGORY_ID {
        unwrap_legacy_nested(subcategory_id, values)
    } else {
        values
    };

    let mut questions = Vec::with_capacity(values.len());
    let mut dropped = 0usize;
    for value in values {
        match serde_json::from_value::<Question>(value) {
            Ok(q) if q.is_well_formed() => questions.push(Arc::new(q)),
            _ => dropped += 1,
        }
    }
    if dropped > 0 {
        warn!(locator, subcategory_id, dropped, "dropped malformed questions");
    }
    questions
}

fn unwrap_legacy_nested(subcategory_id: &str, mut values: Vec<Value>) -> Vec<Value> {
    let nested = values
        .first_mut()
        .and_then(|first| first.get_mut(subcategory_id))
        .and_then(|inner| inner.as_array_mut())
        .map(std::mem::take);
    nested.unwrap_or(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    const Q1: &str = r#"{"question": "One?", "options": ["a", "b"], "correct": 0}"#;
    const Q2: &str = r#"{"question": "Two?", "options": ["a", "b", "c"], "correct": 2}"#;

    fn count(subs: &[Subcategory]) -> usize {
        subs.iter().map(|s| s.questions.len()).sum()
    }

    #[test]
    fn resolves_wrapped_subcategories() {
        let raw = format!(r#"{{"id": "psr", "subcategories": [{{"id": "leave", "questions": [{Q1}, {Q2}]}}]}}"#);
        let subs = resolve("psr.json", &raw).unwrap();
        assert_eq!(subs.len(), 1);
        assert_eq!(subs[0].id, "leave");
        assert_eq!(count(&subs), 2);
    }

    #[test]
    fn resolves_domains_topics() {
        let raw = format!(
            r#"{{"domains": [{{"topics": [{{"id": "x", "questions": [{Q1}]}}]}},
                            {{"topics": [{{"id": "y", "questions": [{Q2}]}}]}}]}}"#
        );
        let subs = resolve("d.json", &raw).unwrap();
        let ids: Vec<&str> = subs.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["x", "y"]);
    }

    #[test]
    fn resolves_bare_array() {
        let raw = format!(r#"[{{"id": "only", "name": "Only", "questions": [{Q1}]}}]"#);
        let subs = resolve("a.json", &raw).unwrap();
        assert_eq!(subs[0].name.as_deref(), Some("Only"));
        assert_eq!(count(&subs), 1);
    }

    #[test]
    fn resolves_legacy_keyed_map() {
        let raw = format!(r#"{{"psr_leave": {{"questions": [{Q1}, {Q2}]}}, "psr_ethics": {{"questions": [{Q1}]}}}}"#);
        let subs = resolve("k.json", &raw).unwrap();
        let ids: Vec<&str> = subs.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["psr_ethics", "psr_leave"]);
        assert_eq!(count(&subs), 3);
    }

    #[test]
    fn unwraps_nested_questions_only_for_legacy_id() {
        let raw = format!(
            r#"{{"subcategories": [
                {{"id": "{LEGACY_NESTED_SUBCATEGORY_ID}", "questions": [{{"{LEGACY_NESTED_SUBCATEGORY_ID}": [{Q1}, {Q2}]}}]}},
                {{"id": "other", "questions": [{{"other": [{Q1}, {Q2}]}}]}}
            ]}}"#
        );
        let subs = resolve("n.json", &raw).unwrap();
        assert_eq!(subs[0].questions.len(), 2);
        // Same shape under any other id is not unwrapped; the wrapper is not a question.
        assert_eq!(subs[1].questions.len(), 0);
    }

    #[test]
    fn drops_malformed_questions() {
        let raw = format!(
            r#"{{"subcategories": [{{"id": "s", "questions": [
                {Q1},
                {{"question": "bad", "options": ["only"], "correct": 0}},
                {{"question": "worse", "options": ["a", "b"], "correct": 5}},
                {{"nonsense": true}}
            ]}}]}}"#
        );
        let subs = resolve("m.json", &raw).unwrap();
        assert_eq!(subs[0].questions.len(), 1);
    }

    #[test]
    fn unparseable_document_is_a_parse_error() {
        let err = resolve("broken.json", "{not json").unwrap_err();
        assert!(matches!(err, SourceError::Parse { .. }));
        assert!(err.to_string().contains("broken.json"));
    }
}
