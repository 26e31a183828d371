use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{Days, TimeZone, Utc};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use quizdr::catalog::pool::{PoolAssembler, PoolRequest};
use quizdr::catalog::source::{SourceError, TopicSource};
use quizdr::catalog::{BlueprintEntry, Catalog, CategorySelection, Question, TopicDescriptor};
use quizdr::engine::{analytics, scoring};
use quizdr::identity::Plan;
use quizdr::session::QuizMode;
use quizdr::session::result::AttemptRecord;

struct MemorySource(HashMap<String, String>);

impl TopicSource for MemorySource {
    fn fetch(&self, locator: &str) -> Result<String, SourceError> {
        self.0
            .get(locator)
            .cloned()
            .ok_or_else(|| SourceError::NotFound(locator.to_string()))
    }
}

fn make_document(topic: &str, subcategories: usize, per_sub: usize) -> String {
    let subs: Vec<serde_json::Value> = (0..subcategories)
        .map(|s| {
            let questions: Vec<serde_json::Value> = (0..per_sub)
                .map(|q| {
                    serde_json::json!({
                        "id": format!("{topic}-{s}-{q}"),
                        "question": format!("Question {q} of {topic}/{s}"),
                        "options": ["a", "b", "c", "d"],
                        "correct": q % 4,
                    })
                })
                .collect();
            serde_json::json!({ "id": format!("{topic}_{s}"), "questions": questions })
        })
        .collect();
    serde_json::json!({ "subcategories": subs }).to_string()
}

fn make_catalog() -> (Catalog, MemorySource) {
    let mut docs = HashMap::new();
    let mut topics = Vec::new();
    for t in 0..6 {
        let id = format!("topic{t}");
        docs.insert(format!("{id}.json"), make_document(&id, 20, 50));
        topics.push(TopicDescriptor {
            id: id.clone(),
            name: format!("Topic {t}"),
            file: Some(format!("{id}.json")),
            ..Default::default()
        });
    }
    topics.push(TopicDescriptor {
        id: "mock".into(),
        name: "Mock".into(),
        mock_exam_question_count: Some(100),
        mock_exam_blueprint: Some(
            (0..6)
                .map(|t| BlueprintEntry {
                    topic_id: format!("topic{t}"),
                    count: 20,
                })
                .collect(),
        ),
        ..Default::default()
    });
    (Catalog { topics }, MemorySource(docs))
}

fn bench_assemble(c: &mut Criterion) {
    let (catalog, source) = make_catalog();
    let assembler = PoolAssembler::new(&source, &catalog);
    let topic = catalog.find("topic0").unwrap();
    let mock = catalog.find("mock").unwrap();

    c.bench_function("assemble topic (1000 questions, premium)", |b| {
        let mut rng = SmallRng::seed_from_u64(1);
        let request = PoolRequest {
            topic,
            category: CategorySelection::All,
            entitlement: Plan::Premium.entitlement(),
            tolerant: true,
            default_cap: 40,
        };
        b.iter(|| assembler.assemble(black_box(&request), &mut rng))
    });

    c.bench_function("assemble mock exam (6 sources)", |b| {
        let mut rng = SmallRng::seed_from_u64(2);
        let request = PoolRequest {
            topic: mock,
            category: CategorySelection::All,
            entitlement: Plan::Free.entitlement(),
            tolerant: true,
            default_cap: 40,
        };
        b.iter(|| assembler.assemble(black_box(&request), &mut rng))
    });
}

fn bench_scoring(c: &mut Criterion) {
    let questions: Vec<Arc<Question>> = (0..200)
        .map(|i| {
            Arc::new(Question {
                id: None,
                question: format!("q{i}"),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct: i % 4,
                explanation: None,
                source_topic_id: Some(format!("t{}", i % 5)),
                source_topic_name: None,
            })
        })
        .collect();
    let answers: BTreeMap<usize, usize> = (0..200).filter(|i| i % 3 != 0).map(|i| (i, i % 2)).collect();

    c.bench_function("tally (200 questions)", |b| {
        b.iter(|| scoring::tally(black_box(&questions), black_box(&answers)))
    });
    c.bench_function("mock_breakdown (200 questions, 5 sources)", |b| {
        b.iter(|| scoring::mock_breakdown(black_box(&questions), black_box(&answers)))
    });
}

fn bench_analytics(c: &mut Criterion) {
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
    let history: Vec<AttemptRecord> = (0..500u64)
        .map(|i| AttemptRecord {
            topic_id: format!("topic{}", i % 12),
            topic_name: format!("Topic {}", i % 12),
            mode: QuizMode::Exam,
            score_percentage: (i * 37 % 101) as u32,
            total_questions: 40,
            created_at: start + Days::new(i / 3),
        })
        .collect();
    let today = (start + Days::new(166)).date_naive();

    c.bench_function("progress_report (500 attempts)", |b| {
        b.iter(|| analytics::progress_report(black_box(&history), today, &Utc, Some("topic3")))
    });
}

criterion_group!(benches, bench_assemble, bench_scoring, bench_analytics);
criterion_main!(benches);
