use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use stylerate_core::aggregate::flatten;
use stylerate_core::bank::QuestionBank;
use stylerate_core::engine::{SurveyEngine, SurveyEngineConfig};
use stylerate_core::model::{CategoryLabel, Question, QuestionId, Selection, SentencePair};
use stylerate_core::randomizer::PresentationRandomizer;
use stylerate_core::session::SessionId;

fn make_question(id: u32) -> Question {
    let pairs = CategoryLabel::ALL
        .into_iter()
        .map(|category| SentencePair {
            category,
            sentence: format!("question {id}, sentence for {}", category.slug()),
        })
        .collect();
    Question::new(QuestionId(id), format!("Prompt {id}"), pairs).unwrap()
}

fn bench_plans(c: &mut Criterion) {
    let mut group = c.benchmark_group("plans");
    let question = make_question(1);

    group.bench_function("draw", |b| {
        let mut randomizer = PresentationRandomizer::seeded(1);
        let mut index = 0usize;
        b.iter(|| {
            index += 1;
            randomizer
                .plan_for(black_box(SessionId::new()), index, &question)
                .option_order()[0]
        })
    });

    group.bench_function("cached", |b| {
        let mut randomizer = PresentationRandomizer::seeded(1);
        let session = SessionId::new();
        randomizer.plan_for(session, 0, &question);
        b.iter(|| {
            randomizer
                .plan_for(black_box(session), black_box(0), &question)
                .option_order()[0]
        })
    });

    group.finish();
}

fn bench_flatten(c: &mut Criterion) {
    let mut group = c.benchmark_group("flatten");

    for count in [10u32, 100] {
        let questions: Vec<Question> = (1..=count).map(make_question).collect();
        let bank = QuestionBank::from_questions(questions).unwrap();
        let engine = SurveyEngine::new(
            Arc::new(bank),
            SurveyEngineConfig {
                seed: Some(1),
                ..Default::default()
            },
        );
        let session = engine.start_session("bench").unwrap();
        for _ in 0..count {
            engine.advance(session, &[Selection::Unanswered; 8]).unwrap();
        }
        let state = engine.snapshot(session).unwrap();

        group.bench_function(format!("questions={count}"), |b| {
            b.iter(|| flatten(black_box(&state)).unwrap().len())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_plans, bench_flatten);
criterion_main!(benches);
