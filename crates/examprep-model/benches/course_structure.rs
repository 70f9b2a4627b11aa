use criterion::{black_box, criterion_group, criterion_main, Criterion};
use examprep_model::{assemble_course_structure, Chapter, DocumentId, Subject, Test, Topic};

fn id(n: u64) -> DocumentId {
    DocumentId::from_parts(1_700_000_000, n)
}

fn fixture() -> (Vec<Subject>, Vec<Chapter>, Vec<Topic>, Vec<Test>) {
    let course = id(0);
    let mut subjects = Vec::new();
    let mut chapters = Vec::new();
    let mut topics = Vec::new();
    let mut tests = Vec::new();
    let mut next = 1_u64;
    for s in 0..6 {
        let subject_id = id(next);
        next += 1;
        subjects.push(Subject {
            id: subject_id.clone(),
            course_id: course.clone(),
            name: format!("subject-{s}"),
            description: None,
            order: 6 - s,
        });
        for c in 0..10 {
            let chapter_id = id(next);
            next += 1;
            chapters.push(Chapter {
                id: chapter_id.clone(),
                course_id: course.clone(),
                subject_id: subject_id.clone(),
                name: format!("chapter-{c}"),
                description: None,
                order: c,
            });
            for t in 0..8 {
                let topic_id = id(next);
                next += 1;
                topics.push(Topic {
                    id: topic_id.clone(),
                    course_id: course.clone(),
                    subject_id: Some(subject_id.clone()),
                    chapter_id: chapter_id.clone(),
                    name: format!("topic-{t}"),
                    description: None,
                    order: t,
                });
                for k in 0..4 {
                    tests.push(Test {
                        id: id(next),
                        course_id: course.clone(),
                        topic_id: topic_id.clone(),
                        title: format!("test-{k}"),
                        duration_minutes: Some(45),
                        total_marks: Some(100.0),
                        order: 4 - k,
                    });
                    next += 1;
                }
            }
        }
    }
    (subjects, chapters, topics, tests)
}

fn bench_assemble(c: &mut Criterion) {
    let (subjects, chapters, topics, tests) = fixture();
    c.bench_function("assemble_course_structure_full_course", |b| {
        b.iter(|| {
            assemble_course_structure(
                black_box(subjects.clone()),
                black_box(chapters.clone()),
                black_box(topics.clone()),
                black_box(tests.clone()),
            )
        })
    });
}

criterion_group!(benches, bench_assemble);
criterion_main!(benches);
