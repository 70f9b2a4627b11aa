use std::collections::HashMap;

use examprep_core::DocumentId;
use serde::Serialize;

use crate::catalog::{Chapter, Subject, Test, Topic};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicNode {
    #[serde(flatten)]
    pub topic: Topic,
    pub tests: Vec<Test>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChapterNode {
    #[serde(flatten)]
    pub chapter: Chapter,
    pub topics: Vec<TopicNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectNode {
    #[serde(flatten)]
    pub subject: Subject,
    pub chapters: Vec<ChapterNode>,
}

fn group_by_parent<T>(
    mut items: Vec<T>,
    parent: impl Fn(&T) -> &DocumentId,
    order: impl Fn(&T) -> (i64, DocumentId),
) -> HashMap<DocumentId, Vec<T>> {
    items.sort_by_key(|item| order(item));
    let mut grouped: HashMap<DocumentId, Vec<T>> = HashMap::new();
    for item in items {
        grouped.entry(parent(&item).clone()).or_default().push(item);
    }
    grouped
}

/// Joins the flat subject/chapter/topic/test collections of one course into
/// a nested tree. Every level is ordered by `order`, then by id. Children
/// whose parent is not present are dropped.
#[must_use]
pub fn assemble_course_structure(
    mut subjects: Vec<Subject>,
    chapters: Vec<Chapter>,
    topics: Vec<Topic>,
    tests: Vec<Test>,
) -> Vec<SubjectNode> {
    subjects.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
    let mut chapters = group_by_parent(chapters, |c| &c.subject_id, |c| (c.order, c.id.clone()));
    let mut topics = group_by_parent(topics, |t| &t.chapter_id, |t| (t.order, t.id.clone()));
    let mut tests = group_by_parent(tests, |t| &t.topic_id, |t| (t.order, t.id.clone()));

    subjects
        .into_iter()
        .map(|subject| {
            let chapter_nodes = chapters
                .remove(&subject.id)
                .unwrap_or_default()
                .into_iter()
                .map(|chapter| {
                    let topic_nodes = topics
                        .remove(&chapter.id)
                        .unwrap_or_default()
                        .into_iter()
                        .map(|topic| TopicNode {
                            tests: tests.remove(&topic.id).unwrap_or_default(),
                            topic,
                        })
                        .collect();
                    ChapterNode {
                        chapter,
                        topics: topic_nodes,
                    }
                })
                .collect();
            SubjectNode {
                subject,
                chapters: chapter_nodes,
            }
        })
        .collect()
}
