//! Admin catalog maintenance: the course → subject → chapter → topic →
//! test → question hierarchy, plus study materials and announcements.
//!
//! Children are created under an existing parent and inherit its course id.
//! Deleting any level removes everything beneath it.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use examprep_api::{
    AnnouncementInput, ChapterInput, CourseInput, PublishRequest, QuestionInput,
    StudyMaterialInput, SubjectInput, TestInput, TopicInput,
};
use examprep_core::DocumentId;
use examprep_model::{
    Announcement, Chapter, Course, Question, StudyMaterial, Subject, Test, Topic,
};
use examprep_store::{Document, Filter, Sort};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::info;

use super::{not_found, path_id, staff_document_id, JsonBody};
use crate::auth::{AdminAuth, AdminOnly};
use crate::error::HandlerResult;
use crate::AppState;

/// Records removed by a cascading delete, the target itself excluded.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CascadeReport {
    pub subjects: usize,
    pub chapters: usize,
    pub topics: usize,
    pub tests: usize,
    pub questions: usize,
}

async fn load<T: Document>(
    state: &AppState,
    param: &str,
    raw: &str,
    what: &str,
) -> HandlerResult<T> {
    let id = path_id(param, raw)?;
    state.repo::<T>().get(&id).await?.ok_or_else(|| not_found(what))
}

async fn require_parent<T: Document>(
    state: &AppState,
    id: &DocumentId,
    what: &str,
) -> HandlerResult<T> {
    state.repo::<T>().get(id).await?.ok_or_else(|| not_found(what))
}

async fn children<T: Document>(
    state: &AppState,
    field: &str,
    parent: &DocumentId,
) -> HandlerResult<Vec<T>> {
    Ok(state
        .repo::<T>()
        .find(&Filter::all().eq(field, parent.as_str()), Some(&Sort::asc("order")))
        .await?)
}

fn created(key: &str, record: impl Serialize) -> Response {
    (StatusCode::CREATED, Json(json!({"success": true, key: record}))).into_response()
}

fn updated(key: &str, record: impl Serialize) -> Json<Value> {
    Json(json!({"success": true, key: record}))
}

fn removed(what: &str, report: CascadeReport) -> Json<Value> {
    Json(json!({
        "success": true,
        "message": format!("{what} deleted successfully"),
        "removed": report,
    }))
}

async fn purge_tests(
    state: &AppState,
    filter: Filter,
    report: &mut CascadeReport,
) -> HandlerResult<()> {
    let tests = state.repo::<Test>();
    let questions = state.repo::<Question>();
    for test in tests.find(&filter, None).await? {
        report.questions += questions
            .delete_where(&Filter::all().eq("testId", test.id.as_str()))
            .await?;
        if tests.delete(&test.id).await? {
            report.tests += 1;
        }
    }
    Ok(())
}

async fn purge_topics(
    state: &AppState,
    filter: Filter,
    report: &mut CascadeReport,
) -> HandlerResult<()> {
    let topics = state.repo::<Topic>();
    for topic in topics.find(&filter, None).await? {
        purge_tests(state, Filter::all().eq("topicId", topic.id.as_str()), report).await?;
        if topics.delete(&topic.id).await? {
            report.topics += 1;
        }
    }
    Ok(())
}

async fn purge_chapters(
    state: &AppState,
    filter: Filter,
    report: &mut CascadeReport,
) -> HandlerResult<()> {
    let chapters = state.repo::<Chapter>();
    for chapter in chapters.find(&filter, None).await? {
        purge_topics(state, Filter::all().eq("chapterId", chapter.id.as_str()), report).await?;
        if chapters.delete(&chapter.id).await? {
            report.chapters += 1;
        }
    }
    Ok(())
}

async fn purge_subjects(
    state: &AppState,
    filter: Filter,
    report: &mut CascadeReport,
) -> HandlerResult<()> {
    let subjects = state.repo::<Subject>();
    for subject in subjects.find(&filter, None).await? {
        purge_chapters(state, Filter::all().eq("subjectId", subject.id.as_str()), report).await?;
        if subjects.delete(&subject.id).await? {
            report.subjects += 1;
        }
    }
    Ok(())
}

// Courses

pub(crate) async fn list_courses_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
) -> HandlerResult<Json<Value>> {
    let courses = state
        .repo::<Course>()
        .find(&Filter::all(), Some(&Sort::desc("createdAt")))
        .await?;
    Ok(Json(json!({"success": true, "courses": courses})))
}

pub(crate) async fn create_course_handler(
    State(state): State<AppState>,
    AdminAuth(claims): AdminAuth,
    JsonBody(input): JsonBody<CourseInput>,
) -> HandlerResult<Response> {
    let course = input.create(Utc::now())?;
    state.repo::<Course>().insert(&course).await?;
    info!(course_id = %course.id, admin_id = %claims.id, "course created");
    Ok(created("course", course))
}

pub(crate) async fn update_course_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<CourseInput>,
) -> HandlerResult<Json<Value>> {
    let mut course: Course = load(&state, "id", &id, "Course").await?;
    input.apply(&mut course)?;
    state.repo::<Course>().save(&course).await?;
    Ok(updated("course", course))
}

pub(crate) async fn publish_course_handler(
    State(state): State<AppState>,
    AdminAuth(claims): AdminAuth,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<PublishRequest>,
) -> HandlerResult<Json<Value>> {
    let published = req.validate()?;
    let mut course: Course = load(&state, "id", &id, "Course").await?;
    course.published = published;
    state.repo::<Course>().save(&course).await?;
    info!(course_id = %course.id, admin_id = %claims.id, published, "course visibility changed");
    Ok(updated("course", course))
}

pub(crate) async fn delete_course_handler(
    State(state): State<AppState>,
    AdminOnly(claims): AdminOnly,
    Path(id): Path<String>,
) -> HandlerResult<Json<Value>> {
    let course: Course = load(&state, "id", &id, "Course").await?;
    let mut report = CascadeReport::default();
    let by_course = || Filter::all().eq("courseId", course.id.as_str());
    purge_subjects(&state, by_course(), &mut report).await?;
    // Catch children whose intermediate parent had already gone missing.
    purge_chapters(&state, by_course(), &mut report).await?;
    purge_topics(&state, by_course(), &mut report).await?;
    purge_tests(&state, by_course(), &mut report).await?;
    state.repo::<Course>().delete(&course.id).await?;
    info!(course_id = %course.id, admin_id = %claims.id, removed = ?report, "course deleted");
    Ok(removed("Course", report))
}

// Subjects

pub(crate) async fn list_subjects_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
    Path(course_id): Path<String>,
) -> HandlerResult<Json<Value>> {
    let course: Course = load(&state, "courseId", &course_id, "Course").await?;
    let subjects: Vec<Subject> = children(&state, "courseId", &course.id).await?;
    Ok(Json(json!({"success": true, "subjects": subjects})))
}

pub(crate) async fn create_subject_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
    JsonBody(input): JsonBody<SubjectInput>,
) -> HandlerResult<Response> {
    let course: Course = require_parent(&state, &input.course_id()?, "Course").await?;
    let subject = input.create(course.id)?;
    state.repo::<Subject>().insert(&subject).await?;
    Ok(created("subject", subject))
}

pub(crate) async fn update_subject_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<SubjectInput>,
) -> HandlerResult<Json<Value>> {
    let mut subject: Subject = load(&state, "id", &id, "Subject").await?;
    input.apply(&mut subject)?;
    state.repo::<Subject>().save(&subject).await?;
    Ok(updated("subject", subject))
}

pub(crate) async fn delete_subject_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
    Path(id): Path<String>,
) -> HandlerResult<Json<Value>> {
    let subject: Subject = load(&state, "id", &id, "Subject").await?;
    let mut report = CascadeReport::default();
    purge_chapters(&state, Filter::all().eq("subjectId", subject.id.as_str()), &mut report).await?;
    state.repo::<Subject>().delete(&subject.id).await?;
    Ok(removed("Subject", report))
}

// Chapters

pub(crate) async fn list_chapters_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
    Path(subject_id): Path<String>,
) -> HandlerResult<Json<Value>> {
    let subject: Subject = load(&state, "subjectId", &subject_id, "Subject").await?;
    let chapters: Vec<Chapter> = children(&state, "subjectId", &subject.id).await?;
    Ok(Json(json!({"success": true, "chapters": chapters})))
}

pub(crate) async fn create_chapter_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
    JsonBody(input): JsonBody<ChapterInput>,
) -> HandlerResult<Response> {
    let subject: Subject = require_parent(&state, &input.subject_id()?, "Subject").await?;
    let chapter = input.create(&subject)?;
    state.repo::<Chapter>().insert(&chapter).await?;
    Ok(created("chapter", chapter))
}

pub(crate) async fn update_chapter_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<ChapterInput>,
) -> HandlerResult<Json<Value>> {
    let mut chapter: Chapter = load(&state, "id", &id, "Chapter").await?;
    input.apply(&mut chapter)?;
    state.repo::<Chapter>().save(&chapter).await?;
    Ok(updated("chapter", chapter))
}

pub(crate) async fn delete_chapter_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
    Path(id): Path<String>,
) -> HandlerResult<Json<Value>> {
    let chapter: Chapter = load(&state, "id", &id, "Chapter").await?;
    let mut report = CascadeReport::default();
    purge_topics(&state, Filter::all().eq("chapterId", chapter.id.as_str()), &mut report).await?;
    state.repo::<Chapter>().delete(&chapter.id).await?;
    Ok(removed("Chapter", report))
}

// Topics

pub(crate) async fn list_topics_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
    Path(chapter_id): Path<String>,
) -> HandlerResult<Json<Value>> {
    let chapter: Chapter = load(&state, "chapterId", &chapter_id, "Chapter").await?;
    let topics: Vec<Topic> = children(&state, "chapterId", &chapter.id).await?;
    Ok(Json(json!({"success": true, "topics": topics})))
}

pub(crate) async fn create_topic_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
    JsonBody(input): JsonBody<TopicInput>,
) -> HandlerResult<Response> {
    let chapter: Chapter = require_parent(&state, &input.chapter_id()?, "Chapter").await?;
    let topic = input.create(&chapter)?;
    state.repo::<Topic>().insert(&topic).await?;
    Ok(created("topic", topic))
}

pub(crate) async fn update_topic_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<TopicInput>,
) -> HandlerResult<Json<Value>> {
    let mut topic: Topic = load(&state, "id", &id, "Topic").await?;
    input.apply(&mut topic)?;
    state.repo::<Topic>().save(&topic).await?;
    Ok(updated("topic", topic))
}

pub(crate) async fn delete_topic_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
    Path(id): Path<String>,
) -> HandlerResult<Json<Value>> {
    let topic: Topic = load(&state, "id", &id, "Topic").await?;
    let mut report = CascadeReport::default();
    purge_tests(&state, Filter::all().eq("topicId", topic.id.as_str()), &mut report).await?;
    state.repo::<Topic>().delete(&topic.id).await?;
    Ok(removed("Topic", report))
}

// Tests

pub(crate) async fn list_tests_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
    Path(topic_id): Path<String>,
) -> HandlerResult<Json<Value>> {
    let topic: Topic = load(&state, "topicId", &topic_id, "Topic").await?;
    let tests: Vec<Test> = children(&state, "topicId", &topic.id).await?;
    Ok(Json(json!({"success": true, "tests": tests})))
}

pub(crate) async fn create_test_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
    JsonBody(input): JsonBody<TestInput>,
) -> HandlerResult<Response> {
    let topic: Topic = require_parent(&state, &input.topic_id()?, "Topic").await?;
    let test = input.create(&topic)?;
    state.repo::<Test>().insert(&test).await?;
    Ok(created("test", test))
}

pub(crate) async fn update_test_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<TestInput>,
) -> HandlerResult<Json<Value>> {
    let mut test: Test = load(&state, "id", &id, "Test").await?;
    input.apply(&mut test)?;
    state.repo::<Test>().save(&test).await?;
    Ok(updated("test", test))
}

pub(crate) async fn delete_test_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
    Path(id): Path<String>,
) -> HandlerResult<Json<Value>> {
    let test: Test = load(&state, "id", &id, "Test").await?;
    let questions = state
        .repo::<Question>()
        .delete_where(&Filter::all().eq("testId", test.id.as_str()))
        .await?;
    state.repo::<Test>().delete(&test.id).await?;
    Ok(removed(
        "Test",
        CascadeReport {
            questions,
            ..CascadeReport::default()
        },
    ))
}

// Questions

pub(crate) async fn list_questions_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
    Path(test_id): Path<String>,
) -> HandlerResult<Json<Value>> {
    let test: Test = load(&state, "testId", &test_id, "Test").await?;
    let questions = state
        .repo::<Question>()
        .find(&Filter::all().eq("testId", test.id.as_str()), None)
        .await?;
    Ok(Json(json!({"success": true, "questions": questions})))
}

pub(crate) async fn create_question_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
    JsonBody(input): JsonBody<QuestionInput>,
) -> HandlerResult<Response> {
    let test: Test = require_parent(&state, &input.test_id()?, "Test").await?;
    let question = input.create(test.id)?;
    state.repo::<Question>().insert(&question).await?;
    Ok(created("question", question))
}

pub(crate) async fn update_question_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<QuestionInput>,
) -> HandlerResult<Json<Value>> {
    let mut question: Question = load(&state, "id", &id, "Question").await?;
    input.apply(&mut question)?;
    state.repo::<Question>().save(&question).await?;
    Ok(updated("question", question))
}

pub(crate) async fn delete_question_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
    Path(id): Path<String>,
) -> HandlerResult<Json<Value>> {
    let id = path_id("id", &id)?;
    if !state.repo::<Question>().delete(&id).await? {
        return Err(not_found("Question"));
    }
    Ok(removed("Question", CascadeReport::default()))
}

// Study materials and announcements

pub(crate) async fn create_study_material_handler(
    State(state): State<AppState>,
    AdminAuth(claims): AdminAuth,
    JsonBody(input): JsonBody<StudyMaterialInput>,
) -> HandlerResult<Response> {
    let course_id = input.course_id()?;
    if let Some(course_id) = &course_id {
        require_parent::<Course>(&state, course_id, "Course").await?;
    }
    let material = input.create(course_id, staff_document_id(&claims.id), Utc::now())?;
    state.repo::<StudyMaterial>().insert(&material).await?;
    info!(material_id = %material.id, admin_id = %claims.id, "study material added");
    Ok(created("material", material))
}

pub(crate) async fn create_announcement_handler(
    State(state): State<AppState>,
    AdminAuth(claims): AdminAuth,
    JsonBody(input): JsonBody<AnnouncementInput>,
) -> HandlerResult<Response> {
    let announcement = input.create(staff_document_id(&claims.id), Utc::now())?;
    state.repo::<Announcement>().insert(&announcement).await?;
    info!(announcement_id = %announcement.id, admin_id = %claims.id, "announcement published");
    Ok(created("announcement", announcement))
}
