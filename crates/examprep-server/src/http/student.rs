// SPDX-License-Identifier: Apache-2.0

//! Student-facing catalog and content routes. Everything below the course
//! level goes through the entitlement check.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use examprep_api::params::parse_optional_course_id;
use examprep_model::{
    assemble_course_structure, Announcement, Audience, Chapter, Course, EnrollmentStatus,
    StudyMaterial, Subject, Test, Topic, User,
};
use examprep_store::{Filter, Sort};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use super::{course_index, document_value, not_found, path_id};
use crate::access::require_course_access;
use crate::auth::{OptionalAuth, StudentAuth};
use crate::error::HandlerResult;
use crate::payments::load_student;
use crate::AppState;

fn in_order() -> Sort {
    Sort::asc("order")
}

pub(crate) async fn published_courses_handler(
    State(state): State<AppState>,
) -> HandlerResult<Json<Value>> {
    let courses = state
        .repo::<Course>()
        .find(
            &Filter::all().eq("published", true),
            Some(&Sort::desc("createdAt")),
        )
        .await?;
    Ok(Json(json!({"success": true, "courses": courses})))
}

pub(crate) async fn published_course_handler(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> HandlerResult<Json<Value>> {
    let id = path_id("courseId", &course_id)?;
    let course = state
        .repo::<Course>()
        .get(&id)
        .await?
        .filter(|c| c.published)
        .ok_or_else(|| not_found("Course"))?;
    Ok(Json(json!({"success": true, "course": course})))
}

pub(crate) async fn course_detail_handler(
    State(state): State<AppState>,
    Path(course_id): Path<String>,
) -> HandlerResult<Json<Value>> {
    let id = path_id("courseId", &course_id)?;
    let course = state
        .repo::<Course>()
        .get(&id)
        .await?
        .ok_or_else(|| not_found("Course"))?;
    Ok(Json(json!({"success": true, "course": course})))
}

pub(crate) async fn course_subjects_handler(
    State(state): State<AppState>,
    StudentAuth(identity): StudentAuth,
    Path(course_id): Path<String>,
) -> HandlerResult<Json<Value>> {
    let course_id = path_id("courseId", &course_id)?;
    let course = require_course_access(&state, &identity.id, &course_id).await?;
    let subjects = state
        .repo::<Subject>()
        .find(&Filter::all().eq("courseId", course.id.as_str()), Some(&in_order()))
        .await?;
    Ok(Json(json!({"success": true, "subjects": subjects, "course": course})))
}

pub(crate) async fn subject_chapters_handler(
    State(state): State<AppState>,
    StudentAuth(identity): StudentAuth,
    Path(subject_id): Path<String>,
) -> HandlerResult<Json<Value>> {
    let id = path_id("subjectId", &subject_id)?;
    let subject = state
        .repo::<Subject>()
        .get(&id)
        .await?
        .ok_or_else(|| not_found("Subject"))?;
    require_course_access(&state, &identity.id, &subject.course_id).await?;
    let chapters = state
        .repo::<Chapter>()
        .find(&Filter::all().eq("subjectId", subject.id.as_str()), Some(&in_order()))
        .await?;
    Ok(Json(json!({"success": true, "chapters": chapters, "subject": subject})))
}

pub(crate) async fn chapter_topics_handler(
    State(state): State<AppState>,
    StudentAuth(identity): StudentAuth,
    Path(chapter_id): Path<String>,
) -> HandlerResult<Json<Value>> {
    let id = path_id("chapterId", &chapter_id)?;
    let chapter = state
        .repo::<Chapter>()
        .get(&id)
        .await?
        .ok_or_else(|| not_found("Chapter"))?;
    require_course_access(&state, &identity.id, &chapter.course_id).await?;
    let topics = state
        .repo::<Topic>()
        .find(&Filter::all().eq("chapterId", chapter.id.as_str()), Some(&in_order()))
        .await?;
    Ok(Json(json!({"success": true, "topics": topics, "chapter": chapter})))
}

pub(crate) async fn topic_tests_handler(
    State(state): State<AppState>,
    StudentAuth(identity): StudentAuth,
    Path(topic_id): Path<String>,
) -> HandlerResult<Json<Value>> {
    let id = path_id("topicId", &topic_id)?;
    let topic = state
        .repo::<Topic>()
        .get(&id)
        .await?
        .ok_or_else(|| not_found("Topic"))?;
    require_course_access(&state, &identity.id, &topic.course_id).await?;
    let tests = state
        .repo::<Test>()
        .find(&Filter::all().eq("topicId", topic.id.as_str()), Some(&in_order()))
        .await?;
    Ok(Json(json!({"success": true, "tests": tests, "topic": topic})))
}

pub(crate) async fn course_structure_handler(
    State(state): State<AppState>,
    StudentAuth(identity): StudentAuth,
    Path(course_id): Path<String>,
) -> HandlerResult<Json<Value>> {
    let course_id = path_id("courseId", &course_id)?;
    let course = require_course_access(&state, &identity.id, &course_id).await?;
    let by_course = Filter::all().eq("courseId", course.id.as_str());
    let structure = assemble_course_structure(
        state.repo::<Subject>().find(&by_course, None).await?,
        state.repo::<Chapter>().find(&by_course, None).await?,
        state.repo::<Topic>().find(&by_course, None).await?,
        state.repo::<Test>().find(&by_course, None).await?,
    );
    Ok(Json(json!({"success": true, "course": course, "structure": structure})))
}

/// Unlocked enrollments of `user` joined with their courses. Enrollments
/// whose course has been deleted are left out.
pub(crate) async fn unlocked_courses(
    state: &AppState,
    user: &User,
) -> HandlerResult<Vec<Value>> {
    let courses = course_index(state).await?;
    let mut out = Vec::new();
    let unlocked = user
        .enrolled_courses
        .iter()
        .filter(|e| e.status == EnrollmentStatus::Unlocked);
    for enrollment in unlocked {
        let Some(course) = courses.get(&enrollment.course_id) else {
            continue;
        };
        let mut view = document_value(course)?;
        if let Some(obj) = view.as_object_mut() {
            obj.insert("status".to_string(), json!(enrollment.status));
            obj.insert("enrolledAt".to_string(), json!(enrollment.enrolled_at));
        }
        out.push(view);
    }
    Ok(out)
}

pub(crate) async fn my_courses_handler(
    State(state): State<AppState>,
    StudentAuth(identity): StudentAuth,
) -> HandlerResult<Json<Value>> {
    let user = load_student(&state, &identity).await?;
    let courses = unlocked_courses(&state, &user).await?;
    Ok(Json(json!({"success": true, "courses": courses})))
}

pub(crate) async fn study_materials_handler(
    State(state): State<AppState>,
    StudentAuth(_): StudentAuth,
    Query(query): Query<BTreeMap<String, String>>,
) -> HandlerResult<Json<Value>> {
    let course_id = parse_optional_course_id(&query)?;
    let mut materials = state
        .repo::<StudyMaterial>()
        .find(
            &Filter::all().eq("isActive", true),
            Some(&Sort::desc("createdAt")),
        )
        .await?;
    if let Some(course_id) = &course_id {
        materials.retain(|m| m.course_id.as_ref().map_or(true, |c| c == course_id));
    }
    Ok(Json(json!({
        "success": true,
        "count": materials.len(),
        "materials": materials,
    })))
}

/// Visible announcements, pinned first, then newest. Student-only notices
/// need a valid token.
pub(crate) async fn announcements_handler(
    State(state): State<AppState>,
    OptionalAuth(claims): OptionalAuth,
) -> HandlerResult<Json<Value>> {
    let now = Utc::now();
    let signed_in = claims.is_some();
    let mut announcements = state
        .repo::<Announcement>()
        .find(&Filter::all().eq("isActive", true), None)
        .await?;
    announcements.retain(|a| {
        a.is_visible(now) && (signed_in || a.target_audience == Audience::All)
    });
    announcements.sort_by(|a, b| {
        b.is_pinned
            .cmp(&a.is_pinned)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    Ok(Json(json!({"success": true, "announcements": announcements})))
}
