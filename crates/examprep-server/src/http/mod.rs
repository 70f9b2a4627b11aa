// SPDX-License-Identifier: Apache-2.0

pub(crate) mod admin;
pub(crate) mod catalog;
pub(crate) mod dev;
pub(crate) mod ops;
pub(crate) mod payment;
pub(crate) mod student;

use async_trait::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::Json;
use chrono::{SecondsFormat, Utc};
use examprep_api::params::parse_path_id;
use examprep_api::ApiError;
use examprep_core::DocumentId;
use examprep_model::{Course, Enrollment};
use examprep_store::Filter;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::error;

use crate::error::ApiFailure;
use crate::AppState;

/// JSON request body whose rejections render as API errors.
pub(crate) struct JsonBody<T>(pub T);

#[async_trait]
impl<T> FromRequest<AppState> for JsonBody<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = ApiFailure;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(body_rejection(&rejection, state.api.max_body_bytes)),
        }
    }
}

fn body_rejection(rejection: &JsonRejection, limit: usize) -> ApiFailure {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return ApiFailure(ApiError::payload_too_large(limit));
    }
    ApiFailure(ApiError::validation_failed(
        "Invalid request body",
        json!([{"reason": rejection.body_text()}]),
    ))
}

pub(crate) fn path_id(name: &str, raw: &str) -> Result<DocumentId, ApiFailure> {
    parse_path_id(name, raw).map_err(ApiFailure)
}

pub(crate) fn not_found(what: &str) -> ApiFailure {
    ApiFailure(ApiError::not_found(format!("{what} not found")))
}

pub(crate) fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Staff tokens issued by this server carry document ids; the dev admin
/// shortcut does not.
pub(crate) fn staff_document_id(id: &str) -> Option<DocumentId> {
    DocumentId::parse(id).ok()
}

pub(crate) fn document_value<T: Serialize>(record: &T) -> Result<Value, ApiFailure> {
    serde_json::to_value(record).map_err(|e| {
        error!("response encoding failed: {e}");
        ApiFailure(ApiError::internal())
    })
}

pub(crate) async fn course_index(
    state: &AppState,
) -> Result<HashMap<DocumentId, Course>, ApiFailure> {
    Ok(state
        .repo::<Course>()
        .find(&Filter::all(), None)
        .await?
        .into_iter()
        .map(|c| (c.id.clone(), c))
        .collect())
}

pub(crate) fn course_brief(course: &Course) -> Value {
    json!({
        "_id": course.id,
        "name": course.name,
        "price": course.price,
        "description": course.description,
    })
}

/// Enrollment with its course joined in place of the bare id; `null` when
/// the course no longer exists.
pub(crate) fn enrollment_view(
    enrollment: &Enrollment,
    courses: &HashMap<DocumentId, Course>,
) -> Result<Value, ApiFailure> {
    let course = match courses.get(&enrollment.course_id) {
        Some(course) => document_value(course)?,
        None => Value::Null,
    };
    Ok(json!({
        "courseId": course,
        "status": enrollment.status,
        "enrolledAt": enrollment.enrolled_at,
    }))
}
