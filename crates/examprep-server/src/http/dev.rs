//! Development helpers. Mounted only when the server runs in dev mode.

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use examprep_api::{ApiError, UnlockCourseRequest};
use examprep_model::{Course, Role, UnlockOutcome, User};
use serde_json::{json, Value};
use tracing::{debug, info};

use super::student::unlocked_courses;
use super::{not_found, JsonBody};
use crate::auth::bearer_token;
use crate::error::{ApiFailure, HandlerResult};
use crate::seed::ensure_demo_student;
use crate::AppState;

pub(crate) async fn login_handler(State(state): State<AppState>) -> HandlerResult<Json<Value>> {
    let user = ensure_demo_student(&state).await?;
    let token = state.tokens.issue(
        user.id.as_str(),
        Role::Student,
        state.api.student_token_ttl,
        Utc::now(),
    )?;
    info!(user_id = %user.id, "dev login");
    Ok(Json(json!({
        "success": true,
        "message": "Development user logged in",
        "token": token,
        "user": {
            "id": user.id,
            "email": user.email,
            "name": user.name,
            "role": Role::Student,
        },
    })))
}

pub(crate) async fn verify_token_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> HandlerResult<Json<Value>> {
    let Some(token) = bearer_token(&headers) else {
        return Err(ApiFailure(ApiError::validation_failed(
            "No token provided",
            json!([{"field": "authorization", "reason": "missing"}]),
        )));
    };
    let claims = state.tokens.verify(token).map_err(|e| {
        debug!("dev token check failed: {e}");
        ApiFailure(ApiError::unauthorized("Invalid token"))
    })?;
    Ok(Json(json!({
        "success": true,
        "message": "Token is valid",
        "user": claims,
    })))
}

/// Unlocks a course for the demo student without any payment.
async fn unlock_for_demo(
    state: &AppState,
    req: &UnlockCourseRequest,
) -> HandlerResult<(User, bool)> {
    let course_id = req.validate()?;
    if state.repo::<Course>().get(&course_id).await?.is_none() {
        return Err(not_found("Course"));
    }
    let _guard = state.student_lock.lock().await;
    let mut user = ensure_demo_student(state).await?;
    if user.unlock_course(&course_id, Utc::now()) == UnlockOutcome::AlreadyUnlocked {
        return Ok((user, true));
    }
    state.repo::<User>().save(&user).await?;
    info!(user_id = %user.id, course_id = %course_id, "dev unlock");
    Ok((user, false))
}

pub(crate) async fn unlock_course_handler(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<UnlockCourseRequest>,
) -> HandlerResult<Json<Value>> {
    let (user, already) = unlock_for_demo(&state, &req).await?;
    if already {
        return Ok(Json(json!({
            "success": true,
            "message": "Course already unlocked",
            "alreadyUnlocked": true,
        })));
    }
    Ok(Json(json!({
        "success": true,
        "message": "Course unlocked successfully",
        "courseId": req.course_id.as_deref().map(str::trim),
        "userId": user.id,
    })))
}

pub(crate) async fn unlock_course_payment_handler(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<UnlockCourseRequest>,
) -> HandlerResult<Json<Value>> {
    let (user, already) = unlock_for_demo(&state, &req).await?;
    if already {
        return Ok(Json(json!({
            "success": true,
            "message": "Course already unlocked",
            "alreadyUnlocked": true,
            "enrolledCourses": user.enrolled_courses,
        })));
    }
    Ok(Json(json!({
        "success": true,
        "message": "Course unlocked successfully",
        "courseId": req.course_id.as_deref().map(str::trim),
        "userId": user.id,
        "enrolledCourses": user.enrolled_courses,
    })))
}

pub(crate) async fn my_courses_handler(
    State(state): State<AppState>,
) -> HandlerResult<Json<Value>> {
    let user = ensure_demo_student(&state).await?;
    let courses = unlocked_courses(&state, &user).await?;
    Ok(Json(json!({"success": true, "courses": courses})))
}
