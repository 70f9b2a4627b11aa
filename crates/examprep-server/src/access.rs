// SPDX-License-Identifier: Apache-2.0

//! Course entitlement: whether a caller may read the content of a course.

use examprep_api::ApiError;
use examprep_core::DocumentId;
use examprep_model::{Course, User};
use examprep_store::StoreError;
use tracing::{debug, error};

use crate::auth::DEV_ADMIN_ID;
use crate::error::ApiFailure;
use crate::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenial {
    UserNotFound,
    NotUnlocked,
    CourseUnavailable,
    CheckFailed,
}

impl AccessDenial {
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::UserNotFound => "User not found",
            Self::NotUnlocked => "Course not unlocked or not enrolled",
            Self::CourseUnavailable => "Course not available",
            Self::CheckFailed => "Access check failed",
        }
    }

    #[must_use]
    pub fn into_failure(self, course_id: &DocumentId) -> ApiFailure {
        let err = match self {
            Self::NotUnlocked => ApiError::course_locked(self.message(), course_id.as_str()),
            Self::CourseUnavailable => ApiError::course_unavailable(course_id.as_str()),
            Self::UserNotFound | Self::CheckFailed => ApiError::forbidden(self.message()),
        };
        ApiFailure(err)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AccessDecision {
    Granted(Course),
    Denied(AccessDenial),
}

impl AccessDecision {
    #[must_use]
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted(_))
    }
}

pub async fn check_course_access(
    state: &AppState,
    user_id: &str,
    course_id: &DocumentId,
) -> AccessDecision {
    match evaluate(state, user_id, course_id).await {
        Ok(decision) => decision,
        Err(e) => {
            error!(
                user_id,
                course_id = course_id.as_str(),
                code = e.code.as_str(),
                "course access check failed: {}",
                e.message
            );
            AccessDecision::Denied(AccessDenial::CheckFailed)
        }
    }
}

async fn published_course(
    state: &AppState,
    course_id: &DocumentId,
) -> Result<Option<Course>, StoreError> {
    Ok(state
        .repo::<Course>()
        .get(course_id)
        .await?
        .filter(|course| course.published))
}

async fn evaluate(
    state: &AppState,
    user_id: &str,
    course_id: &DocumentId,
) -> Result<AccessDecision, StoreError> {
    if state.api.dev_mode && user_id == DEV_ADMIN_ID {
        debug!(course_id = course_id.as_str(), "dev admin course access");
        return Ok(match published_course(state, course_id).await? {
            Some(course) => AccessDecision::Granted(course),
            None => AccessDecision::Denied(AccessDenial::CourseUnavailable),
        });
    }

    let Ok(user_id) = DocumentId::parse(user_id) else {
        return Ok(AccessDecision::Denied(AccessDenial::UserNotFound));
    };
    let Some(user) = state.repo::<User>().get(&user_id).await? else {
        return Ok(AccessDecision::Denied(AccessDenial::UserNotFound));
    };
    if !user.has_unlocked(course_id) {
        return Ok(AccessDecision::Denied(AccessDenial::NotUnlocked));
    }
    Ok(match published_course(state, course_id).await? {
        Some(course) => AccessDecision::Granted(course),
        None => AccessDecision::Denied(AccessDenial::CourseUnavailable),
    })
}

/// The course when access is granted, otherwise the mapped 403.
pub async fn require_course_access(
    state: &AppState,
    user_id: &str,
    course_id: &DocumentId,
) -> Result<Course, ApiFailure> {
    match check_course_access(state, user_id, course_id).await {
        AccessDecision::Granted(course) => Ok(course),
        AccessDecision::Denied(denial) => {
            debug!(
                user_id,
                course_id = course_id.as_str(),
                reason = denial.message(),
                "course access denied"
            );
            Err(denial.into_failure(course_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use chrono::Utc;
    use examprep_model::EnrollmentStatus;
    use examprep_store::MemoryStore;
    use std::sync::Arc;

    fn state(dev_mode: bool) -> AppState {
        let api = ApiConfig {
            dev_mode,
            ..ApiConfig::development()
        };
        AppState::for_tests(Arc::new(MemoryStore::new()), api)
    }

    fn course(published: bool) -> Course {
        Course {
            id: DocumentId::generate(),
            name: "CAT Complete".to_string(),
            description: "Full syllabus".to_string(),
            price: 4999.0,
            published,
            thumbnail: None,
            created_at: Utc::now(),
        }
    }

    async fn student(state: &AppState, course: &Course, status: Option<EnrollmentStatus>) -> User {
        let mut user = User::new("Asha", "asha@example.com", None, Utc::now()).expect("user");
        if let Some(status) = status {
            user.set_course_status(&course.id, status, Utc::now());
        }
        state.repo::<User>().insert(&user).await.expect("insert user");
        user
    }

    #[tokio::test]
    async fn unlocked_enrollment_on_published_course_is_granted() {
        let state = state(false);
        let c = course(true);
        state.repo::<Course>().insert(&c).await.expect("course");
        let user = student(&state, &c, Some(EnrollmentStatus::Unlocked)).await;
        let decision = check_course_access(&state, user.id.as_str(), &c.id).await;
        assert_eq!(decision, AccessDecision::Granted(c));
    }

    #[tokio::test]
    async fn denials_follow_the_check_order() {
        let state = state(false);
        let c = course(false);
        state.repo::<Course>().insert(&c).await.expect("course");

        let missing = DocumentId::generate();
        assert_eq!(
            check_course_access(&state, missing.as_str(), &c.id).await,
            AccessDecision::Denied(AccessDenial::UserNotFound)
        );
        assert_eq!(
            check_course_access(&state, "not-an-id", &c.id).await,
            AccessDecision::Denied(AccessDenial::UserNotFound)
        );

        let locked = student(&state, &c, Some(EnrollmentStatus::Locked)).await;
        assert_eq!(
            check_course_access(&state, locked.id.as_str(), &c.id).await,
            AccessDecision::Denied(AccessDenial::NotUnlocked)
        );

        let mut unlocked = locked.clone();
        unlocked.unlock_course(&c.id, Utc::now());
        state.repo::<User>().save(&unlocked).await.expect("save");
        assert_eq!(
            check_course_access(&state, unlocked.id.as_str(), &c.id).await,
            AccessDecision::Denied(AccessDenial::CourseUnavailable)
        );
    }

    #[tokio::test]
    async fn dev_admin_only_needs_a_published_course() {
        let published = course(true);
        let hidden = course(false);

        let dev = state(true);
        dev.repo::<Course>().insert(&published).await.expect("course");
        dev.repo::<Course>().insert(&hidden).await.expect("course");
        assert!(check_course_access(&dev, DEV_ADMIN_ID, &published.id).await.is_granted());
        assert_eq!(
            check_course_access(&dev, DEV_ADMIN_ID, &hidden.id).await,
            AccessDecision::Denied(AccessDenial::CourseUnavailable)
        );

        let prod = state(false);
        prod.repo::<Course>().insert(&published).await.expect("course");
        assert_eq!(
            check_course_access(&prod, DEV_ADMIN_ID, &published.id).await,
            AccessDecision::Denied(AccessDenial::UserNotFound)
        );
    }

    #[test]
    fn denials_map_to_forbidden_codes() {
        let id = DocumentId::generate();
        for denial in [
            AccessDenial::UserNotFound,
            AccessDenial::NotUnlocked,
            AccessDenial::CourseUnavailable,
            AccessDenial::CheckFailed,
        ] {
            let failure = denial.into_failure(&id);
            assert_eq!(failure.status(), axum::http::StatusCode::FORBIDDEN);
            assert_eq!(failure.0.message, denial.message());
        }
    }
}
