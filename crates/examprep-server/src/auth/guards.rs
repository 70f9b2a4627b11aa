// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use examprep_api::ApiError;
use examprep_model::{Role, User};
use examprep_store::Filter;
use tracing::{debug, warn};

use super::tokens::Claims;
use crate::error::ApiFailure;
use crate::AppState;

/// Identity used for the dev-mode admin shortcut.
pub const DEV_ADMIN_ID: &str = "admin-dev-id";
pub const DEMO_STUDENT_ID: &str = "507f1f77bcf86cd799439011";
pub const DEMO_STUDENT_EMAIL: &str = "demo@test.com";

const INVALID_TOKEN: &str = "Unauthorized! Invalid Token";

/// Raw token from `Authorization: Bearer <token>`.
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let raw = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = raw.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

fn verified_claims(parts: &Parts, state: &AppState) -> Result<Claims, ApiFailure> {
    let token = bearer_token(&parts.headers)
        .ok_or_else(|| ApiFailure(ApiError::unauthorized(INVALID_TOKEN)))?;
    state.tokens.verify(token).map_err(|e| {
        debug!("bearer token rejected: {e}");
        ApiFailure(ApiError::unauthorized(INVALID_TOKEN))
    })
}

pub fn permit_roles(claims: &Claims, roles: &[Role], denial: &str) -> Result<(), ApiFailure> {
    if roles.contains(&claims.role) {
        Ok(())
    } else {
        Err(ApiFailure(ApiError::forbidden(denial)))
    }
}

/// Admin or subadmin.
#[derive(Debug, Clone)]
pub struct AdminAuth(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AdminAuth {
    type Rejection = ApiFailure;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = verified_claims(parts, state)?;
        permit_roles(
            &claims,
            &[Role::Admin, Role::Subadmin],
            "Access Denied! Admin/Subadmin only",
        )?;
        Ok(Self(claims))
    }
}

#[derive(Debug, Clone)]
pub struct AdminOnly(pub Claims);

#[async_trait]
impl FromRequestParts<AppState> for AdminOnly {
    type Rejection = ApiFailure;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = verified_claims(parts, state)?;
        permit_roles(&claims, &[Role::Admin], "Access Denied! Admin only")?;
        Ok(Self(claims))
    }
}

/// Guard that never rejects.
#[derive(Debug, Clone)]
pub struct OptionalAuth(pub Option<Claims>);

#[async_trait]
impl FromRequestParts<AppState> for OptionalAuth {
    type Rejection = ApiFailure;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(verified_claims(parts, state).ok()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentitySource {
    Token,
    DevAdminShortcut,
    DemoFallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudentIdentity {
    pub id: String,
    pub role: Role,
    pub source: IdentitySource,
}

impl StudentIdentity {
    #[must_use]
    pub fn is_dev_admin(&self) -> bool {
        self.id == DEV_ADMIN_ID
    }
}

/// Any authenticated caller. In dev mode a missing or bad token resolves to
/// the demo student instead of failing.
#[derive(Debug, Clone)]
pub struct StudentAuth(pub StudentIdentity);

#[async_trait]
impl FromRequestParts<AppState> for StudentAuth {
    type Rejection = ApiFailure;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let dev_mode = state.api.dev_mode;
        if let Some(token) = bearer_token(&parts.headers) {
            if dev_mode && token.contains("admin") {
                debug!("dev admin token shortcut");
                return Ok(Self(StudentIdentity {
                    id: DEV_ADMIN_ID.to_string(),
                    role: Role::Admin,
                    source: IdentitySource::DevAdminShortcut,
                }));
            }
            match state.tokens.verify(token) {
                Ok(claims) => {
                    return Ok(Self(StudentIdentity {
                        id: claims.id,
                        role: claims.role,
                        source: IdentitySource::Token,
                    }))
                }
                Err(e) if dev_mode => debug!("invalid token, using demo student: {e}"),
                Err(_) => return Err(ApiFailure(ApiError::unauthorized(INVALID_TOKEN))),
            }
        } else if !dev_mode {
            return Err(ApiFailure(ApiError::unauthorized(INVALID_TOKEN)));
        }
        Ok(Self(demo_student_identity(state).await))
    }
}

async fn demo_student_identity(state: &AppState) -> StudentIdentity {
    let users = state.repo::<User>();
    let by_email = users
        .find_one(&Filter::all().eq("email", DEMO_STUDENT_EMAIL))
        .await;
    let id = match by_email {
        Ok(Some(user)) => user.id.to_string(),
        Ok(None) => DEMO_STUDENT_ID.to_string(),
        Err(e) => {
            warn!("demo student lookup failed: {}", e.message);
            DEMO_STUDENT_ID.to_string()
        }
    };
    StudentIdentity {
        id,
        role: Role::Student,
        source: IdentitySource::DemoFallback,
    }
}
