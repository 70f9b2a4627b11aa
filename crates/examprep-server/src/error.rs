// SPDX-License-Identifier: Apache-2.0

use axum::body::Body;
use axum::http::header::{CONTENT_LENGTH, RETRY_AFTER};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use examprep_api::error_mapping::{error_body, map_error};
use examprep_api::{ApiError, ApiErrorCode};
use examprep_model::ValidationError;
use examprep_store::{StoreError, StoreErrorCode};
use tracing::error;

/// Handler-level failure rendered through the central status table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiFailure(pub ApiError);

pub type HandlerResult<T> = Result<T, ApiFailure>;

impl ApiFailure {
    #[must_use]
    pub fn code(&self) -> ApiErrorCode {
        self.0.code
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(map_error(&self.0).status_code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<ApiError> for ApiFailure {
    fn from(value: ApiError) -> Self {
        Self(value)
    }
}

impl From<ValidationError> for ApiFailure {
    fn from(value: ValidationError) -> Self {
        Self(ApiError::validation_failed(value.0, serde_json::json!([])))
    }
}

impl From<StoreError> for ApiFailure {
    fn from(value: StoreError) -> Self {
        match value.code {
            StoreErrorCode::NotFound => Self(ApiError::not_found(value.message)),
            StoreErrorCode::Conflict => Self(ApiError::conflict(value.message)),
            StoreErrorCode::Validation => {
                Self(ApiError::validation_failed(value.message, serde_json::json!([])))
            }
            _ => {
                error!(code = value.code.as_str(), "store failure: {}", value.message);
                Self(ApiError::internal())
            }
        }
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut resp = (status, Json(error_body(&self.0))).into_response();
        if self.0.code == ApiErrorCode::RateLimited {
            let secs = self
                .0
                .details
                .get("retry_after_secs")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(1);
            if let Ok(v) = HeaderValue::from_str(&secs.to_string()) {
                resp.headers_mut().insert(RETRY_AFTER, v);
            }
        }
        resp.extensions_mut().insert(self.0);
        resp
    }
}

/// Re-renders an error body so its `requestId` matches the response header.
pub(crate) fn stamp_request_id(response: Response, request_id: &str) -> Response {
    let Some(err) = response.extensions().get::<ApiError>().cloned() else {
        return response;
    };
    let Ok(body) = serde_json::to_vec(&error_body(&err.with_request_id(request_id))) else {
        return response;
    };
    let (mut parts, _) = response.into_parts();
    parts.headers.remove(CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(body))
}
