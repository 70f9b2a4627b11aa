// SPDX-License-Identifier: Apache-2.0

use serde_json::{json, Value};

use crate::{ApiError, ApiErrorCode};

pub const API_ERROR_SCHEMA_REF: &str = "#/components/schemas/ApiError";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiErrorMapping {
    pub status_code: u16,
    pub schema_ref: &'static str,
}

#[must_use]
pub fn map_error(error: &ApiError) -> ApiErrorMapping {
    let status_code = match error.code {
        ApiErrorCode::InvalidQueryParameter | ApiErrorCode::ValidationFailed => 400,
        ApiErrorCode::Unauthorized | ApiErrorCode::PaymentVerificationFailed => 401,
        ApiErrorCode::Forbidden | ApiErrorCode::CourseLocked | ApiErrorCode::CourseUnavailable => {
            403
        }
        ApiErrorCode::NotFound => 404,
        ApiErrorCode::Conflict => 409,
        ApiErrorCode::PayloadTooLarge => 413,
        ApiErrorCode::RateLimited => 429,
        ApiErrorCode::UpstreamPaymentUnavailable => 502,
        ApiErrorCode::Internal => 500,
    };

    ApiErrorMapping {
        status_code,
        schema_ref: API_ERROR_SCHEMA_REF,
    }
}

/// Error body on the wire. `success` and `message` sit at the top level
/// because existing clients read them there.
#[must_use]
pub fn error_body(error: &ApiError) -> Value {
    json!({
        "success": false,
        "message": error.message,
        "error": error,
    })
}
