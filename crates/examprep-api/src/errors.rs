// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ApiErrorCode {
    InvalidQueryParameter,
    ValidationFailed,
    Unauthorized,
    Forbidden,
    NotFound,
    Conflict,
    CourseLocked,
    CourseUnavailable,
    PaymentVerificationFailed,
    UpstreamPaymentUnavailable,
    RateLimited,
    PayloadTooLarge,
    Internal,
}

impl ApiErrorCode {
    pub const ALL: [Self; 13] = [
        Self::InvalidQueryParameter,
        Self::ValidationFailed,
        Self::Unauthorized,
        Self::Forbidden,
        Self::NotFound,
        Self::Conflict,
        Self::CourseLocked,
        Self::CourseUnavailable,
        Self::PaymentVerificationFailed,
        Self::UpstreamPaymentUnavailable,
        Self::RateLimited,
        Self::PayloadTooLarge,
        Self::Internal,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidQueryParameter => "InvalidQueryParameter",
            Self::ValidationFailed => "ValidationFailed",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::NotFound => "NotFound",
            Self::Conflict => "Conflict",
            Self::CourseLocked => "CourseLocked",
            Self::CourseUnavailable => "CourseUnavailable",
            Self::PaymentVerificationFailed => "PaymentVerificationFailed",
            Self::UpstreamPaymentUnavailable => "UpstreamPaymentUnavailable",
            Self::RateLimited => "RateLimited",
            Self::PayloadTooLarge => "PayloadTooLarge",
            Self::Internal => "Internal",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Value,
    pub request_id: String,
}

impl ApiError {
    #[must_use]
    pub fn new(
        code: ApiErrorCode,
        message: impl Into<String>,
        details: Value,
        request_id: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            details,
            request_id: request_id.into(),
        }
    }

    fn plain(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self::new(code, message, json!({}), "req-unknown")
    }

    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    #[must_use]
    pub fn invalid_param(name: &str, value: &str) -> Self {
        Self::new(
            ApiErrorCode::InvalidQueryParameter,
            format!("invalid query parameter: {name}"),
            json!({"field_errors":[{"parameter": name, "reason": "invalid", "value": value}]}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn validation_failed(message: impl Into<String>, field_errors: Value) -> Self {
        Self::new(
            ApiErrorCode::ValidationFailed,
            message,
            json!({"field_errors": field_errors}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn missing_field(name: &str) -> Self {
        Self::validation_failed(
            format!("{name} is required"),
            json!([{"field": name, "reason": "missing"}]),
        )
    }

    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::plain(ApiErrorCode::Unauthorized, message)
    }

    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::plain(ApiErrorCode::Forbidden, message)
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::plain(ApiErrorCode::NotFound, message)
    }

    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::plain(ApiErrorCode::Conflict, message)
    }

    #[must_use]
    pub fn course_locked(message: impl Into<String>, course_id: &str) -> Self {
        Self::new(
            ApiErrorCode::CourseLocked,
            message,
            json!({"course_id": course_id}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn course_unavailable(course_id: &str) -> Self {
        Self::new(
            ApiErrorCode::CourseUnavailable,
            "Course not available",
            json!({"course_id": course_id}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn payment_verification_failed() -> Self {
        Self::plain(
            ApiErrorCode::PaymentVerificationFailed,
            "Payment verification failed",
        )
    }

    #[must_use]
    pub fn upstream_payment_unavailable(reason: impl Into<String>) -> Self {
        Self::new(
            ApiErrorCode::UpstreamPaymentUnavailable,
            "Payment gateway unavailable",
            json!({"reason": reason.into()}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn rate_limited(retry_after_secs: u64) -> Self {
        Self::new(
            ApiErrorCode::RateLimited,
            "Too many requests, please try again later",
            json!({"retry_after_secs": retry_after_secs}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn payload_too_large(limit_bytes: usize) -> Self {
        Self::new(
            ApiErrorCode::PayloadTooLarge,
            "Request body too large",
            json!({"limit_bytes": limit_bytes}),
            "req-unknown",
        )
    }

    #[must_use]
    pub fn internal() -> Self {
        Self::plain(ApiErrorCode::Internal, "Server error")
    }
}

const _: fn() = || {
    fn assert_traits<T: Serialize + for<'de> Deserialize<'de>>() {}
    assert_traits::<ApiErrorCode>();
    assert_traits::<ApiError>();
};
