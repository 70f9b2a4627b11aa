// SPDX-License-Identifier: Apache-2.0

use examprep_core::DocumentId;
use examprep_model::{EnrollmentStatus, Payment, PaymentStatus};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::ApiError;

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_document_id(field: &str, raw: &str) -> Result<DocumentId, ApiError> {
    DocumentId::parse(raw.trim()).map_err(|_| {
        ApiError::validation_failed(
            format!("{field} is not a valid id"),
            json!([{"field": field, "reason": "invalid_id", "value": raw}]),
        )
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdminRequest {
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: Option<String>,
    #[serde(default)]
    pub new_password: Option<String>,
    #[serde(default)]
    pub confirm_password: Option<String>,
}

impl ChangePasswordRequest {
    /// Returns `(current, new)` once every field is present and the new
    /// password matches its confirmation.
    pub fn validate(&self) -> Result<(String, String), ApiError> {
        let (Some(current), Some(new), Some(confirm)) = (
            present(&self.current_password),
            present(&self.new_password),
            present(&self.confirm_password),
        ) else {
            return Err(ApiError::validation_failed(
                "Please fill all fields.",
                json!([{
                    "field": "currentPassword,newPassword,confirmPassword",
                    "reason": "missing"
                }]),
            ));
        };
        if new != confirm {
            return Err(ApiError::validation_failed(
                "New password and confirm password do not match.",
                json!([{"field": "confirmPassword", "reason": "mismatch"}]),
            ));
        }
        Ok((current.to_string(), new.to_string()))
    }
}

/// Fields an admin may change on a student record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStudentRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub city: Option<String>,
    pub gender: Option<String>,
    pub dob: Option<String>,
    pub selected_category: Option<String>,
    pub selected_exam: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCourseStatusRequest {
    #[serde(default)]
    pub status: Option<String>,
}

impl UpdateCourseStatusRequest {
    pub fn validate(&self) -> Result<EnrollmentStatus, ApiError> {
        let raw = self.status.as_deref().unwrap_or_default();
        EnrollmentStatus::parse(raw).map_err(|e| {
            ApiError::validation_failed(
                e.0,
                json!([{"field": "status", "reason": "invalid", "value": raw}]),
            )
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    /// Amount in paise.
    pub amount: u64,
    #[serde(default)]
    pub course_id: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl CreateOrderRequest {
    pub fn validate(&self) -> Result<(u64, Option<DocumentId>, String), ApiError> {
        if self.amount == 0 {
            return Err(ApiError::validation_failed(
                "Amount must be greater than zero",
                json!([{"field": "amount", "reason": "not_positive"}]),
            ));
        }
        let course_id = match present(&self.course_id) {
            Some(raw) => Some(parse_document_id("courseId", raw)?),
            None => None,
        };
        let currency = present(&self.currency).unwrap_or("INR").to_ascii_uppercase();
        Ok((self.amount, course_id, currency))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyPaymentRequest {
    #[serde(default)]
    pub razorpay_order_id: Option<String>,
    #[serde(default)]
    pub razorpay_payment_id: Option<String>,
    #[serde(default)]
    pub razorpay_signature: Option<String>,
    #[serde(default, rename = "courseId")]
    pub course_id: Option<String>,
}

/// Validated form of [`VerifyPaymentRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedPaymentFields {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
    pub course_id: DocumentId,
}

impl VerifyPaymentRequest {
    pub fn validate(&self) -> Result<VerifiedPaymentFields, ApiError> {
        let mut missing = Vec::new();
        for (name, value) in [
            ("razorpay_order_id", &self.razorpay_order_id),
            ("razorpay_payment_id", &self.razorpay_payment_id),
            ("razorpay_signature", &self.razorpay_signature),
            ("courseId", &self.course_id),
        ] {
            if present(value).is_none() {
                missing.push(json!({"field": name, "reason": "missing"}));
            }
        }
        if !missing.is_empty() {
            return Err(ApiError::validation_failed(
                "Missing payment verification fields",
                missing.into(),
            ));
        }
        let field = |v: &Option<String>| present(v).unwrap_or_default().to_string();
        Ok(VerifiedPaymentFields {
            order_id: field(&self.razorpay_order_id),
            payment_id: field(&self.razorpay_payment_id),
            signature: field(&self.razorpay_signature),
            course_id: parse_document_id("courseId", &field(&self.course_id))?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockCourseRequest {
    #[serde(default)]
    pub course_id: Option<String>,
}

impl UnlockCourseRequest {
    pub fn validate(&self) -> Result<DocumentId, ApiError> {
        let raw = present(&self.course_id).ok_or_else(|| ApiError::missing_field("courseId"))?;
        parse_document_id("courseId", raw)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub total_payments: usize,
    pub successful_payments: usize,
    /// Sum of paid amounts, in paise.
    pub total_revenue: u64,
    pub pending_payments: usize,
    pub failed_payments: usize,
}

impl PaymentSummary {
    #[must_use]
    pub fn from_payments(payments: &[Payment]) -> Self {
        let mut summary = Self {
            total_payments: payments.len(),
            ..Self::default()
        };
        for payment in payments {
            match payment.status {
                PaymentStatus::Paid => {
                    summary.successful_payments += 1;
                    summary.total_revenue += payment.amount;
                }
                PaymentStatus::Created => summary.pending_payments += 1,
                PaymentStatus::Failed => summary.failed_payments += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseStatistics {
    #[serde(rename = "_id")]
    pub course_id: DocumentId,
    pub name: String,
    pub price: f64,
    pub published: bool,
    pub total_enrollments: usize,
    pub total_payments: usize,
    pub total_revenue: u64,
    pub average_payment: f64,
}

impl CourseStatistics {
    #[must_use]
    pub fn average(total_revenue: u64, total_payments: usize) -> f64 {
        if total_payments == 0 {
            return 0.0;
        }
        total_revenue as f64 / total_payments as f64
    }
}
