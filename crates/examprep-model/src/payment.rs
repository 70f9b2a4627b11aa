use chrono::{DateTime, Utc};
use examprep_core::{canonical, DocumentId};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::error::ValidationError;
use crate::format_paise;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Created,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input {
            "created" => Ok(Self::Created),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            other => Err(ValidationError(format!(
                "payment status must be one of created, paid, failed (got `{other}`)"
            ))),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Paid => "paid",
            Self::Failed => "failed",
        }
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub user_id: DocumentId,
    pub course_id: DocumentId,
    pub order_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    /// Amount in paise.
    pub amount: u64,
    pub currency: String,
    pub status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
}

impl Payment {
    #[must_use]
    pub fn created(
        user_id: DocumentId,
        course_id: DocumentId,
        order_id: String,
        amount: u64,
        currency: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: DocumentId::generate(),
            user_id,
            course_id,
            order_id,
            payment_id: None,
            signature: None,
            amount,
            currency,
            status: PaymentStatus::Created,
            created_at: now,
            paid_at: None,
        }
    }

    pub fn mark_paid(&mut self, payment_id: String, signature: String, now: DateTime<Utc>) {
        self.payment_id = Some(payment_id);
        self.signature = Some(signature);
        self.status = PaymentStatus::Paid;
        self.paid_at = Some(now);
    }

    #[must_use]
    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub receipt_number: String,
    /// Payment document this receipt was issued for.
    pub payment_id: DocumentId,
    pub user_id: DocumentId,
    pub course_id: DocumentId,
    pub order_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_payment_id: Option<String>,
    pub amount: u64,
    pub currency: String,
    pub course_name: String,
    pub student_name: String,
    pub student_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_phone: Option<String>,
    pub payment_method: String,
    pub issued_at: DateTime<Utc>,
    #[serde(default)]
    pub download_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_downloaded_at: Option<DateTime<Utc>>,
}

impl Receipt {
    /// `RCP-YYYYMMDD-XXXXXXXX`, the suffix being the tail of the payment id.
    #[must_use]
    pub fn number_for(issued_at: DateTime<Utc>, payment_id: &DocumentId) -> String {
        let id = payment_id.as_str();
        let tail = &id[id.len().saturating_sub(8)..];
        format!(
            "RCP-{}-{}",
            issued_at.format("%Y%m%d"),
            tail.to_ascii_uppercase()
        )
    }

    pub fn mark_downloaded(&mut self, now: DateTime<Utc>) {
        self.download_count = self.download_count.saturating_add(1);
        self.last_downloaded_at = Some(now);
    }

    /// Flat view shared by the json, html and text renderings.
    #[must_use]
    pub fn receipt_data(&self) -> ReceiptData {
        let mut data = ReceiptData {
            receipt_number: self.receipt_number.clone(),
            issued_at: self.issued_at.format("%d %b %Y, %H:%M UTC").to_string(),
            student_name: self.student_name.clone(),
            student_email: self.student_email.clone(),
            student_phone: self.student_phone.clone(),
            course_name: self.course_name.clone(),
            amount: format_paise(self.amount),
            currency: self.currency.clone(),
            order_id: self.order_id.clone(),
            transaction_id: self
                .gateway_payment_id
                .clone()
                .unwrap_or_else(|| self.payment_id.to_string()),
            payment_method: self.payment_method.clone(),
            status: PaymentStatus::Paid.as_str().to_string(),
            digest: String::new(),
        };
        data.digest = canonical::stable_json_hash_hex(&data).unwrap_or_default();
        data
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptData {
    pub receipt_number: String,
    pub issued_at: String,
    pub student_name: String,
    pub student_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_phone: Option<String>,
    pub course_name: String,
    /// Rupees with two decimals.
    pub amount: String,
    pub currency: String,
    pub order_id: String,
    pub transaction_id: String,
    pub payment_method: String,
    pub status: String,
    /// SHA-256 over the canonical encoding of the other fields.
    pub digest: String,
}
