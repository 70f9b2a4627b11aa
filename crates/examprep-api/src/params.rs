use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use examprep_core::DocumentId;
use examprep_model::PaymentStatus;
use std::collections::BTreeMap;

use crate::errors::ApiError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentFilterParams {
    pub status: Option<PaymentStatus>,
    pub course_id: Option<DocumentId>,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReceiptFormat {
    #[default]
    Json,
    Html,
    Text,
}

impl ReceiptFormat {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Html => "html",
            Self::Text => "text",
        }
    }
}

fn non_empty<'a>(query: &'a BTreeMap<String, String>, name: &str) -> Option<&'a str> {
    query
        .get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

/// Accepts RFC 3339 timestamps or bare `YYYY-MM-DD` dates. A bare date is
/// read as the start of that day, or its last instant when `end_of_day`.
fn parse_instant(name: &str, raw: &str, end_of_day: bool) -> Result<DateTime<Utc>, ApiError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::invalid_param(name, raw))?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        NaiveTime::from_hms_opt(0, 0, 0)
    }
    .ok_or_else(|| ApiError::invalid_param(name, raw))?;
    Ok(date.and_time(time).and_utc())
}

pub fn parse_payment_filter(
    query: &BTreeMap<String, String>,
) -> Result<PaymentFilterParams, ApiError> {
    let status = match non_empty(query, "status") {
        Some(raw) => {
            Some(PaymentStatus::parse(raw).map_err(|_| ApiError::invalid_param("status", raw))?)
        }
        None => None,
    };
    let course_id = match non_empty(query, "courseId") {
        Some(raw) => {
            Some(DocumentId::parse(raw).map_err(|_| ApiError::invalid_param("courseId", raw))?)
        }
        None => None,
    };
    let start = match non_empty(query, "startDate") {
        Some(raw) => Some(parse_instant("startDate", raw, false)?),
        None => None,
    };
    let end = match non_empty(query, "endDate") {
        Some(raw) => Some(parse_instant("endDate", raw, true)?),
        None => None,
    };
    if let (Some(s), Some(e)) = (start, end) {
        if s > e {
            return Err(ApiError::invalid_param(
                "startDate",
                non_empty(query, "startDate").unwrap_or_default(),
            ));
        }
    }
    Ok(PaymentFilterParams {
        status,
        course_id,
        start,
        end,
    })
}

pub fn parse_receipt_format(query: &BTreeMap<String, String>) -> Result<ReceiptFormat, ApiError> {
    match non_empty(query, "format") {
        None | Some("json") => Ok(ReceiptFormat::Json),
        Some("html") => Ok(ReceiptFormat::Html),
        Some("text") => Ok(ReceiptFormat::Text),
        Some(other) => Err(ApiError::invalid_param("format", other)),
    }
}

pub fn parse_optional_course_id(
    query: &BTreeMap<String, String>,
) -> Result<Option<DocumentId>, ApiError> {
    match non_empty(query, "courseId") {
        Some(raw) => DocumentId::parse(raw)
            .map(Some)
            .map_err(|_| ApiError::invalid_param("courseId", raw)),
        None => Ok(None),
    }
}

/// Path segments naming a document must be well-formed ids.
pub fn parse_path_id(name: &str, raw: &str) -> Result<DocumentId, ApiError> {
    DocumentId::parse(raw).map_err(|_| ApiError::invalid_param(name, raw))
}
