use examprep_api::params::{
    parse_optional_course_id, parse_path_id, parse_payment_filter, parse_receipt_format,
    ReceiptFormat,
};
use examprep_api::ApiErrorCode;
use examprep_model::PaymentStatus;
use std::collections::BTreeMap;

fn query(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

#[test]
fn empty_payment_filter_is_unrestricted() {
    let parsed = parse_payment_filter(&BTreeMap::new()).expect("params");
    assert_eq!(parsed, Default::default());
}

#[test]
fn payment_filter_parses_every_field() {
    let parsed = parse_payment_filter(&query(&[
        ("status", "paid"),
        ("courseId", "507f1f77bcf86cd799439011"),
        ("startDate", "2026-01-01"),
        ("endDate", "2026-01-31"),
    ]))
    .expect("params");
    assert_eq!(parsed.status, Some(PaymentStatus::Paid));
    assert_eq!(
        parsed.course_id.as_ref().map(|c| c.as_str()),
        Some("507f1f77bcf86cd799439011")
    );
    let end = parsed.end.expect("end");
    assert_eq!(end.to_rfc3339(), "2026-01-31T23:59:59.999+00:00");
}

#[test]
fn payment_filter_accepts_rfc3339() {
    let parsed = parse_payment_filter(&query(&[("startDate", "2026-02-01T10:00:00+05:30")]))
        .expect("params");
    assert_eq!(
        parsed.start.expect("start").to_rfc3339(),
        "2026-02-01T04:30:00+00:00"
    );
}

#[test]
fn payment_filter_rejects_bad_values() {
    for pairs in [
        vec![("status", "refunded")],
        vec![("courseId", "not-an-id")],
        vec![("startDate", "yesterday")],
        vec![("startDate", "2026-02-02"), ("endDate", "2026-02-01")],
    ] {
        let err = parse_payment_filter(&query(&pairs)).expect_err("must reject");
        assert_eq!(err.code, ApiErrorCode::InvalidQueryParameter);
        assert!(err.details["field_errors"][0].get("parameter").is_some());
    }
}

#[test]
fn receipt_format_defaults_to_json() {
    assert_eq!(
        parse_receipt_format(&BTreeMap::new()).expect("format"),
        ReceiptFormat::Json
    );
    assert_eq!(
        parse_receipt_format(&query(&[("format", "html")])).expect("format"),
        ReceiptFormat::Html
    );
    assert_eq!(
        parse_receipt_format(&query(&[("format", "text")])).expect("format"),
        ReceiptFormat::Text
    );
    assert!(parse_receipt_format(&query(&[("format", "pdf")])).is_err());
}

#[test]
fn optional_course_and_path_ids() {
    assert_eq!(parse_optional_course_id(&BTreeMap::new()).expect("none"), None);
    assert!(parse_optional_course_id(&query(&[("courseId", "x")])).is_err());
    assert!(parse_path_id("id", "507f1f77bcf86cd799439011").is_ok());
    assert!(parse_path_id("id", "507f").is_err());
}
