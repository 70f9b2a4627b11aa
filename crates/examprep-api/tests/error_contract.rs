use examprep_api::error_mapping::{error_body, map_error, API_ERROR_SCHEMA_REF};
use examprep_api::{openapi_v1_spec, ApiError, ApiErrorCode, ROUTES};
use serde_json::json;

#[test]
fn api_error_mapping_is_centralized_and_stable() {
    let cases = [
        (ApiErrorCode::InvalidQueryParameter, 400),
        (ApiErrorCode::ValidationFailed, 400),
        (ApiErrorCode::Unauthorized, 401),
        (ApiErrorCode::PaymentVerificationFailed, 401),
        (ApiErrorCode::Forbidden, 403),
        (ApiErrorCode::CourseLocked, 403),
        (ApiErrorCode::CourseUnavailable, 403),
        (ApiErrorCode::NotFound, 404),
        (ApiErrorCode::Conflict, 409),
        (ApiErrorCode::PayloadTooLarge, 413),
        (ApiErrorCode::RateLimited, 429),
        (ApiErrorCode::UpstreamPaymentUnavailable, 502),
        (ApiErrorCode::Internal, 500),
    ];
    for (code, status) in cases {
        let mapped = map_error(&ApiError::new(code, "x", json!({}), "req-1"));
        assert_eq!(mapped.status_code, status, "{code:?}");
        assert_eq!(mapped.schema_ref, API_ERROR_SCHEMA_REF);
    }
}

#[test]
fn error_body_keeps_legacy_success_and_message_keys() {
    let err = ApiError::not_found("Student not found!").with_request_id("req-42");
    let body = error_body(&err);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Student not found!");
    assert_eq!(body["error"]["code"], "NotFound");
    assert_eq!(body["error"]["request_id"], "req-42");
}

#[test]
fn api_error_round_trips_and_rejects_unknown_fields() {
    let err = ApiError::rate_limited(30);
    let encoded = serde_json::to_value(&err).expect("encode");
    let decoded: ApiError = serde_json::from_value(encoded).expect("decode");
    assert_eq!(decoded, err);
    let with_extra = json!({
        "code": "Internal",
        "message": "m",
        "details": {},
        "request_id": "r",
        "x": 1
    });
    assert!(serde_json::from_value::<ApiError>(with_extra).is_err());
}

#[test]
fn openapi_lists_every_route_and_error_code() {
    let spec = openapi_v1_spec();
    let paths = spec["paths"].as_object().expect("paths");
    for (method, path, _) in ROUTES {
        assert!(paths[*path].get(*method).is_some(), "{method} {path}");
    }
    let codes = spec["components"]["schemas"]["ApiErrorCode"]["enum"]
        .as_array()
        .expect("codes");
    assert_eq!(codes.len(), ApiErrorCode::ALL.len());
    let status_route = &paths["/api/admin/student/{studentId}/course/{courseId}/status"]["put"];
    assert_eq!(status_route["parameters"].as_array().map(Vec::len), Some(2));
}
