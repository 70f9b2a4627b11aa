use serde_json::{json, Map, Value};

use crate::errors::ApiErrorCode;

/// Every route served by the API, as `(method, path, summary)`.
pub const ROUTES: &[(&str, &str, &str)] = &[
    ("get", "/api/health", "liveness probe"),
    ("get", "/api/test", "environment echo"),
    ("get", "/api/version", "build version"),
    ("get", "/api/openapi.json", "this document"),
    ("post", "/api/admin/create", "bootstrap an admin account"),
    ("post", "/api/admin/login", "admin login"),
    ("put", "/api/admin/change-password", "change own password"),
    ("get", "/api/admin/me", "own admin profile"),
    ("get", "/api/admin/get-students", "list students"),
    ("put", "/api/admin/update-student/{id}", "update a student"),
    ("delete", "/api/admin/delete-student/{id}", "delete a student"),
    ("get", "/api/admin/paid-users", "students with an unlocked course"),
    ("get", "/api/admin/students-with-purchases", "students with payments and spend"),
    ("get", "/api/admin/payments", "filtered payments with summary"),
    ("get", "/api/admin/course-statistics", "per-course enrollment and revenue"),
    (
        "put",
        "/api/admin/student/{studentId}/course/{courseId}/status",
        "lock or unlock a course for a student",
    ),
    ("get", "/api/admin/receipt/{receiptId}/download", "render a receipt"),
    ("get", "/api/admin/courses", "list courses"),
    ("post", "/api/admin/courses", "create a course"),
    ("put", "/api/admin/courses/{id}", "update a course"),
    ("delete", "/api/admin/courses/{id}", "delete a course and its content"),
    ("put", "/api/admin/courses/{id}/publish", "publish or unpublish a course"),
    ("get", "/api/admin/courses/{courseId}/subjects", "list subjects of a course"),
    ("post", "/api/admin/subjects", "create a subject"),
    ("put", "/api/admin/subjects/{id}", "update a subject"),
    ("delete", "/api/admin/subjects/{id}", "delete a subject and its content"),
    ("get", "/api/admin/subjects/{subjectId}/chapters", "list chapters of a subject"),
    ("post", "/api/admin/chapters", "create a chapter"),
    ("put", "/api/admin/chapters/{id}", "update a chapter"),
    ("delete", "/api/admin/chapters/{id}", "delete a chapter and its content"),
    ("get", "/api/admin/chapters/{chapterId}/topics", "list topics of a chapter"),
    ("post", "/api/admin/topics", "create a topic"),
    ("put", "/api/admin/topics/{id}", "update a topic"),
    ("delete", "/api/admin/topics/{id}", "delete a topic and its tests"),
    ("get", "/api/admin/topics/{topicId}/tests", "list tests of a topic"),
    ("post", "/api/admin/tests", "create a test"),
    ("put", "/api/admin/tests/{id}", "update a test"),
    ("delete", "/api/admin/tests/{id}", "delete a test and its questions"),
    ("get", "/api/admin/tests/{testId}/questions", "list questions of a test"),
    ("post", "/api/admin/questions", "create a question"),
    ("put", "/api/admin/questions/{id}", "update a question"),
    ("delete", "/api/admin/questions/{id}", "delete a question"),
    ("post", "/api/admin/study-materials", "add a study material"),
    ("post", "/api/admin/announcements", "publish an announcement"),
    ("get", "/api/courses/student/published-courses", "published catalog"),
    ("get", "/api/courses/student/published-courses/{courseId}", "one published course"),
    ("get", "/api/courses/{courseId}", "course detail"),
    (
        "get",
        "/api/courses/student/course-content/{courseId}/subjects",
        "subjects of an unlocked course",
    ),
    ("get", "/api/courses/student/subject/{subjectId}/chapters", "chapters of an unlocked subject"),
    ("get", "/api/courses/student/chapter/{chapterId}/topics", "topics of an unlocked chapter"),
    ("get", "/api/courses/student/topic/{topicId}/tests", "tests of an unlocked topic"),
    (
        "get",
        "/api/courses/student/course-structure/{courseId}",
        "nested structure of an unlocked course",
    ),
    ("get", "/api/user/student/my-courses", "courses unlocked by the caller"),
    ("post", "/api/user/payment/create-order", "create a payment order"),
    ("post", "/api/user/payment/verify-and-unlock", "verify a payment and unlock the course"),
    ("get", "/api/user/receipts", "receipts of the caller"),
    ("get", "/api/user/receipt/{receiptId}/download", "render an own receipt"),
    ("get", "/api/study-materials/student", "active study materials"),
    ("get", "/api/announcements", "visible announcements"),
    ("post", "/api/dev/login", "development login as the demo student"),
    ("get", "/api/dev/verify-token", "decode a bearer token"),
    ("post", "/api/dev/unlock-course", "development unlock"),
    ("post", "/api/dev/unlock-course-payment", "development unlock after a simulated payment"),
    ("get", "/api/dev/my-courses", "demo student's unlocked courses"),
];

fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {"application/json": {"schema": {"$ref": "#/components/schemas/ApiError"}}}
    })
}

fn path_parameters(path: &str) -> Vec<Value> {
    path.split('/')
        .filter_map(|seg| seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')))
        .map(|name| {
            json!({"name": name, "in": "path", "required": true, "schema": {"type": "string"}})
        })
        .collect()
}

#[must_use]
pub fn openapi_v1_spec() -> Value {
    let mut paths = Map::new();
    for (method, path, summary) in ROUTES {
        let mut responses = Map::new();
        responses.insert("200".to_string(), json!({"description": "ok"}));
        responses.insert("400".to_string(), error_response("invalid request"));
        if !path.starts_with("/api/health") && !path.starts_with("/api/test") {
            responses.insert("401".to_string(), error_response("missing or invalid token"));
            responses.insert("403".to_string(), error_response("access denied"));
            responses.insert("404".to_string(), error_response("not found"));
        }
        responses.insert("429".to_string(), error_response("rate limited"));
        let operation = json!({
            "summary": summary,
            "parameters": path_parameters(path),
            "responses": responses,
        });
        let entry = paths
            .entry((*path).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(ops) = entry {
            ops.insert((*method).to_string(), operation);
        }
    }

    let codes: Vec<&str> = ApiErrorCode::ALL.iter().map(|c| c.as_str()).collect();
    json!({
      "openapi": "3.0.3",
      "info": {"title": "examprep API", "version": crate::API_VERSION},
      "paths": paths,
      "components": {
        "securitySchemes": {"bearer": {"type": "http", "scheme": "bearer", "bearerFormat": "JWT"}},
        "schemas": {
          "ApiErrorCode": {"type": "string", "enum": codes},
          "ApiError": {
            "type": "object",
            "required": ["code", "message", "details", "request_id"],
            "additionalProperties": false,
            "properties": {
              "code": {"$ref": "#/components/schemas/ApiErrorCode"},
              "message": {"type": "string"},
              "details": {"type": "object"},
              "request_id": {"type": "string"}
            }
          }
        }
      }
    })
}
