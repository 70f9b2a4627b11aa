mod support;

use serde_json::json;
use support::{error_code, production_config, spawn};

#[tokio::test]
async fn content_stays_locked_until_an_admin_unlocks_it() {
    let srv = spawn(production_config()).await;
    let admin = srv.admin_token().await;
    let (student, token) = srv.student("Asha Rao", "asha@examprep.test").await;
    let course = srv.create_course(&admin, "CAT 2026", 4999.0, true).await;
    let ids = srv.create_tree(&admin, &course).await;

    let subjects_path = format!("/api/courses/student/course-content/{course}/subjects");
    let locked = srv.get(&subjects_path, Some(&token)).await;
    assert_eq!(locked.status, 403, "{}", locked.body);
    assert_eq!(error_code(&locked), "CourseLocked");
    assert_eq!(locked.json()["message"], "Course not unlocked or not enrolled");

    let status_path = format!("/api/admin/student/{}/course/{course}/status", student.id);
    let unlocked = srv
        .call("PUT", &status_path, Some(&admin), &json!({"status": "unlocked"}))
        .await;
    assert_eq!(unlocked.status, 200, "{}", unlocked.body);
    assert_eq!(unlocked.json()["message"], "Course status updated to unlocked");

    let open = srv.get(&subjects_path, Some(&token)).await;
    assert_eq!(open.status, 200, "{}", open.body);
    let body = open.json();
    assert_eq!(body["subjects"][0]["_id"], ids.subject.as_str());
    assert_eq!(body["course"]["_id"], course.as_str());

    let chapters = srv
        .get(
            &format!("/api/courses/student/subject/{}/chapters", ids.subject),
            Some(&token),
        )
        .await;
    assert_eq!(chapters.json()["chapters"][0]["_id"], ids.chapter.as_str());
    let topics = srv
        .get(
            &format!("/api/courses/student/chapter/{}/topics", ids.chapter),
            Some(&token),
        )
        .await;
    assert_eq!(topics.json()["topics"][0]["_id"], ids.topic.as_str());
    let tests = srv
        .get(
            &format!("/api/courses/student/topic/{}/tests", ids.topic),
            Some(&token),
        )
        .await;
    assert_eq!(tests.json()["tests"][0]["_id"], ids.test.as_str());

    let structure = srv
        .get(
            &format!("/api/courses/student/course-structure/{course}"),
            Some(&token),
        )
        .await;
    assert_eq!(structure.status, 200);
    let tree = structure.json();
    let subject = &tree["structure"][0];
    assert_eq!(subject["_id"], ids.subject.as_str());
    assert_eq!(
        subject["chapters"][0]["topics"][0]["tests"][0]["_id"],
        ids.test.as_str()
    );

    let mine = srv.get("/api/user/student/my-courses", Some(&token)).await;
    let courses = mine.json()["courses"].clone();
    assert_eq!(courses.as_array().map(Vec::len), Some(1));
    assert_eq!(courses[0]["_id"], course.as_str());
    assert_eq!(courses[0]["status"], "unlocked");

    let relocked = srv
        .call("PUT", &status_path, Some(&admin), &json!({"status": "locked"}))
        .await;
    assert_eq!(relocked.status, 200);
    let again = srv.get(&subjects_path, Some(&token)).await;
    assert_eq!(again.status, 403);
    let mine = srv.get("/api/user/student/my-courses", Some(&token)).await;
    assert_eq!(mine.json()["courses"], json!([]));
}

#[tokio::test]
async fn unpublished_course_is_unavailable_even_when_unlocked() {
    let srv = spawn(production_config()).await;
    let admin = srv.admin_token().await;
    let (student, token) = srv.student("Ravi Kumar", "ravi@examprep.test").await;
    let course = srv.create_course(&admin, "Draft course", 999.0, false).await;
    let status_path = format!("/api/admin/student/{}/course/{course}/status", student.id);
    srv.call("PUT", &status_path, Some(&admin), &json!({"status": "unlocked"}))
        .await;

    let reply = srv
        .get(
            &format!("/api/courses/student/course-content/{course}/subjects"),
            Some(&token),
        )
        .await;
    assert_eq!(reply.status, 403);
    assert_eq!(error_code(&reply), "CourseUnavailable");

    let published = srv
        .call(
            "PUT",
            &format!("/api/admin/courses/{course}/publish"),
            Some(&admin),
            &json!({"published": true}),
        )
        .await;
    assert_eq!(published.status, 200, "{}", published.body);
    let reply = srv
        .get(
            &format!("/api/courses/student/course-content/{course}/subjects"),
            Some(&token),
        )
        .await;
    assert_eq!(reply.status, 200);
}

#[tokio::test]
async fn catalog_reads_are_public_and_content_reads_need_a_token() {
    let srv = spawn(production_config()).await;
    let admin = srv.admin_token().await;
    let live = srv.create_course(&admin, "GATE CSE", 2999.0, true).await;
    let draft = srv.create_course(&admin, "Hidden", 10.0, false).await;

    let catalog = srv.get("/api/courses/student/published-courses", None).await;
    assert_eq!(catalog.status, 200);
    let courses = catalog.json()["courses"].clone();
    assert_eq!(courses.as_array().map(Vec::len), Some(1));
    assert_eq!(courses[0]["_id"], live.as_str());

    let hidden = srv
        .get(&format!("/api/courses/student/published-courses/{draft}"), None)
        .await;
    assert_eq!(hidden.status, 404);
    let detail = srv.get(&format!("/api/courses/{draft}"), None).await;
    assert_eq!(detail.status, 200);

    let anonymous = srv
        .get(
            &format!("/api/courses/student/course-content/{live}/subjects"),
            None,
        )
        .await;
    assert_eq!(anonymous.status, 401);
}

#[tokio::test]
async fn malformed_and_unknown_ids_are_distinguished() {
    let srv = spawn(production_config()).await;
    let (_, token) = srv.student("Asha Rao", "asha@examprep.test").await;

    let malformed = srv.get("/api/courses/not-an-id", None).await;
    assert_eq!(malformed.status, 400);

    let missing = srv
        .get(
            "/api/courses/student/subject/64b7f0c2a1b2c3d4e5f60718/chapters",
            Some(&token),
        )
        .await;
    assert_eq!(missing.status, 404);
    assert_eq!(missing.json()["message"], "Subject not found");
}

#[tokio::test]
async fn unknown_student_is_denied() {
    let srv = spawn(production_config()).await;
    let admin = srv.admin_token().await;
    let course = srv.create_course(&admin, "Bank PO", 1499.0, true).await;
    let (student, token) = srv.student("Asha Rao", "asha@examprep.test").await;
    srv.delete(&format!("/api/admin/delete-student/{}", student.id), Some(&admin))
        .await;

    let reply = srv
        .get(
            &format!("/api/courses/student/course-content/{course}/subjects"),
            Some(&token),
        )
        .await;
    assert_eq!(reply.status, 403);
    assert_eq!(reply.json()["message"], "User not found");
}
