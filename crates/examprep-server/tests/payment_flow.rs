mod support;

use examprep_server::payment_signature;
use serde_json::{json, Value};
use support::{error_code, production_config, spawn, TestServer, PAYMENT_SECRET};

async fn create_order(srv: &TestServer, token: &str, course: &str, amount: u64) -> String {
    let reply = srv
        .call(
            "POST",
            "/api/user/payment/create-order",
            Some(token),
            &json!({"amount": amount, "courseId": course, "currency": "INR"}),
        )
        .await;
    assert_eq!(reply.status, 200, "{}", reply.body);
    let order = reply.json()["order"].clone();
    assert_eq!(order["amount"], amount);
    order["id"].as_str().expect("order id").to_string()
}

fn checkout(order_id: &str, payment_id: &str, course: &str) -> Value {
    let signature = payment_signature(order_id, payment_id, PAYMENT_SECRET).expect("signature");
    json!({
        "razorpay_order_id": order_id,
        "razorpay_payment_id": payment_id,
        "razorpay_signature": signature,
        "courseId": course,
    })
}

#[tokio::test]
async fn paid_checkout_unlocks_course_and_issues_one_receipt() {
    let srv = spawn(production_config()).await;
    let admin = srv.admin_token().await;
    let (student, token) = srv.student("Asha Rao", "asha@examprep.test").await;
    let course = srv.create_course(&admin, "CAT 2026", 4999.0, true).await;
    srv.create_tree(&admin, &course).await;

    let order_id = create_order(&srv, &token, &course, 499_900).await;
    let body = checkout(&order_id, "pay_0001", &course);
    let verified = srv
        .call("POST", "/api/user/payment/verify-and-unlock", Some(&token), &body)
        .await;
    assert_eq!(verified.status, 200, "{}", verified.body);
    let first = verified.json();
    assert_eq!(first["courseId"], course.as_str());
    assert_eq!(first["message"], "Payment verified and course unlocked");
    let receipt_number = first["receiptNumber"].as_str().expect("number").to_string();
    assert!(receipt_number.starts_with("RCP-"));
    assert_eq!(receipt_number.len(), "RCP-YYYYMMDD-XXXXXXXX".len());

    let replay = srv
        .call("POST", "/api/user/payment/verify-and-unlock", Some(&token), &body)
        .await;
    assert_eq!(replay.status, 200);
    assert_eq!(replay.json()["message"], "Payment already verified");
    assert_eq!(replay.json()["receiptId"], first["receiptId"]);

    let content = srv
        .get(
            &format!("/api/courses/student/course-content/{course}/subjects"),
            Some(&token),
        )
        .await;
    assert_eq!(content.status, 200);

    let receipts = srv.get("/api/user/receipts", Some(&token)).await;
    assert_eq!(receipts.json()["count"], 1);

    let payments = srv.get("/api/admin/payments", Some(&admin)).await;
    assert_eq!(payments.status, 200, "{}", payments.body);
    let summary = payments.json()["summary"].clone();
    assert_eq!(summary["totalPayments"], 1);
    assert_eq!(summary["successfulPayments"], 1);
    assert_eq!(summary["totalRevenue"], 499_900);
    assert_eq!(payments.json()["payments"][0]["userId"]["email"], "asha@examprep.test");
    assert_eq!(payments.json()["payments"][0]["courseId"]["name"], "CAT 2026");

    let unsettled = srv
        .get("/api/admin/payments?status=created", Some(&admin))
        .await;
    assert_eq!(unsettled.json()["payments"], json!([]));

    let stats = srv.get("/api/admin/course-statistics", Some(&admin)).await;
    let row = stats.json()["courseStatistics"][0].clone();
    assert_eq!(row["_id"], course.as_str());
    assert_eq!(row["totalEnrollments"], 1);
    assert_eq!(row["totalPayments"], 1);
    assert_eq!(row["totalRevenue"], 499_900);

    let paid_users = srv.get("/api/admin/paid-users", Some(&admin)).await;
    let users = paid_users.json()["users"].clone();
    assert_eq!(users[0]["_id"], student.id.as_str());
    assert_eq!(users[0]["enrolledCourses"][0]["courseId"]["name"], "CAT 2026");

    let purchases = srv
        .get("/api/admin/students-with-purchases", Some(&admin))
        .await;
    assert_eq!(purchases.json()["students"][0]["totalSpent"], 499_900);
}

#[tokio::test]
async fn receipts_render_in_three_formats_for_their_owner_only() {
    let srv = spawn(production_config()).await;
    let admin = srv.admin_token().await;
    let (_, token) = srv.student("Asha Rao", "asha@examprep.test").await;
    let (_, intruder) = srv.student("Mallory", "mallory@examprep.test").await;
    let course = srv.create_course(&admin, "UPSC Prelims", 1999.0, true).await;

    let order_id = create_order(&srv, &token, &course, 199_900).await;
    let verified = srv
        .call(
            "POST",
            "/api/user/payment/verify-and-unlock",
            Some(&token),
            &checkout(&order_id, "pay_0002", &course),
        )
        .await;
    let receipt_id = verified.json()["receiptId"]
        .as_str()
        .expect("receipt id")
        .to_string();
    let path = format!("/api/user/receipt/{receipt_id}/download");

    let as_json = srv.get(&path, Some(&token)).await;
    assert_eq!(as_json.status, 200, "{}", as_json.body);
    let doc = as_json.json();
    assert_eq!(doc["receipt"]["amount"], "1999.00");
    assert_eq!(doc["receipt"]["courseName"], "UPSC Prelims");
    assert_eq!(doc["student"]["email"], "asha@examprep.test");
    assert_eq!(doc["formats"]["html"], format!("{path}?format=html"));

    let html = srv.get(&format!("{path}?format=html"), Some(&token)).await;
    assert_eq!(html.status, 200);
    assert!(html
        .header("content-type")
        .is_some_and(|v| v.starts_with("text/html")));
    assert!(html
        .header("content-disposition")
        .is_some_and(|v| v.starts_with("inline;")));
    assert!(html.body.contains("UPSC Prelims"));

    let text = srv.get(&format!("{path}?format=text"), Some(&token)).await;
    assert!(text
        .header("content-type")
        .is_some_and(|v| v.starts_with("text/plain")));
    assert!(text
        .header("content-disposition")
        .is_some_and(|v| v.starts_with("attachment;")));

    let bad_format = srv.get(&format!("{path}?format=pdf"), Some(&token)).await;
    assert_eq!(bad_format.status, 400);

    let stolen = srv.get(&path, Some(&intruder)).await;
    assert_eq!(stolen.status, 403);
    assert_eq!(stolen.json()["message"], "You can only download your own receipts");

    let by_admin = srv
        .get(&format!("/api/admin/receipt/{receipt_id}/download"), Some(&admin))
        .await;
    assert_eq!(by_admin.status, 200);
    assert_eq!(by_admin.json()["downloadCount"], 4);
}

#[tokio::test]
async fn forged_signature_is_rejected_and_course_stays_locked() {
    let srv = spawn(production_config()).await;
    let admin = srv.admin_token().await;
    let (_, token) = srv.student("Asha Rao", "asha@examprep.test").await;
    let course = srv.create_course(&admin, "NEET", 2499.0, true).await;
    let order_id = create_order(&srv, &token, &course, 249_900).await;

    let forged = srv
        .call(
            "POST",
            "/api/user/payment/verify-and-unlock",
            Some(&token),
            &json!({
                "razorpay_order_id": order_id,
                "razorpay_payment_id": "pay_0003",
                "razorpay_signature": "00ff",
                "courseId": course,
            }),
        )
        .await;
    assert_eq!(forged.status, 401);
    assert_eq!(error_code(&forged), "PaymentVerificationFailed");

    let dev_bypass = srv
        .call(
            "POST",
            "/api/user/payment/verify-and-unlock",
            Some(&token),
            &json!({
                "razorpay_order_id": "dev_order_1",
                "razorpay_payment_id": "pay_0004",
                "razorpay_signature": "anything",
                "courseId": course,
            }),
        )
        .await;
    assert_eq!(dev_bypass.status, 401);

    let content = srv
        .get(
            &format!("/api/courses/student/course-content/{course}/subjects"),
            Some(&token),
        )
        .await;
    assert_eq!(content.status, 403);
    let receipts = srv.get("/api/user/receipts", Some(&token)).await;
    assert_eq!(receipts.json()["count"], 0);
}

#[tokio::test]
async fn order_validation_and_foreign_orders() {
    let srv = spawn(production_config()).await;
    let admin = srv.admin_token().await;
    let (_, owner) = srv.student("Asha Rao", "asha@examprep.test").await;
    let (_, other) = srv.student("Ravi Kumar", "ravi@examprep.test").await;
    let course = srv.create_course(&admin, "CLAT", 1299.0, true).await;

    let zero = srv
        .call(
            "POST",
            "/api/user/payment/create-order",
            Some(&owner),
            &json!({"amount": 0, "courseId": course}),
        )
        .await;
    assert_eq!(zero.status, 400);

    let missing_course = srv
        .call(
            "POST",
            "/api/user/payment/create-order",
            Some(&owner),
            &json!({"amount": 100, "courseId": "64b7f0c2a1b2c3d4e5f60718"}),
        )
        .await;
    assert_eq!(missing_course.status, 404);

    let order_id = create_order(&srv, &owner, &course, 129_900).await;
    let hijack = srv
        .call(
            "POST",
            "/api/user/payment/verify-and-unlock",
            Some(&other),
            &checkout(&order_id, "pay_0005", &course),
        )
        .await;
    assert_eq!(hijack.status, 409);
}

#[tokio::test]
async fn order_amount_must_match_course_price() {
    let srv = spawn(production_config()).await;
    let admin = srv.admin_token().await;
    let (_, token) = srv.student("Asha Rao", "asha@examprep.test").await;
    let course = srv.create_course(&admin, "CAT 2026", 4999.0, true).await;

    let underpaid = srv
        .call(
            "POST",
            "/api/user/payment/create-order",
            Some(&token),
            &json!({"amount": 1, "courseId": course}),
        )
        .await;
    assert_eq!(underpaid.status, 400, "{}", underpaid.body);
    assert_eq!(error_code(&underpaid), "ValidationFailed");
    assert_eq!(underpaid.json()["error"]["details"]["field_errors"][0]["expected"], 499_900);

    let order_id = create_order(&srv, &token, &course, 499_900).await;
    let repriced = srv
        .call(
            "PUT",
            &format!("/api/admin/courses/{course}"),
            Some(&admin),
            &json!({"price": 5999}),
        )
        .await;
    assert_eq!(repriced.status, 200);

    let stale = srv
        .call(
            "POST",
            "/api/user/payment/verify-and-unlock",
            Some(&token),
            &checkout(&order_id, "pay_0006", &course),
        )
        .await;
    assert_eq!(stale.status, 400, "{}", stale.body);
    assert_eq!(error_code(&stale), "ValidationFailed");

    let content = srv
        .get(
            &format!("/api/courses/student/course-content/{course}/subjects"),
            Some(&token),
        )
        .await;
    assert_eq!(content.status, 403);
    let receipts = srv.get("/api/user/receipts", Some(&token)).await;
    assert_eq!(receipts.json()["count"], 0);
    let stats = srv.get("/api/admin/course-statistics", Some(&admin)).await;
    assert_eq!(stats.json()["courseStatistics"][0]["totalRevenue"], 0);
}
