mod support;

use std::sync::Arc;

use examprep_server::payment_signature;
use examprep_store::SqliteStore;
use serde_json::json;
use support::{production_config, spawn_on, PAYMENT_SECRET};
use tempfile::tempdir;

#[tokio::test]
async fn purchase_round_trip_on_sqlite_store() {
    let dir = tempdir().expect("tempdir");
    let store = SqliteStore::open(&dir.path().join("examprep.sqlite")).expect("open sqlite");
    let srv = spawn_on(Arc::new(store), production_config()).await;
    let admin = srv.admin_token().await;
    let (_, token) = srv.student("Asha Rao", "asha@examprep.test").await;
    let course = srv.create_course(&admin, "CAT 2026", 4999.0, true).await;
    let ids = srv.create_tree(&admin, &course).await;

    let order = srv
        .call(
            "POST",
            "/api/user/payment/create-order",
            Some(&token),
            &json!({"amount": 499_900, "courseId": course}),
        )
        .await;
    let order_id = order.json()["order"]["id"]
        .as_str()
        .expect("order id")
        .to_string();
    let signature = payment_signature(&order_id, "pay_sql_1", PAYMENT_SECRET).expect("sig");
    let verified = srv
        .call(
            "POST",
            "/api/user/payment/verify-and-unlock",
            Some(&token),
            &json!({
                "razorpay_order_id": order_id,
                "razorpay_payment_id": "pay_sql_1",
                "razorpay_signature": signature,
                "courseId": course,
            }),
        )
        .await;
    assert_eq!(verified.status, 200, "{}", verified.body);

    let structure = srv
        .get(
            &format!("/api/courses/student/course-structure/{course}"),
            Some(&token),
        )
        .await;
    assert_eq!(structure.status, 200, "{}", structure.body);
    assert_eq!(
        structure.json()["structure"][0]["chapters"][0]["_id"],
        ids.chapter.as_str()
    );

    let version = srv.get("/api/version", None).await;
    assert_eq!(version.json()["store"], "sqlite");
}
