mod support;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use examprep_core::DocumentId;
use examprep_model::User;
use examprep_server::payment_signature;
use examprep_store::{Collection, DocumentStore, Filter, MemoryStore, Repo, Sort, StoreError};
use serde_json::{json, Value};
use support::{production_config, spawn_on, TestServer, PAYMENT_SECRET};

/// Memory store whose next user lookup stalls once armed, so a second request
/// can run while the first one holds a stale copy of the student.
struct StalledUserRead {
    inner: MemoryStore,
    armed: AtomicBool,
}

impl StalledUserRead {
    fn new() -> Self {
        Self {
            inner: MemoryStore::new(),
            armed: AtomicBool::new(false),
        }
    }

    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentStore for StalledUserRead {
    fn backend_tag(&self) -> &'static str {
        self.inner.backend_tag()
    }

    async fn insert(&self, collection: Collection, doc: Value) -> Result<(), StoreError> {
        self.inner.insert(collection, doc).await
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError> {
        if collection == Collection::Users && self.armed.swap(false, Ordering::SeqCst) {
            let doc = self.inner.get(collection, id).await?;
            tokio::time::sleep(Duration::from_millis(500)).await;
            return Ok(doc);
        }
        self.inner.get(collection, id).await
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        sort: Option<&Sort>,
    ) -> Result<Vec<Value>, StoreError> {
        self.inner.find(collection, filter, sort).await
    }

    async fn replace(
        &self,
        collection: Collection,
        id: &str,
        doc: Value,
    ) -> Result<(), StoreError> {
        self.inner.replace(collection, id, doc).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        self.inner.delete(collection, id).await
    }

    async fn delete_many(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<usize, StoreError> {
        self.inner.delete_many(collection, filter).await
    }
}

async fn paid_checkout(srv: &TestServer, token: &str, course: &str, payment_id: &str) -> Value {
    let order = srv
        .call(
            "POST",
            "/api/user/payment/create-order",
            Some(token),
            &json!({"amount": 499_900, "courseId": course}),
        )
        .await;
    assert_eq!(order.status, 200, "{}", order.body);
    let order_id = order.json()["order"]["id"]
        .as_str()
        .expect("order id")
        .to_string();
    let signature = payment_signature(&order_id, payment_id, PAYMENT_SECRET).expect("sig");
    json!({
        "razorpay_order_id": order_id,
        "razorpay_payment_id": payment_id,
        "razorpay_signature": signature,
        "courseId": course,
    })
}

async fn stored_user(srv: &TestServer, id: &DocumentId) -> User {
    Repo::<User>::new(Arc::clone(&srv.state.store))
        .get(id)
        .await
        .expect("get user")
        .expect("user exists")
}

fn course_id(raw: &str) -> DocumentId {
    DocumentId::parse(raw).expect("course id")
}

#[tokio::test]
async fn admin_profile_edit_does_not_undo_a_paid_unlock() {
    let store = Arc::new(StalledUserRead::new());
    let srv = spawn_on(store.clone(), production_config()).await;
    let admin = srv.admin_token().await;
    let (student, token) = srv.student("Asha Rao", "asha@examprep.test").await;
    let course = srv.create_course(&admin, "CAT 2026", 4999.0, true).await;
    let checkout = paid_checkout(&srv, &token, &course, "pay_race_1").await;

    store.arm();
    let edit_path = format!("/api/admin/update-student/{}", student.id);
    let edit_body = json!({"city": "Pune"});
    let edit = srv.call("PUT", &edit_path, Some(&admin), &edit_body);
    let verify = async {
        tokio::time::sleep(Duration::from_millis(150)).await;
        srv.call(
            "POST",
            "/api/user/payment/verify-and-unlock",
            Some(&token),
            &checkout,
        )
        .await
    };
    let (edited, verified) = tokio::join!(edit, verify);
    assert_eq!(edited.status, 200, "{}", edited.body);
    assert_eq!(verified.status, 200, "{}", verified.body);

    let after = stored_user(&srv, &student.id).await;
    assert!(after.has_unlocked(&course_id(&course)));
    assert_eq!(after.city.as_deref(), Some("Pune"));
}

#[tokio::test]
async fn admin_status_change_and_payment_both_land() {
    let store = Arc::new(StalledUserRead::new());
    let srv = spawn_on(store.clone(), production_config()).await;
    let admin = srv.admin_token().await;
    let (student, token) = srv.student("Ravi Kumar", "ravi@examprep.test").await;
    let paid = srv.create_course(&admin, "CAT 2026", 4999.0, true).await;
    let granted = srv.create_course(&admin, "GATE", 2999.0, true).await;
    let checkout = paid_checkout(&srv, &token, &paid, "pay_race_2").await;

    store.arm();
    let status_path = format!("/api/admin/student/{}/course/{granted}/status", student.id);
    let grant_body = json!({"status": "unlocked"});
    let grant = srv.call("PUT", &status_path, Some(&admin), &grant_body);
    let verify = async {
        tokio::time::sleep(Duration::from_millis(150)).await;
        srv.call(
            "POST",
            "/api/user/payment/verify-and-unlock",
            Some(&token),
            &checkout,
        )
        .await
    };
    let (granted_reply, verified) = tokio::join!(grant, verify);
    assert_eq!(granted_reply.status, 200, "{}", granted_reply.body);
    assert_eq!(verified.status, 200, "{}", verified.body);

    let after = stored_user(&srv, &student.id).await;
    assert!(after.has_unlocked(&course_id(&paid)));
    assert!(after.has_unlocked(&course_id(&granted)));
    assert_eq!(after.enrolled_courses.len(), 2);
}
