use chrono::Utc;
use examprep_model::{DocumentId, EnrollmentStatus, Payment, PaymentStatus, User};
use examprep_store::{
    Collection, Condition, DocumentStore, Filter, MemoryStore, Repo, Sort, SqliteStore,
    StoreErrorCode,
};
use serde_json::json;
use std::sync::Arc;
use tempfile::tempdir;

async fn crud_contract(store: Arc<dyn DocumentStore>) {
    let tag = store.backend_tag();
    store
        .insert(Collection::Courses, json!({"_id": "c1", "name": "CAT", "order": 2}))
        .await
        .expect("insert c1");
    store
        .insert(Collection::Courses, json!({"_id": "c2", "name": "GMAT", "order": 1}))
        .await
        .expect("insert c2");

    let dup = store
        .insert(Collection::Courses, json!({"_id": "c1", "name": "again"}))
        .await
        .expect_err("duplicate id");
    assert_eq!(dup.code, StoreErrorCode::Conflict, "{tag}");

    let missing_id = store
        .insert(Collection::Courses, json!({"name": "no id"}))
        .await
        .expect_err("missing id");
    assert_eq!(missing_id.code, StoreErrorCode::Validation, "{tag}");

    let sorted = store
        .find(Collection::Courses, &Filter::all(), Some(&Sort::asc("order")))
        .await
        .expect("find");
    let ids: Vec<_> = sorted.iter().map(|d| d["_id"].as_str().unwrap_or_default()).collect();
    assert_eq!(ids, ["c2", "c1"], "{tag}");

    store
        .replace(Collection::Courses, "c1", json!({"_id": "c1", "name": "CAT 2026", "order": 2}))
        .await
        .expect("replace");
    let c1 = store.get(Collection::Courses, "c1").await.expect("get").expect("c1");
    assert_eq!(c1["name"], "CAT 2026", "{tag}");

    let absent = store
        .replace(Collection::Courses, "nope", json!({"_id": "nope"}))
        .await
        .expect_err("replace missing");
    assert_eq!(absent.code, StoreErrorCode::NotFound, "{tag}");

    assert_eq!(
        store.count(Collection::Courses, &Filter::all().eq("name", "GMAT")).await.expect("count"),
        1,
        "{tag}"
    );
    assert!(store.get(Collection::Subjects, "c1").await.expect("other collection").is_none());

    assert!(store.delete(Collection::Courses, "c2").await.expect("delete"));
    assert!(!store.delete(Collection::Courses, "c2").await.expect("delete again"));

    for n in 0..3 {
        store
            .insert(Collection::Subjects, json!({"_id": format!("s{n}"), "courseId": "c1"}))
            .await
            .expect("insert subject");
    }
    let removed = store
        .delete_many(Collection::Subjects, &Filter::all().eq("courseId", "c1"))
        .await
        .expect("delete many");
    assert_eq!(removed, 3, "{tag}");
}

async fn typed_enrollment_query(store: Arc<dyn DocumentStore>) {
    let users: Repo<User> = Repo::new(store.clone());
    let course = DocumentId::generate();
    let now = Utc::now();
    let mut alice = User::new("Alice", "alice@example.com", None, now).expect("alice");
    alice.unlock_course(&course, now);
    let mut bob = User::new("Bob", "bob@example.com", None, now).expect("bob");
    bob.set_course_status(&course, EnrollmentStatus::Locked, now);
    users.insert(&alice).await.expect("insert alice");
    users.insert(&bob).await.expect("insert bob");

    let unlocked = Filter::all().elem_match(
        "enrolledCourses",
        vec![
            Condition::Eq("courseId".into(), json!(course.as_str())),
            Condition::Eq("status".into(), json!("unlocked")),
        ],
    );
    let found = users.find(&unlocked, None).await.expect("find");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].email, "alice@example.com");

    bob.unlock_course(&course, now);
    users.save(&bob).await.expect("save bob");
    assert_eq!(users.count(&unlocked).await.expect("count"), 2);

    let fetched = users.get(&alice.id).await.expect("get").expect("alice");
    assert_eq!(fetched, alice);
}

async fn payment_date_range(store: Arc<dyn DocumentStore>) {
    let payments: Repo<Payment> = Repo::new(store);
    let user = DocumentId::generate();
    let course = DocumentId::generate();
    let base = Utc::now();
    for (i, status) in [PaymentStatus::Paid, PaymentStatus::Created, PaymentStatus::Paid]
        .into_iter()
        .enumerate()
    {
        let mut p = Payment::created(
            user.clone(),
            course.clone(),
            format!("order_{i}"),
            1000,
            "INR".into(),
            base + chrono::Duration::days(i as i64),
        );
        p.status = status;
        payments.insert(&p).await.expect("insert payment");
    }
    let window = Filter::all()
        .eq("status", "paid")
        .gte("createdAt", (base + chrono::Duration::hours(1)).to_rfc3339());
    let found = payments
        .find(&window, Some(&Sort::desc("createdAt")))
        .await
        .expect("find");
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].order_id, "order_2");
}

#[tokio::test]
async fn memory_store_satisfies_contract() {
    crud_contract(Arc::new(MemoryStore::new())).await;
    typed_enrollment_query(Arc::new(MemoryStore::new())).await;
    payment_date_range(Arc::new(MemoryStore::new())).await;
}

#[tokio::test]
async fn sqlite_store_satisfies_contract() {
    let dir = tempdir().expect("tempdir");
    crud_contract(Arc::new(
        SqliteStore::open(&dir.path().join("crud.sqlite")).expect("open"),
    ))
    .await;
    typed_enrollment_query(Arc::new(
        SqliteStore::open(&dir.path().join("users.sqlite")).expect("open"),
    ))
    .await;
    payment_date_range(Arc::new(SqliteStore::open_in_memory().expect("open"))).await;
}

#[tokio::test]
async fn sqlite_store_persists_across_reopen() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("persist.sqlite");
    {
        let store = SqliteStore::open(&path).expect("open");
        store
            .insert(Collection::Announcements, json!({"_id": "a1", "title": "hello"}))
            .await
            .expect("insert");
    }
    let store = SqliteStore::open(&path).expect("reopen");
    let doc = store
        .get(Collection::Announcements, "a1")
        .await
        .expect("get")
        .expect("present");
    assert_eq!(doc["title"], "hello");
}
