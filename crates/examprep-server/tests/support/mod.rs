#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use examprep_model::{Role, User};
use examprep_server::{build_router, ApiConfig, AppState, PaymentConfig};
use examprep_store::{DocumentStore, MemoryStore, Repo};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub const PAYMENT_SECRET: &str = "integration-payment-secret";
pub const ADMIN_EMAIL: &str = "owner@examprep.test";
pub const ADMIN_PASSWORD: &str = "owner-pass-123";

pub fn production_config() -> ApiConfig {
    ApiConfig {
        jwt_secret: "integration-jwt-secret-0123456789".to_string(),
        allow_admin_bootstrap: true,
        cors_allowed_origins: vec!["https://app.examprep.test".to_string()],
        payment: PaymentConfig {
            key_secret: PAYMENT_SECRET.to_string(),
            ..PaymentConfig::default()
        },
        ..ApiConfig::default()
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub state: AppState,
}

pub async fn spawn(api: ApiConfig) -> TestServer {
    spawn_on(Arc::new(MemoryStore::new()), api).await
}

pub async fn spawn_on(store: Arc<dyn DocumentStore>, api: ApiConfig) -> TestServer {
    let state = AppState::with_config(store, api);
    let app = build_router(state.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("serve");
    });
    TestServer { addr, state }
}

#[derive(Debug)]
pub struct Reply {
    pub status: u16,
    pub head: String,
    pub body: String,
}

impl Reply {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("json body")
    }

    pub fn header(&self, name: &str) -> Option<String> {
        self.head.lines().skip(1).find_map(|line| {
            let (k, v) = line.split_once(':')?;
            k.trim()
                .eq_ignore_ascii_case(name)
                .then(|| v.trim().to_string())
        })
    }
}

pub async fn send_raw(
    addr: SocketAddr,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: Option<&str>,
) -> Reply {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    for (k, v) in headers {
        req.push_str(&format!("{k}: {v}\r\n"));
    }
    if let Some(body) = body {
        req.push_str("Content-Type: application/json\r\n");
        req.push_str(&format!("Content-Length: {}\r\n", body.len()));
    }
    req.push_str("\r\n");
    if let Some(body) = body {
        req.push_str(body);
    }
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    Reply {
        status,
        head: head.to_string(),
        body: body.to_string(),
    }
}

impl TestServer {
    pub async fn get(&self, path: &str, token: Option<&str>) -> Reply {
        let auth = token.map(|t| format!("Bearer {t}"));
        let headers: Vec<(&str, &str)> = auth
            .as_deref()
            .map(|a| vec![("Authorization", a)])
            .unwrap_or_default();
        send_raw(self.addr, "GET", path, &headers, None).await
    }

    pub async fn call(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: &Value,
    ) -> Reply {
        let auth = token.map(|t| format!("Bearer {t}"));
        let headers: Vec<(&str, &str)> = auth
            .as_deref()
            .map(|a| vec![("Authorization", a)])
            .unwrap_or_default();
        let raw = body.to_string();
        send_raw(self.addr, method, path, &headers, Some(&raw)).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> Reply {
        let auth = token.map(|t| format!("Bearer {t}"));
        let headers: Vec<(&str, &str)> = auth
            .as_deref()
            .map(|a| vec![("Authorization", a)])
            .unwrap_or_default();
        send_raw(self.addr, "DELETE", path, &headers, None).await
    }

    /// Bootstraps the owner account and logs it in.
    pub async fn admin_token(&self) -> String {
        self.staff_token(ADMIN_EMAIL, "admin").await
    }

    pub async fn staff_token(&self, email: &str, role: &str) -> String {
        let created = self
            .call(
                "POST",
                "/api/admin/create",
                None,
                &json!({"email": email, "password": ADMIN_PASSWORD, "role": role}),
            )
            .await;
        assert_eq!(created.status, 201, "{}", created.body);
        let login = self
            .call(
                "POST",
                "/api/admin/login",
                None,
                &json!({"email": email, "password": ADMIN_PASSWORD}),
            )
            .await;
        assert_eq!(login.status, 200, "{}", login.body);
        login.json()["token"]
            .as_str()
            .expect("token")
            .to_string()
    }

    /// Stores a student record and signs a token for it.
    pub async fn student(&self, name: &str, email: &str) -> (User, String) {
        let user = User::new(name, email, Some("9876543210".to_string()), Utc::now())
            .expect("valid student");
        Repo::<User>::new(Arc::clone(&self.state.store))
            .insert(&user)
            .await
            .expect("insert student");
        let token = self
            .state
            .tokens
            .issue(
                user.id.as_str(),
                Role::Student,
                Duration::from_secs(3600),
                Utc::now(),
            )
            .expect("student token");
        (user, token)
    }

    pub async fn create_course(
        &self,
        admin: &str,
        name: &str,
        price: f64,
        published: bool,
    ) -> String {
        let reply = self
            .call(
                "POST",
                "/api/admin/courses",
                Some(admin),
                &json!({
                    "name": name,
                    "description": format!("{name} preparation"),
                    "price": price,
                    "published": published,
                }),
            )
            .await;
        assert_eq!(reply.status, 201, "{}", reply.body);
        created_id(&reply, "course")
    }

    /// Creates one subject, chapter, topic, test and question under `course_id`.
    pub async fn create_tree(&self, admin: &str, course_id: &str) -> ContentIds {
        let subject = self
            .call(
                "POST",
                "/api/admin/subjects",
                Some(admin),
                &json!({"courseId": course_id, "name": "Quantitative Aptitude", "order": 1}),
            )
            .await;
        assert_eq!(subject.status, 201, "{}", subject.body);
        let subject_id = created_id(&subject, "subject");
        let chapter = self
            .call(
                "POST",
                "/api/admin/chapters",
                Some(admin),
                &json!({"subjectId": subject_id, "name": "Arithmetic", "order": 1}),
            )
            .await;
        assert_eq!(chapter.status, 201, "{}", chapter.body);
        let chapter_id = created_id(&chapter, "chapter");
        let topic = self
            .call(
                "POST",
                "/api/admin/topics",
                Some(admin),
                &json!({"chapterId": chapter_id, "name": "Percentages", "order": 1}),
            )
            .await;
        assert_eq!(topic.status, 201, "{}", topic.body);
        let topic_id = created_id(&topic, "topic");
        let test = self
            .call(
                "POST",
                "/api/admin/tests",
                Some(admin),
                &json!({"topicId": topic_id, "title": "Percentages drill", "durationMinutes": 20}),
            )
            .await;
        assert_eq!(test.status, 201, "{}", test.body);
        let test_id = created_id(&test, "test");
        let question = self
            .call(
                "POST",
                "/api/admin/questions",
                Some(admin),
                &json!({
                    "testId": test_id,
                    "questionText": "What is 20% of 150?",
                    "options": {"A": "20", "B": "25", "C": "30", "D": "35"},
                    "correctOption": "C",
                }),
            )
            .await;
        assert_eq!(question.status, 201, "{}", question.body);
        ContentIds {
            subject: subject_id,
            chapter: chapter_id,
            topic: topic_id,
            test: test_id,
            question: created_id(&question, "question"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContentIds {
    pub subject: String,
    pub chapter: String,
    pub topic: String,
    pub test: String,
    pub question: String,
}

pub fn created_id(reply: &Reply, key: &str) -> String {
    reply.json()[key]["_id"]
        .as_str()
        .unwrap_or_else(|| panic!("{key} id in {}", reply.body))
        .to_string()
}

pub fn error_code(reply: &Reply) -> String {
    reply.json()["error"]["code"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}
