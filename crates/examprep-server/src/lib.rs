#![forbid(unsafe_code)]

//! HTTP backend of the examprep platform: catalog administration, the
//! course entitlement check and the payment-to-unlock flow.

use axum::extract::DefaultBodyLimit;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::Router;
use examprep_store::{Document, DocumentStore, Repo};
use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

mod access;
mod auth;
mod config;
mod error;
mod http;
mod middleware;
mod payments;
mod receipts;
mod seed;

pub use access::{check_course_access, require_course_access, AccessDecision, AccessDenial};
pub use auth::{hash_password, verify_password, Claims, TokenIssuer};
pub use config::{
    validate_startup_config_contract, ApiConfig, GatewayKind, PaymentConfig, RateLimitConfig,
    CONFIG_SCHEMA_VERSION,
};
pub use error::{ApiFailure, HandlerResult};
pub use payments::{
    payment_signature, verify_signature, GatewayError, GatewayOrder, OfflineGateway,
    PaymentGateway, RazorpayGateway,
};
pub use seed::{seed_demo_data, SeedReport};

use middleware::{
    cors_middleware, request_tracing_middleware, security_middleware, RateLimiter,
};

pub const CRATE_NAME: &str = "examprep-server";

#[derive(Clone)]
pub struct AppState {
    pub api: ApiConfig,
    pub store: Arc<dyn DocumentStore>,
    pub tokens: TokenIssuer,
    pub gateway: Arc<dyn PaymentGateway>,
    pub(crate) ip_limiter: Arc<RateLimiter>,
    pub(crate) request_id_seed: Arc<AtomicU64>,
    /// Held across every load-modify-save of a `User` record.
    pub(crate) student_lock: Arc<Mutex<()>>,
    /// Held while a receipt's download counter is bumped.
    pub(crate) receipt_lock: Arc<Mutex<()>>,
}

impl AppState {
    #[must_use]
    pub fn new(
        store: Arc<dyn DocumentStore>,
        gateway: Arc<dyn PaymentGateway>,
        api: ApiConfig,
    ) -> Self {
        Self {
            store,
            tokens: TokenIssuer::new(&api.jwt_secret),
            gateway,
            ip_limiter: Arc::new(RateLimiter::default()),
            request_id_seed: Arc::new(AtomicU64::new(0)),
            student_lock: Arc::new(Mutex::new(())),
            receipt_lock: Arc::new(Mutex::new(())),
            api,
        }
    }

    /// Gateway chosen by `api.payment.gateway`.
    #[must_use]
    pub fn with_config(store: Arc<dyn DocumentStore>, api: ApiConfig) -> Self {
        let gateway: Arc<dyn PaymentGateway> = match api.payment.gateway {
            GatewayKind::Offline => Arc::new(OfflineGateway),
            GatewayKind::Razorpay => Arc::new(RazorpayGateway::new(&api.payment)),
        };
        Self::new(store, gateway, api)
    }

    pub(crate) fn repo<T: Document>(&self) -> Repo<T> {
        Repo::new(Arc::clone(&self.store))
    }

    #[cfg(test)]
    pub(crate) fn for_tests(store: Arc<dyn DocumentStore>, api: ApiConfig) -> Self {
        Self::new(store, Arc::new(OfflineGateway), api)
    }
}

/// Periodically drops rate-limit buckets that have refilled.
pub fn spawn_rate_limit_pruner(state: &AppState, every: Duration) -> JoinHandle<()> {
    let limiter = Arc::clone(&state.ip_limiter);
    let cfg = state.api.rate_limit_per_ip.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let dropped = limiter.prune(&cfg).await;
            if dropped > 0 {
                debug!(dropped, "rate limit buckets pruned");
            }
        }
    })
}

fn ops_routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(http::ops::health_handler))
        .route("/api/test", get(http::ops::test_handler))
        .route("/api/version", get(http::ops::version_handler))
        .route("/api/openapi.json", get(http::ops::openapi_handler))
}

fn admin_routes() -> Router<AppState> {
    use http::admin;
    Router::new()
        .route("/api/admin/create", post(admin::create_admin_handler))
        .route("/api/admin/login", post(admin::login_handler))
        .route("/api/admin/change-password", put(admin::change_password_handler))
        .route("/api/admin/me", get(admin::me_handler))
        .route("/api/admin/get-students", get(admin::get_students_handler))
        .route(
            "/api/admin/update-student/:id",
            put(admin::update_student_handler),
        )
        .route(
            "/api/admin/delete-student/:id",
            axum::routing::delete(admin::delete_student_handler),
        )
        .route("/api/admin/paid-users", get(admin::paid_users_handler))
        .route(
            "/api/admin/students-with-purchases",
            get(admin::students_with_purchases_handler),
        )
        .route("/api/admin/payments", get(admin::payments_handler))
        .route(
            "/api/admin/course-statistics",
            get(admin::course_statistics_handler),
        )
        .route(
            "/api/admin/student/:studentId/course/:courseId/status",
            put(admin::update_course_status_handler),
        )
        .route(
            "/api/admin/receipt/:receiptId/download",
            get(admin::receipt_download_handler),
        )
}

fn catalog_routes() -> Router<AppState> {
    use http::catalog as c;
    Router::new()
        .route(
            "/api/admin/courses",
            get(c::list_courses_handler).post(c::create_course_handler),
        )
        .route(
            "/api/admin/courses/:id",
            put(c::update_course_handler).delete(c::delete_course_handler),
        )
        .route("/api/admin/courses/:id/publish", put(c::publish_course_handler))
        .route("/api/admin/courses/:id/subjects", get(c::list_subjects_handler))
        .route("/api/admin/subjects", post(c::create_subject_handler))
        .route(
            "/api/admin/subjects/:id",
            put(c::update_subject_handler).delete(c::delete_subject_handler),
        )
        .route("/api/admin/subjects/:id/chapters", get(c::list_chapters_handler))
        .route("/api/admin/chapters", post(c::create_chapter_handler))
        .route(
            "/api/admin/chapters/:id",
            put(c::update_chapter_handler).delete(c::delete_chapter_handler),
        )
        .route("/api/admin/chapters/:id/topics", get(c::list_topics_handler))
        .route("/api/admin/topics", post(c::create_topic_handler))
        .route(
            "/api/admin/topics/:id",
            put(c::update_topic_handler).delete(c::delete_topic_handler),
        )
        .route("/api/admin/topics/:id/tests", get(c::list_tests_handler))
        .route("/api/admin/tests", post(c::create_test_handler))
        .route(
            "/api/admin/tests/:id",
            put(c::update_test_handler).delete(c::delete_test_handler),
        )
        .route("/api/admin/tests/:id/questions", get(c::list_questions_handler))
        .route("/api/admin/questions", post(c::create_question_handler))
        .route(
            "/api/admin/questions/:id",
            put(c::update_question_handler).delete(c::delete_question_handler),
        )
        .route(
            "/api/admin/study-materials",
            post(c::create_study_material_handler),
        )
        .route(
            "/api/admin/announcements",
            post(c::create_announcement_handler),
        )
}

fn student_routes() -> Router<AppState> {
    use http::student as s;
    Router::new()
        .route(
            "/api/courses/student/published-courses",
            get(s::published_courses_handler),
        )
        .route(
            "/api/courses/student/published-courses/:courseId",
            get(s::published_course_handler),
        )
        .route("/api/courses/:courseId", get(s::course_detail_handler))
        .route(
            "/api/courses/student/course-content/:courseId/subjects",
            get(s::course_subjects_handler),
        )
        .route(
            "/api/courses/student/subject/:subjectId/chapters",
            get(s::subject_chapters_handler),
        )
        .route(
            "/api/courses/student/chapter/:chapterId/topics",
            get(s::chapter_topics_handler),
        )
        .route(
            "/api/courses/student/topic/:topicId/tests",
            get(s::topic_tests_handler),
        )
        .route(
            "/api/courses/student/course-structure/:courseId",
            get(s::course_structure_handler),
        )
        .route("/api/user/student/my-courses", get(s::my_courses_handler))
        .route("/api/study-materials/student", get(s::study_materials_handler))
        .route("/api/announcements", get(s::announcements_handler))
}

fn payment_routes() -> Router<AppState> {
    use http::payment as p;
    Router::new()
        .route("/api/user/payment/create-order", post(p::create_order_handler))
        .route(
            "/api/user/payment/verify-and-unlock",
            post(p::verify_and_unlock_handler),
        )
        .route("/api/user/receipts", get(p::receipts_handler))
        .route(
            "/api/user/receipt/:receiptId/download",
            get(p::receipt_download_handler),
        )
}

fn dev_routes() -> Router<AppState> {
    use http::dev as d;
    Router::new()
        .route("/api/dev/login", post(d::login_handler))
        .route("/api/dev/verify-token", get(d::verify_token_handler))
        .route("/api/dev/unlock-course", post(d::unlock_course_handler))
        .route(
            "/api/dev/unlock-course-payment",
            post(d::unlock_course_payment_handler),
        )
        .route("/api/dev/my-courses", get(d::my_courses_handler))
}

pub fn build_router(state: AppState) -> Router {
    let mut router = Router::new()
        .merge(ops_routes())
        .merge(admin_routes())
        .merge(catalog_routes())
        .merge(student_routes())
        .merge(payment_routes());
    if state.api.dev_mode {
        router = router.merge(dev_routes());
    }
    router
        .layer(from_fn_with_state(state.clone(), security_middleware))
        .layer(from_fn_with_state(state.clone(), request_tracing_middleware))
        .layer(from_fn_with_state(state.clone(), cors_middleware))
        .layer(DefaultBodyLimit::max(state.api.max_body_bytes))
        .with_state(state)
}
