#![forbid(unsafe_code)]

use examprep_server::{
    build_router, seed_demo_data, spawn_rate_limit_pruner, validate_startup_config_contract,
    ApiConfig, AppState, GatewayKind, RateLimitConfig,
};
use examprep_store::{DocumentStore, MemoryStore, SqliteStore};
use std::env;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|v| match v.as_str() {
            "1" | "true" | "TRUE" | "yes" | "YES" => Some(true),
            "0" | "false" | "FALSE" | "no" | "NO" => Some(false),
            _ => None,
        })
        .unwrap_or(default)
}

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_duration_secs(name: &str, default_secs: u64) -> Duration {
    Duration::from_secs(env_u64(name, default_secs))
}

fn env_list(name: &str) -> Vec<String> {
    env::var(name)
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn api_config_from_env() -> Result<ApiConfig, String> {
    let dev_mode = env_bool("EXAMPREP_DEV_MODE", false);
    let mut api = if dev_mode {
        ApiConfig::development()
    } else {
        ApiConfig::default()
    };
    if let Ok(env_name) = env::var("EXAMPREP_ENVIRONMENT") {
        api.environment = env_name;
    }
    if let Ok(secret) = env::var("EXAMPREP_JWT_SECRET") {
        api.jwt_secret = secret;
    }
    api.admin_token_ttl = env_duration_secs(
        "EXAMPREP_ADMIN_TOKEN_TTL_SECS",
        api.admin_token_ttl.as_secs(),
    );
    api.student_token_ttl = env_duration_secs(
        "EXAMPREP_STUDENT_TOKEN_TTL_SECS",
        api.student_token_ttl.as_secs(),
    );
    api.max_body_bytes = env_usize("EXAMPREP_MAX_BODY_BYTES", api.max_body_bytes);
    api.rate_limit_per_ip = RateLimitConfig::per_window(
        env_u64("EXAMPREP_RATE_LIMIT_CAPACITY", 1000),
        env_duration_secs("EXAMPREP_RATE_LIMIT_WINDOW_SECS", 15 * 60),
    );
    let origins = env_list("EXAMPREP_CORS_ORIGINS");
    if !origins.is_empty() {
        api.cors_allowed_origins = origins;
    }
    api.cors_allow_any = env_bool("EXAMPREP_CORS_ALLOW_ANY", api.cors_allow_any);
    api.enable_audit_log = env_bool("EXAMPREP_ENABLE_AUDIT_LOG", api.enable_audit_log);
    api.allow_admin_bootstrap =
        env_bool("EXAMPREP_ALLOW_ADMIN_BOOTSTRAP", api.allow_admin_bootstrap);
    api.seed_demo_data = env_bool("EXAMPREP_SEED_DEMO_DATA", api.seed_demo_data);

    if let Ok(raw) = env::var("EXAMPREP_PAYMENT_GATEWAY") {
        api.payment.gateway = GatewayKind::parse(&raw)?;
    }
    if let Ok(key_id) = env::var("EXAMPREP_RAZORPAY_KEY_ID") {
        api.payment.key_id = key_id;
    }
    if let Ok(key_secret) = env::var("EXAMPREP_RAZORPAY_KEY_SECRET") {
        api.payment.key_secret = key_secret;
    }
    if let Ok(base_url) = env::var("EXAMPREP_RAZORPAY_BASE_URL") {
        api.payment.base_url = base_url;
    }
    api.payment.request_timeout = Duration::from_millis(env_u64(
        "EXAMPREP_PAYMENT_TIMEOUT_MS",
        api.payment.request_timeout.as_millis() as u64,
    ));
    Ok(api)
}

/// `memory` or `sqlite:<path>`.
fn open_store(target: &str) -> Result<Arc<dyn DocumentStore>, String> {
    let target = target.trim();
    if target == "memory" {
        return Ok(Arc::new(MemoryStore::new()));
    }
    if let Some(path) = target.strip_prefix("sqlite:") {
        let store = SqliteStore::open(Path::new(path))
            .map_err(|e| format!("failed to open sqlite store {path}: {e}"))?;
        return Ok(Arc::new(store));
    }
    Err(format!("unknown store `{target}`; use memory or sqlite:<path>"))
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {}
                    _ = sigint.recv() => {}
                }
            }
            _ => {
                warn!("signal handlers unavailable, falling back to ctrl-c");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if env_bool("EXAMPREP_LOG_JSON", true) {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), String> {
    init_tracing();

    let bind_addr = env::var("EXAMPREP_BIND").unwrap_or_else(|_| "0.0.0.0:5000".to_string());
    let api = api_config_from_env()?;
    validate_startup_config_contract(&api)?;
    let store_target = env::var("EXAMPREP_STORE").unwrap_or_else(|_| "memory".to_string());
    let store = open_store(&store_target)?;
    if api.dev_mode {
        warn!("dev mode enabled: demo student fallback and /api/dev routes are active");
    }

    let state = AppState::with_config(store, api);
    if state.api.seed_demo_data {
        match seed_demo_data(&state).await {
            Ok(report) => info!(
                materials = report.materials,
                announcements = report.announcements,
                "demo data seeded"
            ),
            Err(e) => error!("demo data seeding failed: {:?}", e.0),
        }
    }
    let _pruner = spawn_rate_limit_pruner(&state, Duration::from_secs(60));
    info!(
        store = state.store.backend_tag(),
        gateway = state.gateway.gateway_tag(),
        environment = %state.api.environment,
        "examprep-server configured"
    );

    let app = build_router(state);
    let addr: SocketAddr = bind_addr
        .parse()
        .map_err(|e| format!("invalid bind addr {bind_addr}: {e}"))?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| format!("bind failed: {e}"))?;
    info!("examprep-server listening on {bind_addr}");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        wait_for_shutdown_signal().await;
        let drain_ms = env_u64("EXAMPREP_SHUTDOWN_DRAIN_MS", 2000);
        tokio::time::sleep(Duration::from_millis(drain_ms)).await;
    })
    .await
    .map_err(|e| format!("server failed: {e}"))
}
