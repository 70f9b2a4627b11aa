use serde::Serialize;
use std::time::Duration;

pub const CONFIG_SCHEMA_VERSION: &str = "1";

#[derive(Debug, Clone, Serialize)]
pub struct RateLimitConfig {
    pub capacity: f64,
    pub refill_per_sec: f64,
}

impl RateLimitConfig {
    /// `requests` allowed per `window`, refilled continuously.
    #[must_use]
    pub fn per_window(requests: u64, window: Duration) -> Self {
        let secs = window.as_secs_f64().max(1.0);
        Self {
            capacity: requests as f64,
            refill_per_sec: requests as f64 / secs,
        }
    }

    /// Seconds until one token is available again.
    #[must_use]
    pub fn retry_after_secs(&self) -> u64 {
        if self.refill_per_sec <= 0.0 {
            return 60;
        }
        (1.0 / self.refill_per_sec).ceil().max(1.0) as u64
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::per_window(1000, Duration::from_secs(15 * 60))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayKind {
    Offline,
    Razorpay,
}

impl GatewayKind {
    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw.trim() {
            "offline" => Ok(Self::Offline),
            "razorpay" => Ok(Self::Razorpay),
            other => Err(format!("unknown payment gateway `{other}`; use offline or razorpay")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentConfig {
    pub gateway: GatewayKind,
    pub key_id: String,
    #[serde(skip_serializing)]
    pub key_secret: String,
    pub base_url: String,
    pub currency: String,
    pub request_timeout: Duration,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            gateway: GatewayKind::Offline,
            key_id: String::new(),
            key_secret: String::new(),
            base_url: "https://api.razorpay.com".to_string(),
            currency: "INR".to_string(),
            request_timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ApiConfig {
    /// Enables the demo-student fallback, the dev routes and the dev payment bypass.
    pub dev_mode: bool,
    pub environment: String,
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub admin_token_ttl: Duration,
    pub student_token_ttl: Duration,
    pub max_body_bytes: usize,
    pub rate_limit_per_ip: RateLimitConfig,
    pub cors_allowed_origins: Vec<String>,
    pub cors_allow_any: bool,
    pub enable_audit_log: bool,
    pub allow_admin_bootstrap: bool,
    pub seed_demo_data: bool,
    pub payment: PaymentConfig,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            dev_mode: false,
            environment: "production".to_string(),
            jwt_secret: String::new(),
            admin_token_ttl: Duration::from_secs(24 * 60 * 60),
            student_token_ttl: Duration::from_secs(24 * 60 * 60),
            max_body_bytes: 10 * 1024 * 1024,
            rate_limit_per_ip: RateLimitConfig::default(),
            cors_allowed_origins: Vec::new(),
            cors_allow_any: false,
            enable_audit_log: false,
            allow_admin_bootstrap: false,
            seed_demo_data: false,
            payment: PaymentConfig::default(),
        }
    }
}

impl ApiConfig {
    /// Defaults for local development: dev mode on, permissive CORS.
    #[must_use]
    pub fn development() -> Self {
        Self {
            dev_mode: true,
            environment: "development".to_string(),
            jwt_secret: "examprep-dev-secret".to_string(),
            cors_allow_any: true,
            allow_admin_bootstrap: true,
            payment: PaymentConfig {
                key_secret: "examprep-dev-payment-secret".to_string(),
                ..PaymentConfig::default()
            },
            ..Self::default()
        }
    }
}

pub fn validate_startup_config_contract(api: &ApiConfig) -> Result<(), String> {
    if api.jwt_secret.trim().is_empty() {
        return Err("jwt secret must be set".to_string());
    }
    if !api.dev_mode && api.jwt_secret.len() < 16 {
        return Err("jwt secret must be at least 16 bytes outside dev mode".to_string());
    }
    if api.max_body_bytes == 0 {
        return Err("max body bytes must be > 0".to_string());
    }
    if api.rate_limit_per_ip.capacity < 1.0 || api.rate_limit_per_ip.refill_per_sec <= 0.0 {
        return Err("rate limit capacity and refill must be > 0".to_string());
    }
    if api.admin_token_ttl.is_zero() || api.student_token_ttl.is_zero() {
        return Err("token lifetimes must be > 0".to_string());
    }
    if api.payment.key_secret.trim().is_empty() {
        return Err("payment key secret must be set to verify payment signatures".to_string());
    }
    if api.payment.gateway == GatewayKind::Razorpay && api.payment.key_id.trim().is_empty() {
        return Err("razorpay gateway requires a key id".to_string());
    }
    if !api.dev_mode && api.cors_allow_any {
        return Err("cors_allow_any is only permitted in dev mode".to_string());
    }
    Ok(())
}
