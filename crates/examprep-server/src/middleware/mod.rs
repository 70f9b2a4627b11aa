mod cors;
mod rate_limiter;
mod request_tracing;
mod security;

pub(crate) use cors::cors_middleware;
pub(crate) use rate_limiter::RateLimiter;
pub(crate) use request_tracing::request_tracing_middleware;
pub(crate) use security::security_middleware;
