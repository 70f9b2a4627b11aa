// SPDX-License-Identifier: Apache-2.0

use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{HeaderMap, HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use examprep_api::ApiError;
use std::net::SocketAddr;
use std::time::Instant;
use tracing::{info, warn};

use super::request_tracing::REQUEST_ID_HEADER;
use crate::error::ApiFailure;
use crate::AppState;

pub(crate) fn normalized_header_value(
    headers: &HeaderMap,
    key: &str,
    max_len: usize,
) -> Option<String> {
    let raw = headers.get(key)?.to_str().ok()?.trim();
    if raw.is_empty() || raw.len() > max_len {
        return None;
    }
    Some(raw.to_string())
}

pub(crate) fn normalized_forwarded_for(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get("x-forwarded-for")?.to_str().ok()?;
    let first = raw.split(',').next()?.trim();
    if first.is_empty() || first.len() > 64 {
        return None;
    }
    if first
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'.' || b == b':' || b == b'-')
    {
        Some(first.to_string())
    } else {
        None
    }
}

/// Forwarded address first, then the socket peer.
fn client_ip(req: &Request<Body>) -> String {
    normalized_forwarded_for(req.headers())
        .or_else(|| {
            req.extensions()
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        })
        .unwrap_or_else(|| "unknown".to_string())
}

fn apply_security_headers(resp: &mut Response) {
    let headers = resp.headers_mut();
    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert("referrer-policy", HeaderValue::from_static("no-referrer"));
}

pub(crate) async fn security_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let request_id =
        normalized_header_value(req.headers(), REQUEST_ID_HEADER, 128).unwrap_or_default();
    let client_ip = client_ip(&req);

    let limit = &state.api.rate_limit_per_ip;
    let mut resp = if state.ip_limiter.allow(&client_ip, limit).await {
        next.run(req).await
    } else {
        warn!(client_ip = %client_ip, path = %path, "rate limit exceeded");
        ApiFailure(ApiError::rate_limited(limit.retry_after_secs())).into_response()
    };
    apply_security_headers(&mut resp);

    if state.api.enable_audit_log {
        info!(
            target: "examprep_audit",
            method = %method,
            path = %path,
            status = resp.status().as_u16(),
            request_id = %request_id,
            client_ip = %client_ip,
            latency_ms = started.elapsed().as_millis() as u64,
            "audit"
        );
    }
    resp
}
