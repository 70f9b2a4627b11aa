use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use examprep_api::{openapi_v1_spec, API_VERSION};
use serde_json::json;

use super::timestamp_now;
use crate::AppState;

pub(crate) async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "message": "Backend server is running",
        "timestamp": timestamp_now(),
    }))
}

pub(crate) async fn test_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "success": true,
        "message": "API is working",
        "environment": state.api.environment,
        "timestamp": timestamp_now(),
    }))
}

pub(crate) async fn version_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "service": crate::CRATE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": API_VERSION,
        "store": state.store.backend_tag(),
        "payment_gateway": state.gateway.gateway_tag(),
    }))
}

pub(crate) async fn openapi_handler() -> impl IntoResponse {
    Json(openapi_v1_spec())
}
