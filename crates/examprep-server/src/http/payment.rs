use axum::extract::{Path, Query, State};
use axum::response::Response;
use axum::Json;
use examprep_api::params::parse_receipt_format;
use examprep_api::{ApiError, CreateOrderRequest, VerifyPaymentRequest};
use examprep_model::Receipt;
use examprep_store::{Filter, Sort};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use tracing::warn;

use super::{not_found, path_id, JsonBody};
use crate::auth::StudentAuth;
use crate::error::{ApiFailure, HandlerResult};
use crate::payments::{create_order, load_student, verify_and_unlock};
use crate::receipts::download_response;
use crate::AppState;

pub(crate) async fn create_order_handler(
    State(state): State<AppState>,
    StudentAuth(identity): StudentAuth,
    JsonBody(req): JsonBody<CreateOrderRequest>,
) -> HandlerResult<Json<Value>> {
    let (amount, course_id, currency) = req.validate()?;
    let order = create_order(&state, &identity, amount, course_id, &currency).await?;
    Ok(Json(json!({"success": true, "order": order})))
}

pub(crate) async fn verify_and_unlock_handler(
    State(state): State<AppState>,
    StudentAuth(identity): StudentAuth,
    JsonBody(req): JsonBody<VerifyPaymentRequest>,
) -> HandlerResult<Json<Value>> {
    let fields = req.validate()?;
    let done = verify_and_unlock(&state, &identity, fields).await?;
    let message = if done.replayed {
        "Payment already verified"
    } else {
        "Payment verified and course unlocked"
    };
    Ok(Json(json!({
        "success": true,
        "message": message,
        "courseId": done.course_id,
        "receiptId": done.receipt_id,
        "receiptNumber": done.receipt_number,
    })))
}

pub(crate) async fn receipts_handler(
    State(state): State<AppState>,
    StudentAuth(identity): StudentAuth,
) -> HandlerResult<Json<Value>> {
    let user = load_student(&state, &identity).await?;
    let receipts = state
        .repo::<Receipt>()
        .find(
            &Filter::all().eq("userId", user.id.as_str()),
            Some(&Sort::desc("issuedAt")),
        )
        .await?;
    Ok(Json(json!({
        "success": true,
        "count": receipts.len(),
        "receipts": receipts,
    })))
}

pub(crate) async fn receipt_download_handler(
    State(state): State<AppState>,
    StudentAuth(identity): StudentAuth,
    Path(receipt_id): Path<String>,
    Query(query): Query<BTreeMap<String, String>>,
) -> HandlerResult<Response> {
    let format = parse_receipt_format(&query)?;
    let id = path_id("receiptId", &receipt_id)?;
    let receipt = state
        .repo::<Receipt>()
        .get(&id)
        .await?
        .ok_or_else(|| not_found("Receipt"))?;
    let user = load_student(&state, &identity).await?;
    if receipt.user_id != user.id {
        warn!(receipt_id = %receipt.id, user_id = %user.id, "receipt download refused");
        return Err(ApiFailure(ApiError::forbidden(
            "You can only download your own receipts",
        )));
    }
    let links = format!("/api/user/receipt/{id}/download");
    download_response(&state, receipt, format, &links).await
}
