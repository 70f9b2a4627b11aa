//! Payment-to-unlock flow: gateway orders, checkout verification and
//! the receipt issued once a course is unlocked.

mod gateway;
mod signature;

pub use gateway::{
    order_receipt_ref, GatewayError, GatewayOrder, OfflineGateway, PaymentGateway, RazorpayGateway,
};
pub use signature::{payment_signature, verify_signature};

use chrono::Utc;
use examprep_api::{ApiError, VerifiedPaymentFields};
use examprep_core::DocumentId;
use examprep_model::{Course, Payment, Receipt, UnlockOutcome, User};
use examprep_store::Filter;
use serde_json::json;
use tracing::{info, warn};

use crate::auth::{IdentitySource, StudentIdentity};
use crate::error::ApiFailure;
use crate::seed::ensure_demo_student;
use crate::AppState;

pub const DEV_ORDER_PREFIX: &str = "dev_order_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockConfirmation {
    pub course_id: DocumentId,
    pub receipt_id: DocumentId,
    pub receipt_number: String,
    /// The order had already been settled by an earlier call.
    pub replayed: bool,
}

/// Resolves the caller to a stored student record.
pub(crate) async fn load_student(
    state: &AppState,
    identity: &StudentIdentity,
) -> Result<User, ApiFailure> {
    if identity.source == IdentitySource::DemoFallback {
        return ensure_demo_student(state).await;
    }
    let Ok(id) = DocumentId::parse(&identity.id) else {
        return Err(ApiFailure(ApiError::forbidden(
            "A student account is required for this action",
        )));
    };
    state
        .repo::<User>()
        .get(&id)
        .await?
        .ok_or_else(|| ApiFailure(ApiError::not_found("User not found")))
}

/// Creates a gateway order and, when a course is named, a pending payment.
pub async fn create_order(
    state: &AppState,
    identity: &StudentIdentity,
    amount: u64,
    course_id: Option<DocumentId>,
    currency: &str,
) -> Result<GatewayOrder, ApiFailure> {
    let now = Utc::now();
    let owner = match &course_id {
        Some(course_id) => {
            let Some(course) = state.repo::<Course>().get(course_id).await? else {
                return Err(ApiFailure(ApiError::not_found("Course not found")));
            };
            check_course_amount(&course, amount)?;
            Some(load_student(state, identity).await?)
        }
        None => None,
    };

    let order = state
        .gateway
        .create_order(amount, currency, &order_receipt_ref(now.timestamp()))
        .await
        .map_err(|e| {
            warn!(gateway = state.gateway.gateway_tag(), "create order failed: {e}");
            ApiFailure(ApiError::upstream_payment_unavailable(e.0))
        })?;

    if let (Some(user), Some(course_id)) = (owner, course_id) {
        let payment = Payment::created(
            user.id,
            course_id,
            order.id.clone(),
            order.amount,
            order.currency.clone(),
            now,
        );
        state.repo::<Payment>().insert(&payment).await?;
    }
    info!(order_id = %order.id, amount = order.amount, "payment order created");
    Ok(order)
}

/// Orders for a course must charge exactly its price, in paise.
fn check_course_amount(course: &Course, amount: u64) -> Result<(), ApiFailure> {
    let expected = course.price_in_paise();
    if amount == expected {
        return Ok(());
    }
    Err(ApiFailure(ApiError::validation_failed(
        "Amount does not match the course price",
        json!([{"field": "amount", "expected": expected, "received": amount}]),
    )))
}

fn signature_accepted(state: &AppState, fields: &VerifiedPaymentFields) -> bool {
    if state.api.dev_mode && fields.order_id.starts_with(DEV_ORDER_PREFIX) {
        info!(order_id = %fields.order_id, "dev order accepted without signature");
        return true;
    }
    verify_signature(
        &fields.order_id,
        &fields.payment_id,
        &fields.signature,
        &state.api.payment.key_secret,
    )
}

/// Verifies a completed checkout, records the payment, unlocks the course and
/// issues a receipt. Repeating the call for the same order returns the
/// receipt issued the first time.
pub async fn verify_and_unlock(
    state: &AppState,
    identity: &StudentIdentity,
    fields: VerifiedPaymentFields,
) -> Result<UnlockConfirmation, ApiFailure> {
    let courses = state.repo::<Course>();
    let Some(course) = courses.get(&fields.course_id).await? else {
        return Err(ApiFailure(ApiError::not_found("Course not found")));
    };
    if !signature_accepted(state, &fields) {
        warn!(order_id = %fields.order_id, "payment signature mismatch");
        return Err(ApiFailure(ApiError::payment_verification_failed()));
    }

    let _guard = state.student_lock.lock().await;
    let mut user = load_student(state, identity).await?;
    let now = Utc::now();
    let users = state.repo::<User>();
    let receipts = state.repo::<Receipt>();
    let payments = state.repo::<Payment>();
    let by_order = Filter::all().eq("orderId", fields.order_id.as_str());

    if let Some(existing) = receipts.find_one(&by_order).await? {
        if existing.user_id != user.id || existing.course_id != course.id {
            return Err(ApiFailure(ApiError::conflict(
                "Order has already been used for another purchase",
            )));
        }
        if user.unlock_course(&course.id, now) == UnlockOutcome::Unlocked {
            users.save(&user).await?;
        }
        return Ok(UnlockConfirmation {
            course_id: course.id,
            receipt_id: existing.id,
            receipt_number: existing.receipt_number,
            replayed: true,
        });
    }

    let payment = match payments.find_one(&by_order).await? {
        Some(mut pending) => {
            if pending.user_id != user.id || pending.course_id != course.id {
                return Err(ApiFailure(ApiError::conflict(
                    "Order does not belong to this purchase",
                )));
            }
            if let Err(mismatch) = check_course_amount(&course, pending.amount) {
                warn!(
                    order_id = %pending.order_id,
                    amount = pending.amount,
                    "order amount differs from course price"
                );
                return Err(mismatch);
            }
            pending.mark_paid(fields.payment_id.clone(), fields.signature.clone(), now);
            payments.save(&pending).await?;
            pending
        }
        None => {
            let mut fresh = Payment::created(
                user.id.clone(),
                course.id.clone(),
                fields.order_id.clone(),
                course.price_in_paise(),
                state.api.payment.currency.clone(),
                now,
            );
            fresh.mark_paid(fields.payment_id.clone(), fields.signature.clone(), now);
            payments.insert(&fresh).await?;
            fresh
        }
    };

    user.unlock_course(&course.id, now);
    users.save(&user).await?;

    let receipt = Receipt {
        id: DocumentId::generate(),
        receipt_number: Receipt::number_for(now, &payment.id),
        payment_id: payment.id.clone(),
        user_id: user.id.clone(),
        course_id: course.id.clone(),
        order_id: payment.order_id.clone(),
        gateway_payment_id: payment.payment_id.clone(),
        amount: payment.amount,
        currency: payment.currency.clone(),
        course_name: course.name.clone(),
        student_name: user.name.clone(),
        student_email: user.email.clone(),
        student_phone: user.phone_number.clone(),
        payment_method: state.gateway.gateway_tag().to_string(),
        issued_at: now,
        download_count: 0,
        last_downloaded_at: None,
    };
    receipts.insert(&receipt).await?;
    info!(
        user_id = %user.id,
        course_id = %course.id,
        order_id = %payment.order_id,
        receipt_number = %receipt.receipt_number,
        "course unlocked after payment"
    );

    Ok(UnlockConfirmation {
        course_id: course.id,
        receipt_id: receipt.id,
        receipt_number: receipt.receipt_number,
        replayed: false,
    })
}
