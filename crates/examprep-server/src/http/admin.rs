// SPDX-License-Identifier: Apache-2.0

//! Admin account, student management and reporting routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use examprep_api::params::{parse_payment_filter, parse_receipt_format, PaymentFilterParams};
use examprep_api::{
    ApiError, ChangePasswordRequest, CourseStatistics, CreateAdminRequest, LoginRequest,
    LoginResponse, PaymentSummary, UpdateCourseStatusRequest, UpdateStudentRequest,
};
use examprep_core::DocumentId;
use examprep_model::{
    validate_email, Admin, Course, Payment, PaymentStatus, Receipt, Role, User,
};
use examprep_store::{Filter, Sort};
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

use super::{
    course_brief, course_index, document_value, enrollment_view, not_found, path_id, JsonBody,
};
use crate::auth::{hash_password, verify_password, AdminAuth};
use crate::error::{ApiFailure, HandlerResult};
use crate::receipts::download_response;
use crate::AppState;

fn present(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
}

pub(crate) async fn create_admin_handler(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateAdminRequest>,
) -> HandlerResult<Response> {
    if !state.api.allow_admin_bootstrap {
        return Err(ApiFailure(ApiError::forbidden("Admin bootstrap is disabled")));
    }
    let role = match present(&req.role) {
        Some(raw) => Role::parse(&raw)?,
        None => Role::Admin,
    };
    if req.password.trim().is_empty() {
        return Err(ApiFailure(ApiError::missing_field("password")));
    }
    let admins = state.repo::<Admin>();
    let email = req.email.trim().to_ascii_lowercase();
    if admins.find_one(&Filter::all().eq("email", email.as_str())).await?.is_some() {
        return Err(ApiFailure(ApiError::validation_failed(
            "Admin already exists",
            json!([{"field": "email", "reason": "exists"}]),
        )));
    }

    let mut admin = Admin::new(&email, hash_password(&req.password)?, role, Utc::now())?;
    admin.name = present(&req.name);
    admin.phone_number = present(&req.phone_number);
    admins.insert(&admin).await?;
    info!(admin_id = %admin.id, role = %admin.role, "admin created");
    Ok((
        StatusCode::CREATED,
        Json(json!({"success": true, "message": "Admin created successfully"})),
    )
        .into_response())
}

pub(crate) async fn login_handler(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> HandlerResult<Json<LoginResponse>> {
    let email = req.email.trim().to_ascii_lowercase();
    let Some(admin) = state
        .repo::<Admin>()
        .find_one(&Filter::all().eq("email", email.as_str()))
        .await?
    else {
        return Err(ApiFailure(ApiError::not_found("Admin not found")));
    };
    if !verify_password(&req.password, &admin.password_hash) {
        warn!(admin_id = %admin.id, "admin login rejected");
        return Err(ApiFailure(ApiError::unauthorized("Invalid credentials")));
    }
    let token = state.tokens.issue(
        admin.id.as_str(),
        admin.role,
        state.api.admin_token_ttl,
        Utc::now(),
    )?;
    info!(admin_id = %admin.id, "admin logged in");
    Ok(Json(LoginResponse { token }))
}

async fn load_admin(state: &AppState, id: &str, missing: &str) -> HandlerResult<Admin> {
    let Ok(id) = DocumentId::parse(id) else {
        return Err(ApiFailure(ApiError::not_found(missing)));
    };
    state
        .repo::<Admin>()
        .get(&id)
        .await?
        .ok_or_else(|| ApiFailure(ApiError::not_found(missing)))
}

pub(crate) async fn change_password_handler(
    State(state): State<AppState>,
    AdminAuth(claims): AdminAuth,
    JsonBody(req): JsonBody<ChangePasswordRequest>,
) -> HandlerResult<Json<Value>> {
    let (current, new) = req.validate()?;
    let mut admin = load_admin(&state, &claims.id, "Admin not found.").await?;
    if !verify_password(&current, &admin.password_hash) {
        return Err(ApiFailure(ApiError::unauthorized(
            "Current password is incorrect.",
        )));
    }
    admin.password_hash = hash_password(&new)?;
    state.repo::<Admin>().save(&admin).await?;
    info!(admin_id = %admin.id, "admin password changed");
    Ok(Json(
        json!({"success": true, "message": "Password changed successfully."}),
    ))
}

pub(crate) async fn me_handler(
    State(state): State<AppState>,
    AdminAuth(claims): AdminAuth,
) -> HandlerResult<Json<Value>> {
    let admin = load_admin(&state, &claims.id, "Admin not found").await?;
    Ok(Json(json!({"success": true, "admin": admin.profile()})))
}

async fn students_newest_first(state: &AppState) -> HandlerResult<Vec<User>> {
    Ok(state
        .repo::<User>()
        .find(&Filter::all(), Some(&Sort::desc("createdAt")))
        .await?)
}

pub(crate) async fn get_students_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
) -> HandlerResult<Json<Value>> {
    let students = students_newest_first(&state).await?;
    Ok(Json(json!({"success": true, "students": students})))
}

pub(crate) async fn update_student_handler(
    State(state): State<AppState>,
    AdminAuth(claims): AdminAuth,
    Path(id): Path<String>,
    JsonBody(req): JsonBody<UpdateStudentRequest>,
) -> HandlerResult<Json<Value>> {
    let id = path_id("id", &id)?;
    let users = state.repo::<User>();
    let _guard = state.student_lock.lock().await;
    let mut student = users.get(&id).await?.ok_or_else(|| not_found("Student"))?;

    if let Some(name) = present(&req.name) {
        student.name = name;
    }
    if let Some(email) = present(&req.email) {
        validate_email(&email)?;
        student.email = email.to_ascii_lowercase();
    }
    let optional = [
        (&mut student.phone_number, &req.phone_number),
        (&mut student.city, &req.city),
        (&mut student.gender, &req.gender),
        (&mut student.dob, &req.dob),
        (&mut student.selected_category, &req.selected_category),
        (&mut student.selected_exam, &req.selected_exam),
    ];
    for (slot, value) in optional {
        if value.is_some() {
            *slot = present(value);
        }
    }
    users.save(&student).await?;
    info!(user_id = %student.id, admin_id = %claims.id, "student updated");
    Ok(Json(json!({
        "success": true,
        "message": "Student updated successfully!",
        "student": student,
    })))
}

pub(crate) async fn delete_student_handler(
    State(state): State<AppState>,
    AdminAuth(claims): AdminAuth,
    Path(id): Path<String>,
) -> HandlerResult<Json<Value>> {
    let id = path_id("id", &id)?;
    let _guard = state.student_lock.lock().await;
    if !state.repo::<User>().delete(&id).await? {
        return Err(not_found("Student"));
    }
    info!(user_id = %id, admin_id = %claims.id, "student deleted");
    Ok(Json(
        json!({"success": true, "message": "Student deleted successfully!"}),
    ))
}

fn student_view(user: &User, courses: &HashMap<DocumentId, Course>) -> HandlerResult<Value> {
    let mut view = document_value(user)?;
    let enrollments = user
        .enrolled_courses
        .iter()
        .map(|e| enrollment_view(e, courses))
        .collect::<Result<Vec<_>, _>>()?;
    if let Some(obj) = view.as_object_mut() {
        obj.insert("enrolledCourses".to_string(), Value::Array(enrollments));
    }
    Ok(view)
}

pub(crate) async fn paid_users_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
) -> HandlerResult<Json<Value>> {
    let courses = course_index(&state).await?;
    let users = students_newest_first(&state)
        .await?
        .into_iter()
        .filter(User::has_any_unlocked)
        .map(|u| student_view(&u, &courses))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(json!({"success": true, "users": users})))
}

fn payment_view(
    payment: &Payment,
    courses: &HashMap<DocumentId, Course>,
    users: Option<&HashMap<DocumentId, User>>,
) -> HandlerResult<Value> {
    let mut view = document_value(payment)?;
    if let Some(obj) = view.as_object_mut() {
        if let Some(course) = courses.get(&payment.course_id) {
            obj.insert("courseId".to_string(), course_brief(course));
        }
        if let Some(user) = users.and_then(|u| u.get(&payment.user_id)) {
            obj.insert(
                "userId".to_string(),
                json!({
                    "_id": user.id,
                    "name": user.name,
                    "email": user.email,
                    "phoneNumber": user.phone_number,
                }),
            );
        }
    }
    Ok(view)
}

pub(crate) async fn students_with_purchases_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
) -> HandlerResult<Json<Value>> {
    let courses = course_index(&state).await?;
    let mut by_user: HashMap<DocumentId, Vec<Payment>> = HashMap::new();
    for payment in state
        .repo::<Payment>()
        .find(&Filter::all(), Some(&Sort::desc("createdAt")))
        .await?
    {
        by_user.entry(payment.user_id.clone()).or_default().push(payment);
    }

    let mut students = Vec::new();
    for user in students_newest_first(&state).await? {
        let payments = by_user.remove(&user.id).unwrap_or_default();
        let total_spent: u64 = payments
            .iter()
            .filter(|p| p.is_paid())
            .map(|p| p.amount)
            .sum();
        let mut view = student_view(&user, &courses)?;
        let payment_views = payments
            .iter()
            .map(|p| payment_view(p, &courses, None))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(obj) = view.as_object_mut() {
            obj.insert("payments".to_string(), Value::Array(payment_views));
            obj.insert("totalSpent".to_string(), json!(total_spent));
        }
        students.push(view);
    }
    Ok(Json(json!({
        "success": true,
        "count": students.len(),
        "students": students,
    })))
}

fn payment_filter(params: &PaymentFilterParams) -> Filter {
    let mut filter = Filter::all();
    if let Some(status) = params.status {
        filter = filter.eq("status", status.as_str());
    }
    if let Some(course_id) = &params.course_id {
        filter = filter.eq("courseId", course_id.as_str());
    }
    if let Some(start) = params.start {
        filter = filter.gte("createdAt", start.to_rfc3339());
    }
    if let Some(end) = params.end {
        filter = filter.lte("createdAt", end.to_rfc3339());
    }
    filter
}

pub(crate) async fn payments_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
    Query(query): Query<BTreeMap<String, String>>,
) -> HandlerResult<Json<Value>> {
    let params = parse_payment_filter(&query)?;
    let payments = state
        .repo::<Payment>()
        .find(&payment_filter(&params), Some(&Sort::desc("createdAt")))
        .await?;
    let courses = course_index(&state).await?;
    let users: HashMap<DocumentId, User> = state
        .repo::<User>()
        .find(&Filter::all(), None)
        .await?
        .into_iter()
        .map(|u| (u.id.clone(), u))
        .collect();
    let views = payments
        .iter()
        .map(|p| payment_view(p, &courses, Some(&users)))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Json(json!({
        "success": true,
        "payments": views,
        "summary": PaymentSummary::from_payments(&payments),
    })))
}

pub(crate) async fn course_statistics_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
) -> HandlerResult<Json<Value>> {
    let courses = state
        .repo::<Course>()
        .find(&Filter::all(), Some(&Sort::asc("createdAt")))
        .await?;
    let users = state.repo::<User>().find(&Filter::all(), None).await?;
    let paid = state
        .repo::<Payment>()
        .find(&Filter::all().eq("status", PaymentStatus::Paid.as_str()), None)
        .await?;

    let stats = courses
        .into_iter()
        .map(|course| {
            let total_enrollments = users.iter().filter(|u| u.has_unlocked(&course.id)).count();
            let (total_payments, total_revenue) = paid
                .iter()
                .filter(|p| p.course_id == course.id)
                .fold((0usize, 0u64), |(n, sum), p| (n + 1, sum + p.amount));
            CourseStatistics {
                average_payment: CourseStatistics::average(total_revenue, total_payments),
                course_id: course.id,
                name: course.name,
                price: course.price,
                published: course.published,
                total_enrollments,
                total_payments,
                total_revenue,
            }
        })
        .collect::<Vec<_>>();
    Ok(Json(json!({"success": true, "courseStatistics": stats})))
}

pub(crate) async fn update_course_status_handler(
    State(state): State<AppState>,
    AdminAuth(claims): AdminAuth,
    Path((student_id, course_id)): Path<(String, String)>,
    JsonBody(req): JsonBody<UpdateCourseStatusRequest>,
) -> HandlerResult<Json<Value>> {
    let status = req.validate()?;
    let student_id = path_id("studentId", &student_id)?;
    let course_id = path_id("courseId", &course_id)?;
    let users = state.repo::<User>();
    let _guard = state.student_lock.lock().await;
    let mut user = users
        .get(&student_id)
        .await?
        .ok_or_else(|| not_found("Student"))?;
    let change = user.set_course_status(&course_id, status, Utc::now());
    users.save(&user).await?;
    info!(
        user_id = %user.id,
        course_id = %course_id,
        admin_id = %claims.id,
        status = %status,
        change = ?change,
        "course status updated"
    );
    Ok(Json(json!({
        "success": true,
        "message": format!("Course status updated to {status}"),
        "user": user,
    })))
}

pub(crate) async fn receipt_download_handler(
    State(state): State<AppState>,
    AdminAuth(_): AdminAuth,
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
    let links = format!("/api/admin/receipt/{id}/download");
    download_response(&state, receipt, format, &links).await
}
