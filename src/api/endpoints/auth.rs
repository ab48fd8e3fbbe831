//! Account endpoints: public registration and login, plus the
//! district-tier registration queue.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::accounts::{self, NewRegistration};
use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository;
use crate::models::enums::Role;
use crate::models::User;
use crate::scope::ScopeDescriptor;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub role: Role,
    pub province: String,
    pub district: String,
    pub sector: String,
}

/// `POST /api/v1/register` — public. The account starts pending and cannot
/// log in until a district reviewer approves it.
pub async fn register(
    State(ctx): State<ApiContext>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<User>, ApiError> {
    let conn = ctx.open_db()?;
    let user = accounts::register(
        &conn,
        &NewRegistration {
            full_name: &req.full_name,
            email: &req.email,
            phone: req.phone.as_deref(),
            password: &req.password,
            role: req.role,
            province: &req.province,
            district: &req.district,
            sector: &req.sector,
        },
    )?;
    Ok(Json(user))
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

/// `POST /api/v1/login` — public. Issues a bearer token for approved
/// accounts with valid credentials.
pub async fn login(
    State(ctx): State<ApiContext>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let user = accounts::login(&conn, &req.email, &req.password)?;

    let token = {
        let mut sessions = ctx
            .sessions
            .lock()
            .map_err(|_| ApiError::Internal("session lock".into()))?;
        sessions.issue(ScopeDescriptor::from_user(&user))
    };

    Ok(Json(LoginResponse { token, user }))
}

/// `GET /api/v1/registrations` — pending registrations in the caller's
/// district. District reviewers only.
pub async fn pending(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
) -> Result<Json<Vec<User>>, ApiError> {
    let conn = ctx.open_db()?;
    Ok(Json(accounts::pending_registrations(&conn, &scope)?))
}

#[derive(Deserialize)]
pub struct ApprovalRequest {
    pub approve: bool,
}

/// `PATCH /api/v1/register/:id/approve` — approve or reject a pending
/// registration.
pub async fn decide(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
    Path(user_id): Path<Uuid>,
    Json(req): Json<ApprovalRequest>,
) -> Result<Json<User>, ApiError> {
    let conn = ctx.open_db()?;
    let user = accounts::decide_registration(&conn, &user_id, &scope, req.approve)?;
    Ok(Json(user))
}

/// `DELETE /api/v1/register/:id` — remove an account. District reviewers
/// only, within their own district. Any live sessions are revoked.
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = ctx.open_db()?;
    let user = repository::get_user(&conn, &user_id)?
        .ok_or_else(|| ApiError::NotFound(format!("registration {user_id} not found")))?;
    if !scope.reviews_district(&user.district) {
        return Err(ApiError::Forbidden(
            "caller may not administer registrations for this district".into(),
        ));
    }
    repository::delete_user(&conn, &user_id)?;

    if let Ok(mut sessions) = ctx.sessions.lock() {
        sessions.revoke_user(&user_id);
    }

    tracing::info!(%user_id, "account removed");
    Ok(Json(serde_json::json!({ "deleted": user_id })))
}
