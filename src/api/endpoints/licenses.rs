//! License application endpoints.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository;
use crate::licensing;
use crate::models::enums::{LicenseStatus, LicenseType, Role};
use crate::models::LicenseApplication;
use crate::scope::ScopeDescriptor;

#[derive(Deserialize)]
pub struct CreateApplicationRequest {
    pub license_type: LicenseType,
    pub specialization: String,
    pub document_ref: Option<String>,
}

/// An application plus the fee its license tier carries. Fees live on
/// `LicenseType` and are derived per response, never stored.
#[derive(Serialize)]
pub struct ApplicationResponse {
    #[serde(flatten)]
    pub application: LicenseApplication,
    pub fee_rwf: u32,
}

impl From<LicenseApplication> for ApplicationResponse {
    fn from(application: LicenseApplication) -> Self {
        let fee_rwf = application.license_type.fee_rwf();
        Self {
            application,
            fee_rwf,
        }
    }
}

/// `POST /api/v1/license-applications`
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
    Json(req): Json<CreateApplicationRequest>,
) -> Result<Json<ApplicationResponse>, ApiError> {
    if req.specialization.trim().is_empty() {
        return Err(ApiError::BadRequest("specialization is required".into()));
    }
    let conn = ctx.open_db()?;
    let app = licensing::submit_application(
        &conn,
        &scope,
        req.license_type,
        &req.specialization,
        req.document_ref.as_deref(),
    )?;
    Ok(Json(app.into()))
}

/// `GET /api/v1/license-applications` — full queue, district reviewers only.
pub async fn list_all(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
) -> Result<Json<Vec<ApplicationResponse>>, ApiError> {
    if scope.role != Role::DistrictVet {
        return Err(ApiError::Forbidden("district reviewers only".into()));
    }
    let conn = ctx.open_db()?;
    let apps = repository::list_license_applications(&conn)?;
    Ok(Json(apps.into_iter().map(Into::into).collect()))
}

/// `GET /api/v1/license-applications/mine`
pub async fn list_mine(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
) -> Result<Json<Vec<ApplicationResponse>>, ApiError> {
    let conn = ctx.open_db()?;
    let apps = repository::list_license_applications_by_applicant(&conn, &scope.user_id)?;
    Ok(Json(apps.into_iter().map(Into::into).collect()))
}

#[derive(Deserialize)]
pub struct DecisionRequest {
    pub status: LicenseStatus,
    pub notes: Option<String>,
}

/// `PATCH /api/v1/license-applications/:id/status` — reviewer verdict.
/// Approval assigns the license number server-side.
pub async fn decide(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
    Path(application_id): Path<Uuid>,
    Json(req): Json<DecisionRequest>,
) -> Result<Json<ApplicationResponse>, ApiError> {
    let mut conn = ctx.open_db()?;
    let app = licensing::decide_application(
        &mut conn,
        &application_id,
        &scope,
        req.status,
        req.notes.as_deref(),
    )?;
    Ok(Json(app.into()))
}

#[derive(Deserialize)]
pub struct ResubmitRequest {
    pub specialization: String,
    pub document_ref: Option<String>,
}

/// `PATCH /api/v1/license-applications/:id` — applicant resubmission.
pub async fn resubmit(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
    Path(application_id): Path<Uuid>,
    Json(req): Json<ResubmitRequest>,
) -> Result<Json<ApplicationResponse>, ApiError> {
    if req.specialization.trim().is_empty() {
        return Err(ApiError::BadRequest("specialization is required".into()));
    }
    let mut conn = ctx.open_db()?;
    let app = licensing::resubmit_application(
        &mut conn,
        &application_id,
        &scope,
        &req.specialization,
        req.document_ref.as_deref(),
    )?;
    Ok(Json(app.into()))
}

/// `DELETE /api/v1/license-applications/:id` — applicant withdrawal of a
/// still-undecided application, or district admin cleanup.
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
    Path(application_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = ctx.open_db()?;
    let app = repository::get_license_application(&conn, &application_id)?.ok_or_else(|| {
        ApiError::NotFound(format!("license application {application_id} not found"))
    })?;

    let allowed = (scope.owns(&app.applicant_id) && app.status == LicenseStatus::Pending)
        || scope.role == Role::DistrictVet;
    if !allowed {
        return Err(ApiError::Forbidden(
            "only the applicant (while pending) or a district admin may delete".into(),
        ));
    }

    repository::delete_license_application(&conn, &application_id)?;
    Ok(Json(serde_json::json!({ "deleted": application_id })))
}
