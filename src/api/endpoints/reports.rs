//! Report endpoints: submission, tiered review queues, verdicts,
//! resubmission, and deletion.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository;
use crate::models::enums::{ReportStatus, ReportType, Role};
use crate::models::Report;
use crate::review::{self, ReviewTier};
use crate::scope::ScopeDescriptor;

#[derive(Deserialize)]
pub struct CreateReportRequest {
    pub title: String,
    pub content: String,
    pub report_type: ReportType,
    pub attachment_ref: Option<String>,
}

/// `POST /api/v1/reports` — submit a report. It enters the review pipeline
/// as `pending`, tagged with the submitter's geography.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
    Json(req): Json<CreateReportRequest>,
) -> Result<Json<Report>, ApiError> {
    if req.title.trim().is_empty() || req.content.trim().is_empty() {
        return Err(ApiError::BadRequest("title and content are required".into()));
    }

    let now = Utc::now();
    let report = Report {
        id: Uuid::new_v4(),
        title: req.title,
        content: req.content,
        report_type: req.report_type,
        status: ReportStatus::Pending,
        submitter_id: scope.user_id,
        province: scope.province.clone(),
        district: scope.district.clone(),
        sector: scope.sector.clone(),
        sector_vet_notes: None,
        sector_reviewer_id: None,
        sector_reviewed_at: None,
        district_vet_notes: None,
        district_reviewer_id: None,
        district_reviewed_at: None,
        attachment_ref: req.attachment_ref,
        created_at: now,
        updated_at: now,
    };

    let conn = ctx.open_db()?;
    repository::insert_report(&conn, &report)?;
    Ok(Json(report))
}

/// `GET /api/v1/reports/mine`
pub async fn list_mine(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
) -> Result<Json<Vec<Report>>, ApiError> {
    let conn = ctx.open_db()?;
    Ok(Json(repository::list_reports_by_submitter(&conn, &scope.user_id)?))
}

/// `GET /api/v1/reports/all-sector-vet-reports` — the sector reviewer's
/// queue: every report tagged with their sector.
pub async fn list_sector_queue(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
) -> Result<Json<Vec<Report>>, ApiError> {
    if scope.role != Role::SectorVet {
        return Err(ApiError::Forbidden("sector reviewers only".into()));
    }
    let conn = ctx.open_db()?;
    Ok(Json(repository::list_reports_by_sector(&conn, &scope.sector)?))
}

/// `GET /api/v1/reports/district` — the district reviewer's queue.
pub async fn list_district_queue(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
) -> Result<Json<Vec<Report>>, ApiError> {
    if scope.role != Role::DistrictVet {
        return Err(ApiError::Forbidden("district reviewers only".into()));
    }
    let conn = ctx.open_db()?;
    Ok(Json(repository::list_reports_by_district(&conn, &scope.district)?))
}

#[derive(Deserialize)]
pub struct ReviewRequest {
    pub status: ReportStatus,
    pub notes: Option<String>,
}

/// `PATCH /api/v1/reports/:id/sector-review`
pub async fn sector_review(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
    Path(report_id): Path<Uuid>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<Report>, ApiError> {
    apply_review(&ctx, &scope, &report_id, ReviewTier::Sector, req)
}

/// `PATCH /api/v1/reports/:id/district-review`
pub async fn district_review(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
    Path(report_id): Path<Uuid>,
    Json(req): Json<ReviewRequest>,
) -> Result<Json<Report>, ApiError> {
    apply_review(&ctx, &scope, &report_id, ReviewTier::District, req)
}

fn apply_review(
    ctx: &ApiContext,
    scope: &ScopeDescriptor,
    report_id: &Uuid,
    tier: ReviewTier,
    req: ReviewRequest,
) -> Result<Json<Report>, ApiError> {
    let mut conn = ctx.open_db()?;
    let report = review::review_report(
        &mut conn,
        report_id,
        scope,
        tier,
        req.status,
        req.notes.as_deref(),
    )?;
    Ok(Json(report))
}

#[derive(Deserialize)]
pub struct ResubmitRequest {
    pub title: String,
    pub content: String,
}

/// `PATCH /api/v1/reports/:id` — submitter resubmission from
/// `requires_revision`.
pub async fn resubmit(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
    Path(report_id): Path<Uuid>,
    Json(req): Json<ResubmitRequest>,
) -> Result<Json<Report>, ApiError> {
    if req.title.trim().is_empty() || req.content.trim().is_empty() {
        return Err(ApiError::BadRequest("title and content are required".into()));
    }
    let mut conn = ctx.open_db()?;
    let report = review::resubmit_report(&mut conn, &report_id, &scope, &req.title, &req.content)?;
    Ok(Json(report))
}

/// `DELETE /api/v1/reports/:id` — submitter only, rejected reports only.
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
    Path(report_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut conn = ctx.open_db()?;
    review::delete_report(&mut conn, &report_id, &scope)?;
    Ok(Json(serde_json::json!({ "deleted": report_id })))
}
