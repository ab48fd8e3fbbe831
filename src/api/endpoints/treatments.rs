//! Treatment endpoints. Treatments are append-oriented: created by the
//! treating vet, listed, never edited.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository;
use crate::models::Treatment;
use crate::scope::ScopeDescriptor;

#[derive(Deserialize)]
pub struct CreateTreatmentRequest {
    pub patient_id: Uuid,
    pub treatment_date: NaiveDate,
    pub diagnosis: String,
    pub notes: Option<String>,
    pub medicines: Option<String>,
}

/// `POST /api/v1/treatments` — record an intervention on a patient the
/// caller owns.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
    Json(req): Json<CreateTreatmentRequest>,
) -> Result<Json<Treatment>, ApiError> {
    if req.diagnosis.trim().is_empty() {
        return Err(ApiError::BadRequest("diagnosis is required".into()));
    }

    let conn = ctx.open_db()?;
    let patient = repository::get_patient(&conn, &req.patient_id)?
        .ok_or_else(|| ApiError::NotFound(format!("patient {} not found", req.patient_id)))?;
    if !scope.owns(&patient.veterinarian_id) {
        return Err(ApiError::Forbidden(
            "only the patient's vet may record treatments".into(),
        ));
    }

    let treatment = Treatment {
        id: Uuid::new_v4(),
        patient_id: req.patient_id,
        veterinarian_id: scope.user_id,
        treatment_date: req.treatment_date,
        diagnosis: req.diagnosis,
        notes: req.notes,
        medicines: req.medicines,
        created_at: Utc::now(),
    };
    repository::insert_treatment(&conn, &treatment)?;
    Ok(Json(treatment))
}

/// `GET /api/v1/treatments` — the caller's own treatment records.
pub async fn list_mine(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
) -> Result<Json<Vec<Treatment>>, ApiError> {
    let conn = ctx.open_db()?;
    Ok(Json(repository::list_treatments_by_vet(&conn, &scope.user_id)?))
}

/// `GET /api/v1/treatments/patient/:patient_id` — a patient's history, for
/// the owner or a reviewer covering its geography.
pub async fn list_for_patient(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Vec<Treatment>>, ApiError> {
    let conn = ctx.open_db()?;
    let patient = repository::get_patient(&conn, &patient_id)?
        .ok_or_else(|| ApiError::NotFound(format!("patient {patient_id} not found")))?;
    if !scope.owns(&patient.veterinarian_id)
        && !scope.can_view_sector(&patient.sector)
        && !scope.can_view_district(&patient.district)
    {
        return Err(ApiError::Forbidden("no scope over this patient".into()));
    }
    Ok(Json(repository::list_treatments_by_patient(&conn, &patient_id)?))
}
