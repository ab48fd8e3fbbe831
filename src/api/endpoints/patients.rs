//! Patient (animal) endpoints.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::db::repository::{self, PatientUpdate};
use crate::models::Patient;
use crate::scope::ScopeDescriptor;

#[derive(Deserialize)]
pub struct CreatePatientRequest {
    pub animal_name: String,
    pub species: String,
    pub breed: Option<String>,
    pub age_months: Option<i32>,
    pub owner_name: String,
    pub owner_phone: Option<String>,
    pub province: String,
    pub district: String,
    pub sector: String,
    pub cell: Option<String>,
    pub village: Option<String>,
    pub prior_conditions: Option<String>,
}

/// `POST /api/v1/patients` — register an animal under the calling vet.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
    Json(req): Json<CreatePatientRequest>,
) -> Result<Json<Patient>, ApiError> {
    if req.animal_name.trim().is_empty() || req.species.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "animal_name and species are required".into(),
        ));
    }

    let now = Utc::now();
    let patient = Patient {
        id: Uuid::new_v4(),
        animal_name: req.animal_name,
        species: req.species,
        breed: req.breed,
        age_months: req.age_months,
        owner_name: req.owner_name,
        owner_phone: req.owner_phone,
        province: req.province,
        district: req.district,
        sector: req.sector,
        cell: req.cell,
        village: req.village,
        prior_conditions: req.prior_conditions,
        veterinarian_id: scope.user_id,
        created_at: now,
        updated_at: now,
    };

    let conn = ctx.open_db()?;
    repository::insert_patient(&conn, &patient)?;
    Ok(Json(patient))
}

/// `GET /api/v1/patients` — the calling vet's own patients.
pub async fn list_mine(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    let conn = ctx.open_db()?;
    Ok(Json(repository::list_patients_by_vet(&conn, &scope.user_id)?))
}

/// `GET /api/v1/patients/sector/:sector` — sector-wide view for reviewers.
pub async fn list_sector(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
    Path(sector): Path<String>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    if !scope.can_view_sector(&sector) {
        return Err(ApiError::Forbidden("no review scope over this sector".into()));
    }
    let conn = ctx.open_db()?;
    Ok(Json(repository::list_patients_by_sector(&conn, &sector)?))
}

/// `GET /api/v1/patients/district/:district` — district-wide view.
pub async fn list_district(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
    Path(district): Path<String>,
) -> Result<Json<Vec<Patient>>, ApiError> {
    if !scope.can_view_district(&district) {
        return Err(ApiError::Forbidden(
            "no review scope over this district".into(),
        ));
    }
    let conn = ctx.open_db()?;
    Ok(Json(repository::list_patients_by_district(&conn, &district)?))
}

/// `GET /api/v1/patients/:id` — owner or a reviewer covering the patient's
/// geography.
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<Patient>, ApiError> {
    let conn = ctx.open_db()?;
    let patient = fetch(&conn, &patient_id)?;
    if !scope.owns(&patient.veterinarian_id)
        && !scope.can_view_sector(&patient.sector)
        && !scope.can_view_district(&patient.district)
    {
        return Err(ApiError::Forbidden("no scope over this patient".into()));
    }
    Ok(Json(patient))
}

#[derive(Deserialize, Default)]
pub struct UpdatePatientRequest {
    pub animal_name: Option<String>,
    pub breed: Option<String>,
    pub age_months: Option<i32>,
    pub owner_name: Option<String>,
    pub owner_phone: Option<String>,
    pub prior_conditions: Option<String>,
}

/// `PATCH /api/v1/patients/:id` — owning vet only; partial update.
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
    Path(patient_id): Path<Uuid>,
    Json(req): Json<UpdatePatientRequest>,
) -> Result<Json<Patient>, ApiError> {
    let conn = ctx.open_db()?;
    let patient = fetch(&conn, &patient_id)?;
    if !scope.owns(&patient.veterinarian_id) {
        return Err(ApiError::Forbidden("only the owning vet may edit".into()));
    }

    repository::update_patient(
        &conn,
        &patient_id,
        &PatientUpdate {
            animal_name: req.animal_name,
            breed: req.breed,
            age_months: req.age_months,
            owner_name: req.owner_name,
            owner_phone: req.owner_phone,
            prior_conditions: req.prior_conditions,
        },
    )?;
    Ok(Json(fetch(&conn, &patient_id)?))
}

/// `DELETE /api/v1/patients/:id` — owner or district admin; treatments
/// cascade.
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = ctx.open_db()?;
    let patient = fetch(&conn, &patient_id)?;
    if !scope.owns_or_administers(&patient.veterinarian_id) {
        return Err(ApiError::Forbidden(
            "only the owning vet or a district admin may delete".into(),
        ));
    }
    repository::delete_patient(&conn, &patient_id)?;
    Ok(Json(serde_json::json!({ "deleted": patient_id })))
}

fn fetch(conn: &rusqlite::Connection, id: &Uuid) -> Result<Patient, ApiError> {
    repository::get_patient(conn, id)?
        .ok_or_else(|| ApiError::NotFound(format!("patient {id} not found")))
}
