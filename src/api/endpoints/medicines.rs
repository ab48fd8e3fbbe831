//! Medicine endpoints, including the stock ledger routes.

use axum::extract::{Path, State};
use axum::{Extension, Json};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::stock_feed::StockEvent;
use crate::api::types::ApiContext;
use crate::db::repository::{self, MedicineUpdate};
use crate::ledger;
use crate::models::enums::MovementType;
use crate::models::{Medicine, StockMovement};
use crate::scope::ScopeDescriptor;

#[derive(Deserialize)]
pub struct CreateMedicineRequest {
    pub name: String,
    pub description: Option<String>,
    pub unit: String,
    pub total_stock: i64,
    pub expiry_date: Option<NaiveDate>,
}

/// `POST /api/v1/medicines` — register a medicine with an opening balance.
pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
    Json(req): Json<CreateMedicineRequest>,
) -> Result<Json<Medicine>, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("name is required".into()));
    }
    if req.total_stock < 0 {
        return Err(ApiError::BadRequest("total_stock must not be negative".into()));
    }

    let now = Utc::now();
    let medicine = Medicine {
        id: Uuid::new_v4(),
        name: req.name,
        description: req.description,
        unit: req.unit,
        total_stock: req.total_stock,
        current_stock: req.total_stock,
        stock_in: 0,
        stock_out: 0,
        expiry_date: req.expiry_date,
        veterinarian_id: scope.user_id,
        created_at: now,
        updated_at: now,
    };

    let conn = ctx.open_db()?;
    repository::insert_medicine(&conn, &medicine)?;
    Ok(Json(medicine))
}

/// `GET /api/v1/medicines` — the caller's own medicines.
pub async fn list_mine(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
) -> Result<Json<Vec<Medicine>>, ApiError> {
    let conn = ctx.open_db()?;
    Ok(Json(repository::list_medicines_by_vet(&conn, &scope.user_id)?))
}

/// `GET /api/v1/medicines/:id`
pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
    Path(medicine_id): Path<Uuid>,
) -> Result<Json<Medicine>, ApiError> {
    let conn = ctx.open_db()?;
    let medicine = fetch(&conn, &medicine_id)?;
    if !scope.owns_or_administers(&medicine.veterinarian_id) {
        return Err(ApiError::Forbidden("no scope over this medicine".into()));
    }
    Ok(Json(medicine))
}

#[derive(Deserialize, Default)]
pub struct UpdateMedicineRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub expiry_date: Option<NaiveDate>,
}

/// `PATCH /api/v1/medicines/:id` — descriptive fields only. The stock
/// counters are reachable only through the ledger routes.
pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
    Path(medicine_id): Path<Uuid>,
    Json(req): Json<UpdateMedicineRequest>,
) -> Result<Json<Medicine>, ApiError> {
    let conn = ctx.open_db()?;
    let medicine = fetch(&conn, &medicine_id)?;
    if !scope.owns(&medicine.veterinarian_id) {
        return Err(ApiError::Forbidden("only the owner may edit".into()));
    }

    repository::update_medicine_details(
        &conn,
        &medicine_id,
        &MedicineUpdate {
            name: req.name,
            description: req.description,
            unit: req.unit,
            expiry_date: req.expiry_date.map(|d| d.to_string()),
        },
    )?;
    Ok(Json(fetch(&conn, &medicine_id)?))
}

/// `DELETE /api/v1/medicines/:id` — owner or district admin; the movement
/// history cascades.
pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
    Path(medicine_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let conn = ctx.open_db()?;
    let medicine = fetch(&conn, &medicine_id)?;
    if !scope.owns_or_administers(&medicine.veterinarian_id) {
        return Err(ApiError::Forbidden(
            "only the owner or a district admin may delete".into(),
        ));
    }
    repository::delete_medicine(&conn, &medicine_id)?;
    Ok(Json(serde_json::json!({ "deleted": medicine_id })))
}

#[derive(Deserialize)]
pub struct StockRequest {
    pub quantity: i64,
}

#[derive(Serialize)]
pub struct StockResponse {
    pub medicine_id: Uuid,
    pub current_stock: i64,
}

/// `PATCH /api/v1/medicines/:id/stock-in`
pub async fn stock_in(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
    Path(medicine_id): Path<Uuid>,
    Json(req): Json<StockRequest>,
) -> Result<Json<StockResponse>, ApiError> {
    apply_movement(&ctx, &scope, &medicine_id, MovementType::StockIn, req.quantity)
}

/// `PATCH /api/v1/medicines/:id/stock-out` — rejected with 409 when the
/// requested quantity exceeds the current balance; nothing is written.
pub async fn stock_out(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
    Path(medicine_id): Path<Uuid>,
    Json(req): Json<StockRequest>,
) -> Result<Json<StockResponse>, ApiError> {
    apply_movement(&ctx, &scope, &medicine_id, MovementType::StockOut, req.quantity)
}

fn apply_movement(
    ctx: &ApiContext,
    scope: &ScopeDescriptor,
    medicine_id: &Uuid,
    movement_type: MovementType,
    quantity: i64,
) -> Result<Json<StockResponse>, ApiError> {
    let mut conn = ctx.open_db()?;
    let medicine = fetch(&conn, medicine_id)?;
    if !scope.owns(&medicine.veterinarian_id) {
        return Err(ApiError::Forbidden(
            "only the owner may move this stock".into(),
        ));
    }

    let balance = match movement_type {
        MovementType::StockIn => ledger::stock_in(&mut conn, medicine_id, quantity)?,
        MovementType::StockOut => ledger::stock_out(&mut conn, medicine_id, quantity)?,
    };

    ctx.publish_stock(StockEvent::new(*medicine_id, movement_type, quantity, balance));

    Ok(Json(StockResponse {
        medicine_id: *medicine_id,
        current_stock: balance,
    }))
}

/// `GET /api/v1/medicines/:id/movements` — the append-only movement log,
/// newest first.
pub async fn movements(
    State(ctx): State<ApiContext>,
    Extension(scope): Extension<ScopeDescriptor>,
    Path(medicine_id): Path<Uuid>,
) -> Result<Json<Vec<StockMovement>>, ApiError> {
    let conn = ctx.open_db()?;
    let medicine = fetch(&conn, &medicine_id)?;
    if !scope.owns_or_administers(&medicine.veterinarian_id) {
        return Err(ApiError::Forbidden("no scope over this medicine".into()));
    }
    Ok(Json(ledger::movements(&conn, &medicine_id)?))
}

fn fetch(conn: &rusqlite::Connection, id: &Uuid) -> Result<Medicine, ApiError> {
    repository::get_medicine(conn, id)?
        .ok_or_else(|| ApiError::NotFound(format!("medicine {id} not found")))
}
