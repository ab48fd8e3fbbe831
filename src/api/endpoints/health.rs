//! `GET /api/v1/health` — liveness probe.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub schema_version: i64,
    pub time: String,
}

pub async fn check(State(ctx): State<ApiContext>) -> Result<Json<HealthResponse>, ApiError> {
    let conn = ctx.open_db()?;
    let schema_version = crate::db::get_current_version(&conn);
    Ok(Json(HealthResponse {
        status: "ok",
        schema_version,
        time: chrono::Utc::now().to_rfc3339(),
    }))
}
