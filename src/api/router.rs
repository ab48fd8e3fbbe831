//! API router.
//!
//! Everything is mounted under `/api/v1`. Public routes: register, login,
//! health. Everything else requires a bearer session.
//!
//! Middleware uses `Extension<ApiContext>` (injected as the outermost
//! layer). Endpoint handlers use `State<ApiContext>` (via `with_state`).

use std::path::PathBuf;

use axum::routing::{delete, get, patch, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::api::endpoints;
use crate::api::middleware;
use crate::api::stock_feed;
use crate::api::types::ApiContext;

pub fn api_router(db_path: PathBuf) -> Router {
    build_router(ApiContext::new(db_path))
}

/// Build the router from a pre-constructed context. Used by the server
/// lifecycle and by tests that need direct access to the session store.
pub fn build_router(ctx: ApiContext) -> Router {
    // Layers apply bottom-up: Extension (outermost) → auth → audit → handler
    let protected = Router::new()
        .route("/patients", post(endpoints::patients::create).get(endpoints::patients::list_mine))
        .route("/patients/sector/:sector", get(endpoints::patients::list_sector))
        .route("/patients/district/:district", get(endpoints::patients::list_district))
        .route(
            "/patients/:id",
            get(endpoints::patients::detail)
                .patch(endpoints::patients::update)
                .delete(endpoints::patients::remove),
        )
        .route("/medicines", post(endpoints::medicines::create).get(endpoints::medicines::list_mine))
        .route(
            "/medicines/:id",
            get(endpoints::medicines::detail)
                .patch(endpoints::medicines::update)
                .delete(endpoints::medicines::remove),
        )
        .route("/medicines/:id/stock-in", patch(endpoints::medicines::stock_in))
        .route("/medicines/:id/stock-out", patch(endpoints::medicines::stock_out))
        .route("/medicines/:id/movements", get(endpoints::medicines::movements))
        .route("/treatments", post(endpoints::treatments::create).get(endpoints::treatments::list_mine))
        .route(
            "/treatments/patient/:patient_id",
            get(endpoints::treatments::list_for_patient),
        )
        .route("/reports", post(endpoints::reports::create))
        .route("/reports/mine", get(endpoints::reports::list_mine))
        .route(
            "/reports/all-sector-vet-reports",
            get(endpoints::reports::list_sector_queue),
        )
        .route("/reports/district", get(endpoints::reports::list_district_queue))
        .route("/reports/:id/sector-review", patch(endpoints::reports::sector_review))
        .route("/reports/:id/district-review", patch(endpoints::reports::district_review))
        .route(
            "/reports/:id",
            patch(endpoints::reports::resubmit).delete(endpoints::reports::remove),
        )
        .route(
            "/license-applications",
            post(endpoints::licenses::create).get(endpoints::licenses::list_all),
        )
        .route("/license-applications/mine", get(endpoints::licenses::list_mine))
        .route(
            "/license-applications/:id/status",
            patch(endpoints::licenses::decide),
        )
        .route(
            "/license-applications/:id",
            patch(endpoints::licenses::resubmit).delete(endpoints::licenses::remove),
        )
        .route("/registrations", get(endpoints::auth::pending))
        .route("/register/:id/approve", patch(endpoints::auth::decide))
        .route("/register/:id", delete(endpoints::auth::remove))
        .route("/ws/stock", get(stock_feed::ws_upgrade))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::require_auth))
        .layer(axum::Extension(ctx.clone()));

    let public = Router::new()
        .route("/register", post(endpoints::auth::register))
        .route("/login", post(endpoints::auth::login))
        .route("/health", get(endpoints::health::check))
        .with_state(ctx.clone())
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::Extension(ctx));

    Router::new()
        .nest("/api/v1", public)
        .nest("/api/v1", protected)
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use uuid::Uuid;

    use crate::db::repository;
    use crate::models::enums::{ApprovalStatus, Role};
    use crate::scope::ScopeDescriptor;

    /// Router over a fresh tempfile database. The tempdir guard must stay
    /// alive for the duration of the test.
    fn test_router() -> (Router, ApiContext, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        let db_path = tmp.path().join("vetreg.db");
        // Run migrations up front so seeding can use the connection directly
        crate::db::open_database(&db_path).unwrap();
        let ctx = ApiContext::new(db_path);
        (build_router(ctx.clone()), ctx, tmp)
    }

    /// Seed an approved user and issue a bearer token for them directly,
    /// bypassing the login handler's key stretching.
    fn seeded_session(ctx: &ApiContext, role: Role, sector: &str, district: &str) -> (Uuid, String) {
        let conn = ctx.open_db().unwrap();
        let user = crate::testutil::seed_user(&conn, role, sector, district);
        let token = ctx
            .sessions
            .lock()
            .unwrap()
            .issue(ScopeDescriptor::from_user(&user));
        (user.id, token)
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn send_json(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let (router, _ctx, _tmp) = test_router();
        let response = router.oneshot(get("/api/v1/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["schema_version"], 2);
    }

    #[tokio::test]
    async fn protected_routes_require_a_valid_token() {
        let (router, _ctx, _tmp) = test_router();

        let response = router
            .clone()
            .oneshot(get("/api/v1/patients", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["error"]["code"], "AUTH_REQUIRED");

        let response = router
            .oneshot(get("/api/v1/patients", Some("bogus-token")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let (router, _ctx, _tmp) = test_router();
        let response = router.oneshot(get("/api/v1/nonexistent", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn registration_approval_login_flow() {
        let (router, ctx, _tmp) = test_router();

        let response = router
            .clone()
            .oneshot(send_json(
                "POST",
                "/api/v1/register",
                None,
                json!({
                    "full_name": "Jeanette Uwase",
                    "email": "uwase@vet.rw",
                    "password": "correct horse battery",
                    "role": "basic_vet",
                    "province": "South",
                    "district": "Huye",
                    "sector": "Ngoma"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let user = body_json(response).await;
        assert_eq!(user["approval_status"], "pending");
        // Password hash must never leave the server
        assert!(user.get("password_hash").is_none());

        // Pending account cannot log in
        let login = json!({ "email": "uwase@vet.rw", "password": "correct horse battery" });
        let response = router
            .clone()
            .oneshot(send_json("POST", "/api/v1/login", None, login.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // Approve out-of-band
        let user_id = Uuid::parse_str(user["id"].as_str().unwrap()).unwrap();
        let conn = ctx.open_db().unwrap();
        repository::set_approval_status(&conn, &user_id, ApprovalStatus::Approved).unwrap();

        let response = router
            .clone()
            .oneshot(send_json("POST", "/api/v1/login", None, login))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let session = body_json(response).await;
        let token = session["token"].as_str().unwrap().to_string();

        // The token opens protected routes
        let response = router
            .oneshot(get("/api/v1/patients", Some(&token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn stock_ledger_over_http() {
        let (router, ctx, _tmp) = test_router();
        let (_vet_id, token) = seeded_session(&ctx, Role::BasicVet, "Ngoma", "Huye");

        let response = router
            .clone()
            .oneshot(send_json(
                "POST",
                "/api/v1/medicines",
                Some(&token),
                json!({ "name": "Oxytetracycline", "unit": "ml", "total_stock": 50 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let medicine = body_json(response).await;
        let id = medicine["id"].as_str().unwrap().to_string();
        assert_eq!(medicine["current_stock"], 50);

        let response = router
            .clone()
            .oneshot(send_json(
                "PATCH",
                &format!("/api/v1/medicines/{id}/stock-in"),
                Some(&token),
                json!({ "quantity": 20 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["current_stock"], 70);

        // Overdraw is refused with 409 and no mutation
        let response = router
            .clone()
            .oneshot(send_json(
                "PATCH",
                &format!("/api/v1/medicines/{id}/stock-out"),
                Some(&token),
                json!({ "quantity": 80 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(response).await["error"]["code"], "INVALID_STATE");

        let response = router
            .clone()
            .oneshot(send_json(
                "PATCH",
                &format!("/api/v1/medicines/{id}/stock-out"),
                Some(&token),
                json!({ "quantity": 70 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["current_stock"], 0);

        // Two movements in the log
        let response = router
            .oneshot(get(&format!("/api/v1/medicines/{id}/movements"), Some(&token)))
            .await
            .unwrap();
        let movements = body_json(response).await;
        assert_eq!(movements.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn review_pipeline_over_http() {
        let (router, ctx, _tmp) = test_router();
        let (_vet, vet_token) = seeded_session(&ctx, Role::BasicVet, "Ngoma", "Huye");
        let (_sector, sector_token) = seeded_session(&ctx, Role::SectorVet, "Ngoma", "Huye");

        let response = router
            .clone()
            .oneshot(send_json(
                "POST",
                "/api/v1/reports",
                Some(&vet_token),
                json!({
                    "title": "Monthly activity",
                    "content": "Vaccinated 40 cattle.",
                    "report_type": "monthly"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let report = body_json(response).await;
        let id = report["id"].as_str().unwrap().to_string();

        // The submitter cannot run a sector review
        let verdict = json!({ "status": "requires_revision", "notes": "add counts" });
        let response = router
            .clone()
            .oneshot(send_json(
                "PATCH",
                &format!("/api/v1/reports/{id}/sector-review"),
                Some(&vet_token),
                verdict.clone(),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = router
            .clone()
            .oneshot(send_json(
                "PATCH",
                &format!("/api/v1/reports/{id}/sector-review"),
                Some(&sector_token),
                verdict,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "requires_revision");

        // Resubmit and confirm the earlier notes survive
        let response = router
            .clone()
            .oneshot(send_json(
                "PATCH",
                &format!("/api/v1/reports/{id}"),
                Some(&vet_token),
                json!({ "title": "Monthly activity (rev 2)", "content": "Vaccinated 44 cattle." }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let resubmitted = body_json(response).await;
        assert_eq!(resubmitted["status"], "pending");
        assert_eq!(resubmitted["sector_vet_notes"], "add counts");

        // A second review of the approved report is an invalid transition
        let response = router
            .clone()
            .oneshot(send_json(
                "PATCH",
                &format!("/api/v1/reports/{id}/sector-review"),
                Some(&sector_token),
                json!({ "status": "approved" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(send_json(
                "PATCH",
                &format!("/api/v1/reports/{id}/sector-review"),
                Some(&sector_token),
                json!({ "status": "rejected" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn role_gates_on_queue_routes() {
        let (router, ctx, _tmp) = test_router();
        let (_vet, vet_token) = seeded_session(&ctx, Role::BasicVet, "Ngoma", "Huye");
        let (_admin, admin_token) = seeded_session(&ctx, Role::DistrictVet, "Tumba", "Huye");

        let response = router
            .clone()
            .oneshot(get("/api/v1/reports/district", Some(&vet_token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = router
            .clone()
            .oneshot(get("/api/v1/reports/district", Some(&admin_token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = router
            .oneshot(get("/api/v1/registrations", Some(&admin_token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn license_decision_assigns_number() {
        let (router, ctx, _tmp) = test_router();
        let (_vet, vet_token) = seeded_session(&ctx, Role::BasicVet, "Ngoma", "Huye");
        let (_admin, admin_token) = seeded_session(&ctx, Role::DistrictVet, "Tumba", "Huye");

        let response = router
            .clone()
            .oneshot(send_json(
                "POST",
                "/api/v1/license-applications",
                Some(&vet_token),
                json!({ "license_type": "basic_practice", "specialization": "poultry" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let app = body_json(response).await;
        let id = app["id"].as_str().unwrap().to_string();
        assert_eq!(app["fee_rwf"], 25_000, "basic practice tier fee");

        let response = router
            .clone()
            .oneshot(send_json(
                "PATCH",
                &format!("/api/v1/license-applications/{id}/status"),
                Some(&admin_token),
                json!({ "status": "approved", "notes": "verified" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let decided = body_json(response).await;
        let number = decided["license_number"].as_str().unwrap();
        assert!(number.starts_with("RVC-"), "got {number}");

        // Field vets cannot decide applications
        let response = router
            .oneshot(send_json(
                "PATCH",
                &format!("/api/v1/license-applications/{id}/status"),
                Some(&vet_token),
                json!({ "status": "rejected" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn sector_listing_scope_is_enforced() {
        let (router, ctx, _tmp) = test_router();
        let (_sector, sector_token) = seeded_session(&ctx, Role::SectorVet, "Ngoma", "Huye");

        // Own sector: allowed
        let response = router
            .clone()
            .oneshot(get("/api/v1/patients/sector/Ngoma", Some(&sector_token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // Someone else's sector: forbidden, not an empty 200
        let response = router
            .oneshot(get("/api/v1/patients/sector/Kigombe", Some(&sector_token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn district_vet_cannot_read_foreign_sector_listing() {
        let (router, ctx, _tmp) = test_router();
        let (_vet, vet_token) = seeded_session(&ctx, Role::BasicVet, "Ngoma", "Huye");
        let (_admin, admin_token) = seeded_session(&ctx, Role::DistrictVet, "Muhoza", "Musanze");

        // A patient registered in Ngoma sector, Huye district
        let response = router
            .clone()
            .oneshot(send_json(
                "POST",
                "/api/v1/patients",
                Some(&vet_token),
                json!({
                    "animal_name": "Inka",
                    "species": "cattle",
                    "owner_name": "M. Nkurunziza",
                    "province": "South",
                    "district": "Huye",
                    "sector": "Ngoma"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // A Musanze district reviewer has no claim on a Huye sector
        let response = router
            .clone()
            .oneshot(get("/api/v1/patients/sector/Ngoma", Some(&admin_token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        // Their own district route stays open and excludes the Huye patient
        let response = router
            .oneshot(get("/api/v1/patients/district/Musanze", Some(&admin_token)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!([]));
    }
}
