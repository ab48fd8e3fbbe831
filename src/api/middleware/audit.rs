//! Audit logging middleware.
//!
//! Logs every request with actor, method, path, and response status, and
//! appends a best-effort row to the `audit_log` table. Runs innermost,
//! after auth has injected the `ScopeDescriptor`.

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use rusqlite::params;

use crate::api::types::ApiContext;
use crate::scope::ScopeDescriptor;

pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    let ctx = req.extensions().get::<ApiContext>().cloned();
    let actor = req
        .extensions()
        .get::<ScopeDescriptor>()
        .map(|s| s.user_id.to_string())
        .unwrap_or_else(|| "anonymous".to_string());

    let response = next.run(req).await;
    let status = response.status().as_u16();

    tracing::info!(%actor, %method, %path, status, "api access");

    // Audit persistence never fails the request
    if let Some(ctx) = ctx {
        if let Ok(conn) = ctx.open_db() {
            let _ = conn.execute(
                "INSERT INTO audit_log (actor, action, detail) VALUES (?1, ?2, ?3)",
                params![actor, format!("{method} {path}"), format!("status:{status}")],
            );
        }
    }

    response
}
