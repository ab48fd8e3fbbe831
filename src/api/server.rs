//! HTTP server lifecycle: bind → spawn background task → return a handle
//! with a shutdown channel.

use std::net::SocketAddr;
use std::path::PathBuf;

use tokio::sync::oneshot;

use crate::api::router::build_router;
use crate::api::types::ApiContext;

/// Handle to a running API server.
pub struct ApiServer {
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl ApiServer {
    /// Shut down the server gracefully. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }
}

/// Bind to `addr` and serve the API in a background task. Port 0 picks an
/// ephemeral port; the bound address is on the returned handle.
pub async fn start_server(addr: SocketAddr, db_path: PathBuf) -> Result<ApiServer, String> {
    // Open once up front so migration failures surface at startup, not on
    // the first request.
    crate::db::open_database(&db_path).map_err(|e| format!("Failed to open database: {e}"))?;
    start_server_with_ctx(addr, ApiContext::new(db_path)).await
}

/// Server lifecycle over a pre-built context. Used by tests that need
/// direct access to the session store or the stock feed sender.
pub async fn start_server_with_ctx(
    addr: SocketAddr,
    ctx: ApiContext,
) -> Result<ApiServer, String> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| format!("Failed to bind API server on {addr}: {e}"))?;
    let addr = listener
        .local_addr()
        .map_err(|e| format!("Failed to get server address: {e}"))?;

    let app = build_router(ctx);
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        tracing::info!(%addr, "API server started");

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        addr,
        shutdown_tx: Some(shutdown_tx),
    })
}
