use tracing_subscriber::EnvFilter;

use vetreg::api::server::start_server;
use vetreg::config::{self, Config};

#[tokio::main]
async fn main() -> Result<(), String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("vetreg starting v{}", config::APP_VERSION);

    let config = Config::from_env()?;
    tracing::info!(addr = %config.addr, db = %config.db_path.display(), "configuration loaded");

    let mut server = start_server(config.addr, config.db_path).await?;

    tokio::signal::ctrl_c()
        .await
        .map_err(|e| format!("Failed to listen for shutdown signal: {e}"))?;
    tracing::info!("shutdown requested");
    server.shutdown();

    Ok(())
}
