use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::api::{create_router, AppState};
use crate::error::{PyramidError, Result};

/// Run the webhook server until ctrl-c
pub async fn start_webhook_server(state: AppState, host: &str, port: u16) -> Result<()> {
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| PyramidError::Validation(format!("invalid bind address {}:{}: {}", host, port, e)))?;

    let listener = TcpListener::bind(addr).await?;
    info!("webhook server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| PyramidError::Internal(format!("webhook server error: {}", e)))?;

    info!("webhook server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
