//! WebSocket listener
//!
//! Binds the gateway's TCP endpoint and serves the relay upgrade path.
//! Anything outside that path is not ours: asset traffic is an external
//! collaborator's concern, so the router falls through to 404.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::server::ws;
use crate::state::GatewayState;

/// Shared state handed to the upgrade handler
#[derive(Clone)]
pub(crate) struct AppState {
    pub gateway: Arc<GatewayState>,
    pub cancel: CancellationToken,
}

/// Build the gateway router serving the configured relay path
pub fn router(gateway: Arc<GatewayState>, cancel: CancellationToken) -> Router {
    let relay_path = gateway.config.relay_path.clone();
    Router::new()
        .route(&relay_path, get(ws::upgrade))
        .with_state(AppState { gateway, cancel })
}

/// WebSocket server that accepts relay connections
pub struct WsServer {
    /// Shared gateway state
    gateway: Arc<GatewayState>,
    /// Cancellation token for graceful shutdown
    cancel: CancellationToken,
}

impl WsServer {
    /// Create a new server
    pub fn new(gateway: Arc<GatewayState>, cancel: CancellationToken) -> Self {
        Self { gateway, cancel }
    }

    /// Run the server until shutdown
    pub async fn run(&self) -> Result<()> {
        let bind_addr = &self.gateway.config.bind_address;
        let listener = TcpListener::bind(bind_addr)
            .await
            .with_context(|| format!("Failed to bind to {}", bind_addr))?;

        let local_addr = listener.local_addr()?;
        tracing::info!(
            "Relay gateway listening on {} (path {})",
            local_addr,
            self.gateway.config.relay_path
        );

        let app = router(Arc::clone(&self.gateway), self.cancel.clone());

        let cancel = self.cancel.clone();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { cancel.cancelled().await })
            .await
            .context("Gateway listener failed")?;

        tracing::info!("Relay gateway shut down");
        Ok(())
    }
}
