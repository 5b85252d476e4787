//! Router-level tests: only the configured relay path accepts upgrades

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use tg_core::config::GatewayConfig;
use tg_core::error::RelayError;
use tg_core::traits::{ShellChannel, ShellConnector};
use tg_core::types::Target;
use tg_gateway::server::router;
use tg_gateway::GatewayState;
use tg_protocol::{AuthMethod, TerminalSize};

/// Connector that must never be reached from these tests
struct NullConnector;

#[async_trait]
impl ShellConnector for NullConnector {
    async fn open(
        &self,
        _target: &Target,
        _auth: &AuthMethod,
        _size: TerminalSize,
    ) -> Result<ShellChannel, RelayError> {
        panic!("Router tests must not open shells");
    }
}

fn test_router() -> axum::Router {
    let state = Arc::new(GatewayState::new(
        GatewayConfig::default(),
        Arc::new(NullConnector),
    ));
    router(state, CancellationToken::new())
}

#[tokio::test]
async fn test_non_relay_path_is_not_found() {
    let app = test_router();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/assets/app.js")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_relay_path_requires_upgrade_headers() {
    let app = test_router();

    // Plain GET without the WebSocket handshake headers is rejected.
    let response = app
        .oneshot(
            Request::builder()
                .uri("/ws/ssh")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn test_relay_path_follows_config() {
    let config = GatewayConfig {
        relay_path: "/bridge".to_string(),
        ..GatewayConfig::default()
    };
    let state = Arc::new(GatewayState::new(config, Arc::new(NullConnector)));
    let app = router(state, CancellationToken::new());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/ws/ssh")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    // The default path is no longer routed once the config moves it.
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
