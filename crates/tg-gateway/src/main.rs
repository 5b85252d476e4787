//! termgate relay gateway daemon
//!
//! Accepts browser WebSocket connections and bridges each one to an SSH
//! shell on the host named in its connect frame.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tg_core::config::{self, GatewayConfig};
use tg_gateway::server::WsServer;
use tg_gateway::ssh::RusshConnector;
use tg_gateway::GatewayState;

#[derive(Parser)]
#[command(name = "tg-gateway")]
#[command(about = "termgate WebSocket-to-SSH relay gateway")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address (overrides config)
    #[arg(short, long, env = "TERMGATE_BIND")]
    bind: Option<String>,

    /// Relay upgrade path (overrides config)
    #[arg(short, long, env = "TERMGATE_PATH")]
    path: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| args.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("termgate gateway starting...");

    // Load configuration
    let mut gateway_config = if let Some(config_path) = &args.config {
        config::load_config(config_path)
            .with_context(|| format!("Failed to load config from {:?}", config_path))?
    } else {
        let default_path = config::default_config_path();
        if default_path.exists() {
            config::load_config(&default_path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {:?}: {}", default_path, e);
                GatewayConfig::default()
            })
        } else {
            tracing::info!("Using default configuration");
            GatewayConfig::default()
        }
    };

    // Flag/env overrides
    if let Some(bind) = args.bind {
        gateway_config.bind_address = bind;
    }
    if let Some(path) = args.path {
        gateway_config.relay_path = path;
    }

    let connector = Arc::new(RusshConnector::new(gateway_config.term.clone()));
    let state = Arc::new(GatewayState::new(gateway_config, connector));

    // Cancellation token for graceful shutdown
    let cancel = CancellationToken::new();

    // Setup signal handlers
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("failed to install signal handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received Ctrl+C, initiating shutdown...");
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM, initiating shutdown...");
            }
        }

        cancel_clone.cancel();
    });

    let server = WsServer::new(state, cancel);
    server.run().await?;

    tracing::info!("Gateway shutdown complete");
    Ok(())
}
