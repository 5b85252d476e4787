//! Global gateway state

use std::sync::Arc;

use tg_core::config::GatewayConfig;
use tg_core::traits::ShellConnector;

use crate::session::SessionMap;

/// Global state for the relay gateway.
///
/// Owned by the listener and passed explicitly to every accepted channel;
/// the session map is the only mutable resource shared across sessions.
pub struct GatewayState {
    /// Configuration
    pub config: GatewayConfig,
    /// Active relay sessions, keyed by session ID
    pub sessions: SessionMap,
    /// Capability used to open remote shells
    pub connector: Arc<dyn ShellConnector>,
}

impl GatewayState {
    /// Create new gateway state
    pub fn new(config: GatewayConfig, connector: Arc<dyn ShellConnector>) -> Self {
        Self {
            config,
            sessions: SessionMap::new(),
            connector,
        }
    }
}
