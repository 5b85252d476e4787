//! Gateway configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the relay gateway daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address to bind the WebSocket listener to
    pub bind_address: String,

    /// Upgrade path that distinguishes relay traffic from asset traffic
    pub relay_path: String,

    /// Bound on SSH connection attempts; expiry yields a network error
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,

    /// Maximum number of concurrent relay sessions
    pub max_sessions: Option<u32>,

    /// Terminal type requested for the remote pseudo-terminal
    pub term: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8081".to_string(),
            relay_path: "/ws/ssh".to_string(),
            connect_timeout: Duration::from_secs(15),
            max_sessions: None,
            term: "xterm-256color".to_string(),
        }
    }
}

// Helper module for Duration serialization as whole seconds
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
