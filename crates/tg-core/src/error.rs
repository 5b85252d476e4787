//! Core error types for termgate

use std::path::PathBuf;

use thiserror::Error;
use tg_protocol::ProtocolError;

/// Errors arising while opening or driving a relay session.
///
/// Adapter-level failures are surfaced to the client as a single `error`
/// frame and end the session; they are never retried automatically.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Credentials were rejected by the remote host
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Remote host unreachable, or the connection attempt timed out
    #[error("Network error: {0}")]
    Network(String),

    /// Malformed frame or unexpected SSH-layer event
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The client-facing duplex transport failed
    #[error("Channel error: {0}")]
    Channel(String),
}

impl From<ProtocolError> for RelayError {
    fn from(err: ProtocolError) -> Self {
        RelayError::Protocol(err.to_string())
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
