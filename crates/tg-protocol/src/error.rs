//! Protocol error types

use thiserror::Error;

/// Errors that can occur while parsing or validating control frames
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Frame payload is not valid UTF-8
    #[error("Frame is not valid UTF-8")]
    NotUtf8,

    /// Frame is not a well-formed control message
    #[error("Malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Connect frame carries neither a password nor a private key
    #[error("Connect frame must supply a password or a private key")]
    MissingAuth,

    /// Connect frame carries both a password and a private key
    #[error("Connect frame must supply only one of password and private key")]
    AmbiguousAuth,
}
