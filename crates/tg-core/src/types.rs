//! Core domain types

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a relay session.
///
/// Opaque, unique per duplex channel; never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generate a fresh session ID
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// The remote endpoint of a relay session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    /// Remote host
    pub host: String,
    /// SSH port
    pub port: u16,
    /// Login user
    pub username: String,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.username, self.host, self.port)
    }
}

/// Relay session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    /// Waiting for the initial connect frame
    AwaitingConnect = 0,
    /// SSH session is being established
    Connecting = 1,
    /// Shell is ready; I/O flows in both directions
    Active = 2,
    /// Session ended; terminal state
    Closed = 3,
}

impl SessionState {
    /// Convert to u8
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// Convert from u8
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::AwaitingConnect),
            1 => Some(Self::Connecting),
            2 => Some(Self::Active),
            3 => Some(Self::Closed),
            _ => None,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::AwaitingConnect => write!(f, "awaiting-connect"),
            SessionState::Connecting => write!(f, "connecting"),
            SessionState::Active => write!(f, "active"),
            SessionState::Closed => write!(f, "closed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_ids_are_unique() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_target_display() {
        let target = Target {
            host: "example.com".to_string(),
            port: 2222,
            username: "deploy".to_string(),
        };
        assert_eq!(format!("{}", target), "deploy@example.com:2222");
    }

    #[test]
    fn test_session_state_display() {
        assert_eq!(format!("{}", SessionState::Active), "active");
        assert_eq!(format!("{}", SessionState::Closed), "closed");
    }

    #[test]
    fn test_session_state_roundtrip() {
        for state in [
            SessionState::AwaitingConnect,
            SessionState::Connecting,
            SessionState::Active,
            SessionState::Closed,
        ] {
            assert_eq!(SessionState::from_u8(state.as_u8()), Some(state));
        }
        assert_eq!(SessionState::from_u8(0xFF), None);
    }
}
