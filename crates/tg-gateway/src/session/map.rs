//! Session map and per-session handles

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use tg_core::types::{SessionId, SessionState, Target};

/// Tracks all active relay sessions.
///
/// Insertions happen when a channel is accepted, removals when its session
/// reaches `Closed`; both may race across sessions' teardown paths, so the
/// map synchronizes internally.
pub struct SessionMap {
    sessions: DashMap<SessionId, Arc<SessionHandle>>,
}

impl SessionMap {
    /// Create an empty session map
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Register a session
    pub fn insert(&self, handle: Arc<SessionHandle>) {
        self.sessions.insert(handle.id, handle);
    }

    /// Remove a session; returns the handle if it was present
    pub fn remove(&self, id: &SessionId) -> Option<Arc<SessionHandle>> {
        self.sessions.remove(id).map(|(_, handle)| handle)
    }

    /// Get a session by ID
    pub fn get(&self, id: &SessionId) -> Option<Arc<SessionHandle>> {
        self.sessions.get(id).map(|r| Arc::clone(&r))
    }

    /// Number of active sessions
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle to one active relay session.
///
/// Shared between the session task and the map; everything here is
/// observability state, the session task owns the actual channels.
pub struct SessionHandle {
    /// Session ID
    pub id: SessionId,
    /// Lifecycle state
    state: AtomicU8,
    /// Remote endpoint, set once the connect frame is parsed
    target: OnceLock<Target>,
    /// Bytes written toward the remote shell
    bytes_to_shell: AtomicU64,
    /// Bytes forwarded back to the client
    bytes_to_client: AtomicU64,
}

impl SessionHandle {
    /// Create a handle in the initial state with a fresh ID
    pub fn new() -> Self {
        Self {
            id: SessionId::generate(),
            state: AtomicU8::new(SessionState::AwaitingConnect.as_u8()),
            target: OnceLock::new(),
            bytes_to_shell: AtomicU64::new(0),
            bytes_to_client: AtomicU64::new(0),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst)).unwrap_or(SessionState::Closed)
    }

    /// Advance the lifecycle state
    pub fn set_state(&self, state: SessionState) {
        self.state.store(state.as_u8(), Ordering::SeqCst);
    }

    /// Record the remote endpoint; only the first call takes effect
    pub fn set_target(&self, target: Target) {
        let _ = self.target.set(target);
    }

    /// The remote endpoint, if the connect frame has been parsed
    pub fn target(&self) -> Option<&Target> {
        self.target.get()
    }

    /// Count bytes flowing toward the remote shell
    pub fn add_bytes_to_shell(&self, n: usize) {
        self.bytes_to_shell.fetch_add(n as u64, Ordering::Relaxed);
    }

    /// Count bytes flowing back to the client
    pub fn add_bytes_to_client(&self, n: usize) {
        self.bytes_to_client.fetch_add(n as u64, Ordering::Relaxed);
    }

    /// Total bytes written toward the remote shell
    pub fn bytes_to_shell(&self) -> u64 {
        self.bytes_to_shell.load(Ordering::Relaxed)
    }

    /// Total bytes forwarded back to the client
    pub fn bytes_to_client(&self) -> u64 {
        self.bytes_to_client.load(Ordering::Relaxed)
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_remove() {
        let map = SessionMap::new();
        let handle = Arc::new(SessionHandle::new());
        let id = handle.id;

        map.insert(Arc::clone(&handle));
        assert_eq!(map.len(), 1);
        assert!(map.get(&id).is_some());

        let removed = map.remove(&id).unwrap();
        assert_eq!(removed.id, id);
        assert!(map.is_empty());
        assert!(map.remove(&id).is_none());
    }

    #[test]
    fn test_handle_state_transitions() {
        let handle = SessionHandle::new();
        assert_eq!(handle.state(), SessionState::AwaitingConnect);

        handle.set_state(SessionState::Connecting);
        assert_eq!(handle.state(), SessionState::Connecting);

        handle.set_state(SessionState::Closed);
        assert_eq!(handle.state(), SessionState::Closed);
    }

    #[test]
    fn test_target_set_once() {
        let handle = SessionHandle::new();
        assert!(handle.target().is_none());

        let target = Target {
            host: "h".to_string(),
            port: 22,
            username: "u".to_string(),
        };
        handle.set_target(target.clone());
        handle.set_target(Target {
            host: "other".to_string(),
            port: 22,
            username: "u".to_string(),
        });
        assert_eq!(handle.target(), Some(&target));
    }
}
