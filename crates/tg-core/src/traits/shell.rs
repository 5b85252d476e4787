//! Shell session capability
//!
//! Abstraction over one authenticated SSH connection and its interactive
//! shell channel. The relay never talks to the SSH library directly; it
//! drives a [`ShellChannel`], which a [`ShellConnector`] implementation
//! produces. Tests substitute their own connector, so all external I/O is
//! mockable.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use tg_protocol::{AuthMethod, TerminalSize};

use crate::error::RelayError;
use crate::types::Target;

/// Capacity of the per-session event and command channels.
///
/// 256 gives headroom for output bursts from the remote shell while still
/// applying backpressure if the client-side socket stalls.
pub const SHELL_CHANNEL_CAPACITY: usize = 256;

/// Output-side events produced by a shell session.
///
/// The event stream is lazy and order-preserving. End-of-stream (the
/// receiver yielding `None`) means the remote shell closed; consumers must
/// treat that as session termination, not an error, unless an `Error` event
/// preceded it.
#[derive(Debug)]
pub enum ShellEvent {
    /// A chunk of output bytes (stdout and stderr merged)
    Data(Bytes),
    /// The session failed; the stream ends after this event
    Error(RelayError),
}

/// Input-side commands accepted by a shell session.
///
/// Dropping the command sender closes the shell and its transport; close is
/// idempotent.
#[derive(Debug)]
pub enum ShellCommand {
    /// Raw bytes for the remote shell's input stream, verbatim
    Data(Bytes),
    /// Request a pseudo-terminal window-size change
    Resize(TerminalSize),
}

/// The relay-facing half of an open shell session
pub struct ShellChannel {
    /// Output from the remote shell
    pub events: mpsc::Receiver<ShellEvent>,
    /// Input and control toward the remote shell
    pub commands: mpsc::Sender<ShellCommand>,
}

/// The implementation-facing half of an open shell session
pub struct ShellBackend {
    /// Sink for shell output
    pub events: mpsc::Sender<ShellEvent>,
    /// Source of input and control
    pub commands: mpsc::Receiver<ShellCommand>,
}

impl ShellChannel {
    /// Create a connected channel/backend pair
    pub fn pair(capacity: usize) -> (ShellChannel, ShellBackend) {
        let (event_tx, event_rx) = mpsc::channel(capacity);
        let (command_tx, command_rx) = mpsc::channel(capacity);

        (
            ShellChannel {
                events: event_rx,
                commands: command_tx,
            },
            ShellBackend {
                events: event_tx,
                commands: command_rx,
            },
        )
    }
}

/// Opens authenticated shell sessions on remote hosts.
///
/// `open` establishes transport, authentication, and shell allocation in one
/// step. It fails with [`RelayError::Auth`] on credential rejection,
/// [`RelayError::Network`] on unreachable host, and [`RelayError::Protocol`]
/// on unexpected SSH-layer failure. The caller bounds the attempt with its
/// configured connect timeout.
#[async_trait]
pub trait ShellConnector: Send + Sync {
    /// Establish an authenticated shell session on `target`
    async fn open(
        &self,
        target: &Target,
        auth: &AuthMethod,
        size: TerminalSize,
    ) -> Result<ShellChannel, RelayError>;
}
