//! Relay session: the bidirectional splice between one client WebSocket and
//! one remote shell.
//!
//! The session advances through an explicit lifecycle
//! (`AwaitingConnect → Connecting → Active → Closed`). Two flows proceed
//! concurrently while `Active`: frames arriving from the client channel and
//! byte chunks arriving from the shell's event stream. A single
//! `tokio::select!` loop drives both, so per-direction ordering is
//! preserved without any cross-flow locking.
//!
//! Failure policy: adapter errors become exactly one `error` frame to the
//! client followed by teardown, never a retry. Malformed client frames are
//! rejected per-message, except in the initial `connect` position where a
//! malformed frame is session-fatal.

use std::sync::Arc;

use axum::extract::ws::Message;
use bytes::Bytes;
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio_util::sync::CancellationToken;

use tg_core::error::RelayError;
use tg_core::traits::{ShellChannel, ShellCommand, ShellEvent};
use tg_core::types::{SessionState, Target};
use tg_protocol::{
    decode_client_frame, encode_server_frame, ClientFrame, ConnectRequest, ServerFrame,
    TerminalSize,
};

use crate::session::map::SessionHandle;
use crate::state::GatewayState;

/// One client-to-remote-host pairing.
///
/// Owns exclusively one duplex channel (as a sink/stream pair) and, once
/// `Active`, one shell channel. Neither is shared with any other session.
pub struct RelaySession {
    handle: Arc<SessionHandle>,
    state: Arc<GatewayState>,
    cancel: CancellationToken,
}

/// Raw payload extracted from one WebSocket message, or the reason the
/// channel stopped yielding them.
enum Inbound {
    Frame(Vec<u8>),
    /// Control message we let the transport layer handle
    Ignored,
    /// Client closed or the transport failed
    Gone,
}

impl RelaySession {
    /// Create a session bound to a registered handle
    pub fn new(
        handle: Arc<SessionHandle>,
        state: Arc<GatewayState>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            handle,
            state,
            cancel,
        }
    }

    /// Drive the session to completion.
    ///
    /// Consumes the duplex channel halves; on return the session is
    /// `Closed`, its map entry removed, and all owned resources released.
    pub async fn run<W, R, WE, RE>(self, mut sink: W, mut stream: R)
    where
        W: Sink<Message, Error = WE> + Unpin + Send,
        WE: std::fmt::Display,
        R: Stream<Item = Result<Message, RE>> + Unpin + Send,
        RE: std::fmt::Display,
    {
        let id = self.handle.id;

        self.drive(&mut sink, &mut stream).await;

        self.handle.set_state(SessionState::Closed);
        self.state.sessions.remove(&id);
        let _ = sink.close().await;

        tracing::info!(
            session = %id,
            bytes_to_shell = self.handle.bytes_to_shell(),
            bytes_to_client = self.handle.bytes_to_client(),
            "Relay session closed"
        );
    }

    async fn drive<W, R, WE, RE>(&self, sink: &mut W, stream: &mut R)
    where
        W: Sink<Message, Error = WE> + Unpin + Send,
        WE: std::fmt::Display,
        R: Stream<Item = Result<Message, RE>> + Unpin + Send,
        RE: std::fmt::Display,
    {
        let id = self.handle.id;

        // AwaitingConnect: nothing but a well-formed connect frame moves the
        // session forward. Data and resize frames that race ahead of it are
        // dropped, never an error.
        let connect = match self.await_connect(sink, stream).await {
            Some(connect) => connect,
            None => return,
        };

        let auth = match connect.auth_method() {
            Ok(auth) => auth,
            Err(e) => {
                tracing::warn!(session = %id, "Rejecting connect frame: {}", e);
                let _ = send_frame(
                    sink,
                    &ServerFrame::Error {
                        message: e.to_string(),
                    },
                )
                .await;
                return;
            }
        };

        let target = Target {
            host: connect.host.clone(),
            port: connect.port,
            username: connect.username.clone(),
        };
        self.handle.set_target(target.clone());
        self.handle.set_state(SessionState::Connecting);
        tracing::info!(session = %id, remote = %target, "Opening SSH session");

        let opened = tokio::time::timeout(
            self.state.config.connect_timeout,
            self.state
                .connector
                .open(&target, &auth, TerminalSize::default()),
        )
        .await
        .unwrap_or_else(|_| {
            Err(RelayError::Network(format!(
                "Connection to {} timed out",
                target
            )))
        });

        let shell = match opened {
            Ok(shell) => shell,
            Err(e) => {
                tracing::warn!(session = %id, remote = %target, "SSH open failed: {}", e);
                let _ = send_frame(
                    sink,
                    &ServerFrame::Error {
                        message: e.to_string(),
                    },
                )
                .await;
                return;
            }
        };

        if send_frame(sink, &ServerFrame::Connected).await.is_err() {
            return;
        }
        self.handle.set_state(SessionState::Active);
        tracing::info!(session = %id, remote = %target, "Shell ready");

        self.splice(sink, stream, shell).await;
    }

    /// Read frames until the initial connect arrives.
    ///
    /// Returns `None` when the session cannot proceed: client gone, gateway
    /// shutdown, or a malformed frame in the connect position (which is
    /// session-fatal, unlike later malformed frames).
    async fn await_connect<W, R, WE, RE>(
        &self,
        sink: &mut W,
        stream: &mut R,
    ) -> Option<ConnectRequest>
    where
        W: Sink<Message, Error = WE> + Unpin + Send,
        WE: std::fmt::Display,
        R: Stream<Item = Result<Message, RE>> + Unpin + Send,
        RE: std::fmt::Display,
    {
        let id = self.handle.id;

        loop {
            let inbound = tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::debug!(session = %id, "Gateway shutdown before connect");
                    return None;
                }
                msg = stream.next() => classify(msg),
            };

            let payload = match inbound {
                Inbound::Frame(payload) => payload,
                Inbound::Ignored => continue,
                Inbound::Gone => {
                    tracing::debug!(session = %id, "Channel closed before connect");
                    return None;
                }
            };

            match decode_client_frame(&payload) {
                Ok(ClientFrame::Connect(connect)) => return Some(connect),
                Ok(_) => {
                    // Data/resize are not valid until the shell is ready; dropped.
                    tracing::debug!(session = %id, "Dropping frame received before connect");
                }
                Err(e) => {
                    tracing::warn!(session = %id, "Malformed connect frame: {}", e);
                    let _ = send_frame(
                        sink,
                        &ServerFrame::Error {
                            message: e.to_string(),
                        },
                    )
                    .await;
                    return None;
                }
            }
        }
    }

    /// The Active phase: forward frames and shell events until one side ends.
    async fn splice<W, R, WE, RE>(&self, sink: &mut W, stream: &mut R, shell: ShellChannel)
    where
        W: Sink<Message, Error = WE> + Unpin + Send,
        WE: std::fmt::Display,
        R: Stream<Item = Result<Message, RE>> + Unpin + Send,
        RE: std::fmt::Display,
    {
        let id = self.handle.id;
        let ShellChannel {
            mut events,
            commands,
        } = shell;

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::info!(session = %id, "Gateway shutdown, closing session");
                    let _ = send_frame(sink, &ServerFrame::Close).await;
                    break;
                }

                event = events.recv() => match event {
                    Some(ShellEvent::Data(data)) => {
                        self.handle.add_bytes_to_client(data.len());
                        let data = String::from_utf8_lossy(&data).into_owned();
                        if send_frame(sink, &ServerFrame::Data { data }).await.is_err() {
                            break;
                        }
                    }
                    Some(ShellEvent::Error(e)) => {
                        tracing::warn!(session = %id, "Shell session failed: {}", e);
                        let _ = send_frame(
                            sink,
                            &ServerFrame::Error {
                                message: e.to_string(),
                            },
                        )
                        .await;
                        break;
                    }
                    None => {
                        tracing::info!(session = %id, "Remote shell closed");
                        let _ = send_frame(sink, &ServerFrame::Close).await;
                        break;
                    }
                },

                msg = stream.next() => {
                    let payload = match classify(msg) {
                        Inbound::Frame(payload) => payload,
                        Inbound::Ignored => continue,
                        Inbound::Gone => {
                            tracing::info!(session = %id, "Client channel closed");
                            break;
                        }
                    };

                    match decode_client_frame(&payload) {
                        Ok(ClientFrame::Data { data }) => {
                            self.handle.add_bytes_to_shell(data.len());
                            // Verbatim: line-ending policy belongs to the client.
                            let bytes = Bytes::from(data.into_bytes());
                            if commands.send(ShellCommand::Data(bytes)).await.is_err() {
                                // Shell side gone; its end-of-stream event
                                // arrives on the next loop turn.
                                tracing::debug!(session = %id, "Dropped write to closed shell");
                            }
                        }
                        Ok(ClientFrame::Resize(size)) => {
                            if commands.send(ShellCommand::Resize(size)).await.is_err() {
                                tracing::debug!(session = %id, "Dropped resize to closed shell");
                            }
                        }
                        Ok(ClientFrame::Connect(_)) => {
                            // One SSH session per channel; rejected per-message.
                            if send_frame(
                                sink,
                                &ServerFrame::Error {
                                    message: "Session already connected".to_string(),
                                },
                            )
                            .await
                            .is_err()
                            {
                                break;
                            }
                        }
                        Err(e) => {
                            tracing::warn!(session = %id, "Rejecting malformed frame: {}", e);
                            if send_frame(
                                sink,
                                &ServerFrame::Error {
                                    message: e.to_string(),
                                },
                            )
                            .await
                            .is_err()
                            {
                                break;
                            }
                        }
                    }
                }
            }
        }

        // Dropping the command sender closes the shell channel and, with it,
        // the SSH transport.
        drop(commands);
    }
}

/// Sort one WebSocket message into a frame payload, noise, or end-of-channel
fn classify<RE: std::fmt::Display>(msg: Option<Result<Message, RE>>) -> Inbound {
    match msg {
        Some(Ok(Message::Text(text))) => Inbound::Frame(text.into_bytes()),
        Some(Ok(Message::Binary(data))) => Inbound::Frame(data),
        Some(Ok(Message::Close(_))) | None => Inbound::Gone,
        Some(Ok(_)) => Inbound::Ignored,
        Some(Err(e)) => {
            tracing::warn!("WebSocket receive failed: {}", e);
            Inbound::Gone
        }
    }
}

/// Send one server frame; an error means the client channel is unusable
async fn send_frame<W, WE>(sink: &mut W, frame: &ServerFrame) -> Result<(), RelayError>
where
    W: Sink<Message, Error = WE> + Unpin,
    WE: std::fmt::Display,
{
    let text = encode_server_frame(frame)?;
    sink.send(Message::Text(text))
        .await
        .map_err(|e| RelayError::Channel(format!("WebSocket send failed: {}", e)))
}
