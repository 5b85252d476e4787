//! SSH shell connector backed by russh
//!
//! Opens one authenticated SSH connection plus one interactive shell channel
//! per relay session, then bridges the channel to the relay through the
//! shell event/command pair. Stdout and stderr are merged into the single
//! output path the client sees.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use russh::client::{self, Handle, Msg};
use russh::{Channel, ChannelMsg, Disconnect};
use russh_keys::key::PublicKey;

use tg_core::error::RelayError;
use tg_core::traits::{
    ShellBackend, ShellChannel, ShellCommand, ShellConnector, ShellEvent, SHELL_CHANNEL_CAPACITY,
};
use tg_core::types::Target;
use tg_protocol::{AuthMethod, TerminalSize};

/// Opens authenticated shells on remote hosts over SSH
pub struct RusshConnector {
    /// Terminal type requested for the remote PTY
    term: String,
}

impl RusshConnector {
    /// Create a connector requesting the given terminal type
    pub fn new(term: impl Into<String>) -> Self {
        Self { term: term.into() }
    }
}

#[async_trait]
impl ShellConnector for RusshConnector {
    async fn open(
        &self,
        target: &Target,
        auth: &AuthMethod,
        size: TerminalSize,
    ) -> Result<ShellChannel, RelayError> {
        let config = Arc::new(client::Config::default());
        let handler = ClientHandler {
            target: target.to_string(),
        };

        tracing::debug!(remote = %target, "Connecting");
        let mut session = client::connect(config, (target.host.as_str(), target.port), handler)
            .await
            .map_err(classify_connect_error)?;

        authenticate(&mut session, target, auth).await?;

        tracing::debug!(remote = %target, "Authenticated, opening shell channel");
        let channel = session
            .channel_open_session()
            .await
            .map_err(|e| RelayError::Protocol(format!("Failed to open session channel: {}", e)))?;

        channel
            .request_pty(
                true,
                &self.term,
                size.cols as u32,
                size.rows as u32,
                0,
                0,
                &[],
            )
            .await
            .map_err(|e| RelayError::Protocol(format!("PTY request failed: {}", e)))?;

        channel
            .request_shell(true)
            .await
            .map_err(|e| RelayError::Protocol(format!("Shell request failed: {}", e)))?;

        let (shell, backend) = ShellChannel::pair(SHELL_CHANNEL_CAPACITY);
        let label = target.to_string();
        tokio::spawn(pump(session, channel, backend, label));

        Ok(shell)
    }
}

/// Authenticate with the single supplied credential
async fn authenticate(
    session: &mut Handle<ClientHandler>,
    target: &Target,
    auth: &AuthMethod,
) -> Result<(), RelayError> {
    let authenticated = match auth {
        AuthMethod::Password(password) => session
            .authenticate_password(&target.username, password)
            .await
            .map_err(|e| RelayError::Protocol(format!("Authentication exchange failed: {}", e)))?,
        AuthMethod::PrivateKey(key) => {
            let keypair = russh_keys::decode_secret_key(key, None)
                .map_err(|e| RelayError::Auth(format!("Invalid private key: {}", e)))?;
            session
                .authenticate_publickey(&target.username, Arc::new(keypair))
                .await
                .map_err(|e| RelayError::Protocol(format!("Authentication exchange failed: {}", e)))?
        }
    };

    if !authenticated {
        return Err(RelayError::Auth(format!(
            "Credentials rejected for {}",
            target.username
        )));
    }

    Ok(())
}

/// Bridge the SSH channel to the relay until either side ends.
///
/// Exactly one pump task per session; it owns the channel and the session
/// handle, so dropping out of this loop releases the transport.
async fn pump(
    session: Handle<ClientHandler>,
    mut channel: Channel<Msg>,
    backend: ShellBackend,
    label: String,
) {
    let ShellBackend {
        events,
        mut commands,
    } = backend;

    loop {
        tokio::select! {
            msg = channel.wait() => match msg {
                Some(ChannelMsg::Data { ref data }) => {
                    let chunk = Bytes::copy_from_slice(data);
                    if events.send(ShellEvent::Data(chunk)).await.is_err() {
                        break;
                    }
                }
                // stderr shares the client-facing output path
                Some(ChannelMsg::ExtendedData { ref data, .. }) => {
                    let chunk = Bytes::copy_from_slice(data);
                    if events.send(ShellEvent::Data(chunk)).await.is_err() {
                        break;
                    }
                }
                Some(ChannelMsg::ExitStatus { exit_status }) => {
                    tracing::debug!(remote = %label, "Remote shell exited with status {}", exit_status);
                    break;
                }
                Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => {
                    tracing::debug!(remote = %label, "Shell channel closed");
                    break;
                }
                Some(_) => {}
            },

            cmd = commands.recv() => match cmd {
                Some(ShellCommand::Data(bytes)) => {
                    if let Err(e) = channel.data(&bytes[..]).await {
                        let _ = events
                            .send(ShellEvent::Error(RelayError::Channel(format!(
                                "Shell write failed: {}",
                                e
                            ))))
                            .await;
                        break;
                    }
                }
                Some(ShellCommand::Resize(size)) => {
                    if let Err(e) = channel
                        .window_change(size.cols as u32, size.rows as u32, 0, 0)
                        .await
                    {
                        tracing::warn!(remote = %label, "Window change failed: {}", e);
                    }
                }
                None => {
                    // Relay dropped its sender; close is idempotent.
                    let _ = channel.eof().await;
                    let _ = channel.close().await;
                    break;
                }
            },
        }
    }

    let _ = session
        .disconnect(Disconnect::ByApplication, "session closed", "en")
        .await;
    tracing::debug!(remote = %label, "SSH pump task exiting");
}

/// Sort a connect failure into the error taxonomy
fn classify_connect_error(err: anyhow::Error) -> RelayError {
    // Transport-level failures (refused, unreachable, reset) carry an I/O
    // error somewhere in the chain; anything else is an SSH-layer surprise.
    if err
        .chain()
        .any(|cause| cause.downcast_ref::<std::io::Error>().is_some())
    {
        RelayError::Network(err.to_string())
    } else {
        RelayError::Protocol(err.to_string())
    }
}

/// SSH client handler for outbound relay connections
struct ClientHandler {
    /// Remote endpoint, for logging only
    target: String,
}

#[async_trait]
impl client::Handler for ClientHandler {
    type Error = anyhow::Error;

    /// Accept the server's host key.
    ///
    /// Host identity is the deployment's concern (the gateway sits next to
    /// its clients behind the same trust boundary); the fingerprint is
    /// logged so operators can audit what was reached.
    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        tracing::debug!(
            remote = %self.target,
            "Server host key: {}",
            server_public_key.fingerprint()
        );
        Ok(true)
    }
}
