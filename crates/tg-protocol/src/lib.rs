//! tg-protocol: Wire protocol for the termgate relay
//!
//! This crate defines the JSON control frames exchanged between the browser
//! terminal and the relay gateway over a WebSocket.

pub mod codec;
pub mod error;
pub mod message;

pub use codec::{decode_client_frame, encode_server_frame};
pub use error::ProtocolError;
pub use message::{AuthMethod, ClientFrame, ConnectRequest, ServerFrame, TerminalSize};
