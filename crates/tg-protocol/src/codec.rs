//! Encoding and decoding of control frames
//!
//! Frames travel as JSON text over the WebSocket. Binary WebSocket messages
//! are tolerated as long as their payload is UTF-8 JSON; there is no framing
//! below the JSON layer.

use crate::error::ProtocolError;
use crate::message::{ClientFrame, ServerFrame};

/// Decode a client frame from a raw WebSocket payload
pub fn decode_client_frame(payload: &[u8]) -> Result<ClientFrame, ProtocolError> {
    let text = std::str::from_utf8(payload).map_err(|_| ProtocolError::NotUtf8)?;
    let frame = serde_json::from_str(text)?;
    Ok(frame)
}

/// Encode a server frame as a JSON text payload
pub fn encode_server_frame(frame: &ServerFrame) -> Result<String, ProtocolError> {
    let text = serde_json::to_string(frame)?;
    Ok(text)
}
