//! Relay session management

mod map;
mod relay;

pub use map::{SessionHandle, SessionMap};
pub use relay::RelaySession;
