//! Outbound SSH shell sessions

mod connector;

pub use connector::RusshConnector;
