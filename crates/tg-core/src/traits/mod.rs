//! Capability traits

mod shell;

pub use shell::{
    ShellBackend, ShellChannel, ShellCommand, ShellConnector, ShellEvent, SHELL_CHANNEL_CAPACITY,
};
