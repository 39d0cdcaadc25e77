//! Command implementations for the CLI.
//!
//! Each command is implemented in its own module.

pub mod context;
pub mod devices;
pub mod init;
pub mod prefs;
pub mod watch;
