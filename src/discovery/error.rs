//! Error types for device enumeration.

use thiserror::Error;

/// Errors from listing simulator devices.
///
/// Application discovery itself never fails; unreadable directories are
/// reported through [`Discovery::unreadable`](super::Discovery).
#[derive(Error, Debug)]
pub enum DeviceError {
    #[error("Failed to run '{program}': {reason}")]
    CommandFailed { program: String, reason: String },

    #[error("Unexpected device list output: {0}")]
    InvalidOutput(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
