//! Error types for the change watcher.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from arming a watch.
///
/// Both are non-fatal to callers: without a watch, editing still works and
/// only live updates are lost.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Cannot watch {}: {reason}", path.display())]
    WatchUnavailable { path: PathBuf, reason: String },

    #[error("Failed to initialize watcher: {reason}")]
    InitFailed { reason: String },
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::InitFailed {
            reason: e.to_string(),
        }
    }
}
