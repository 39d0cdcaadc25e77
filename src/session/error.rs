//! Error types for session operations.

use thiserror::Error;

use crate::preferences::PreferencesError;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("No application selected")]
    NoSelection,

    #[error(transparent)]
    Preferences(#[from] PreferencesError),
}

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;
