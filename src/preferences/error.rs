//! Error types for preference document operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from loading, converting, or persisting preference documents.
///
/// A missing document is not represented here: loading an absent file
/// yields an empty document with [`LoadStatus::NotFound`](super::LoadStatus).
#[derive(Error, Debug)]
pub enum PreferencesError {
    #[error("Preferences at {} could not be parsed: {reason}", path.display())]
    CorruptDocument { path: PathBuf, reason: String },

    #[error("Failed to write preferences to {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Preference keys must not be empty")]
    InvalidKey,

    #[error("Key '{0}' not found")]
    KeyNotFound(String),

    #[error("Unsupported property list value: {kind}")]
    UnsupportedValue { kind: String },

    #[error("Cannot read '{text}' as {kind}: {reason}")]
    InvalidValue {
        kind: String,
        text: String,
        reason: String,
    },
}

/// Result type for preference operations.
pub type PrefResult<T> = Result<T, PreferencesError>;
