//! Live, editable view of one application's preferences.
//!
//! [`PreferenceSession`] ties the pieces together: it loads the selected
//! application's document through the store, keeps the in-memory snapshot
//! the presentation layer reads, writes edits through to disk, and re-reads
//! the file whenever the change watcher reports an outside write.

mod error;
mod preference_session;

pub use error::{SessionError, SessionResult};
pub use preference_session::{PreferenceSession, SessionEvent, SessionState};
