//! Preference documents: value model, snapshots, and on-disk persistence.
//!
//! ```text
//! PrefValue ──> PreferenceDocument ──> DocumentStore ──> <bundle-id>.plist
//!                       │
//!                       └── entries() / filtered() ──> PreferenceEntry
//! ```

mod document;
mod entry;
mod error;
mod format;
mod store;
mod value;

pub use document::PreferenceDocument;
pub use entry::PreferenceEntry;
pub use error::{PrefResult, PreferencesError};
pub use format::{DateStyle, TimeZoneChoice, ValueFormatter};
pub use store::{DocumentFormat, DocumentStore, LoadStatus, Loaded};
pub use value::{PrefValue, ValueKind};
