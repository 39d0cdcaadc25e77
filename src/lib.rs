//! Inspect and live-edit the preference files of apps installed in local
//! simulators.
//!
//! - [`discovery`] finds devices and the apps on them.
//! - [`preferences`] reads and atomically rewrites property-list documents.
//! - [`watcher`] reports outside writes to a single file.
//! - [`session`] ties them together into a live, editable snapshot.

pub mod cli;
pub mod config;
pub mod discovery;
pub mod logging;
pub mod preferences;
pub mod session;
pub mod watcher;

pub use config::Settings;
pub use discovery::{ApplicationDescriptor, ApplicationLocator, DeviceDescriptor, Discovery};
pub use preferences::{
    DocumentStore, LoadStatus, PrefValue, PreferenceDocument, PreferenceEntry, PreferencesError,
    ValueFormatter, ValueKind,
};
pub use session::{PreferenceSession, SessionError, SessionEvent, SessionState};
pub use watcher::{CallbackQueue, ChangeWatcher, DeliveryContext, Immediate, WatchError};
