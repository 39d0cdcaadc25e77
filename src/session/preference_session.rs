//! Session state machine: `Idle` <-> `Loaded`.
//!
//! Two locks are involved. The watcher lock serialises selection changes;
//! the state lock guards the snapshot. The state lock is never held while
//! the watcher is stopped or armed, because stopping joins the watcher
//! thread, which may be waiting on the state lock inside a reload.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Weak};

use crossbeam_channel::{Receiver, Sender};
use parking_lot::Mutex;

use super::error::{SessionError, SessionResult};
use crate::discovery::{ApplicationDescriptor, ApplicationLocator, DeviceDescriptor, Discovery};
use crate::preferences::{
    DocumentStore, LoadStatus, PrefValue, PreferenceDocument, PreferenceEntry, PreferencesError,
};
use crate::watcher::ChangeWatcher;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No application selected.
    Idle,
    /// A document is in memory and, when possible, watched.
    Loaded,
}

/// Notifications for whatever renders the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// An application was selected and its document loaded.
    Loaded { bundle_identifier: String },
    /// The session wrote an edit. `key` is `None` after clearing all keys.
    Edited { key: Option<String> },
    /// An outside write changed the document.
    Reloaded,
    /// The selection was dropped.
    Cleared,
}

struct Selection {
    app: ApplicationDescriptor,
    path: PathBuf,
    document: PreferenceDocument,
    status: LoadStatus,
}

#[derive(Default)]
struct State {
    /// Bumped on every selection change so stale reloads are ignored.
    generation: u64,
    selection: Option<Selection>,
    subscribers: Vec<Sender<SessionEvent>>,
}

impl State {
    fn notify(&mut self, event: SessionEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn selection_mut(&mut self) -> SessionResult<&mut Selection> {
        self.selection.as_mut().ok_or(SessionError::NoSelection)
    }
}

/// Holds the selected application's live document.
///
/// All methods take `&self`; the session can be shared across threads.
pub struct PreferenceSession {
    store: DocumentStore,
    state: Arc<Mutex<State>>,
    watcher: Mutex<ChangeWatcher>,
}

impl PreferenceSession {
    pub fn new(store: DocumentStore, watcher: ChangeWatcher) -> Self {
        Self {
            store,
            state: Arc::new(Mutex::new(State::default())),
            watcher: Mutex::new(watcher),
        }
    }

    /// Select `app`: release any previous watch, load its document and arm
    /// the watcher on the document's path.
    ///
    /// Load problems are absorbed into the returned status. A watch that
    /// cannot be armed is logged and leaves the session without live updates.
    pub fn select_application(&self, app: ApplicationDescriptor) -> LoadStatus {
        let mut watcher = self.watcher.lock();
        watcher.stop();

        let path = app.preferences_path();
        let loaded = self.store.load(&path);
        let status = loaded.status.clone();
        let bundle_identifier = app.bundle_identifier.clone();

        let generation = {
            let mut state = self.state.lock();
            state.generation += 1;
            state.selection = Some(Selection {
                app,
                path: path.clone(),
                document: loaded.document,
                status: loaded.status,
            });
            state.notify(SessionEvent::Loaded {
                bundle_identifier: bundle_identifier.clone(),
            });
            state.generation
        };

        let weak = Arc::downgrade(&self.state);
        let store = self.store.clone();
        let watched = path.clone();
        if let Err(e) = watcher.watch(&path, move || {
            reload(&store, &weak, generation, &watched);
        }) {
            tracing::warn!("[session] live updates unavailable for {bundle_identifier}: {e}");
        }

        crate::log_event!("session", "selected", "{bundle_identifier}");
        status
    }

    /// Drop the current selection and discover the applications on `device`.
    pub fn select_device(&self, device: &DeviceDescriptor, locator: &ApplicationLocator) -> Discovery {
        self.clear();
        locator.discover(device)
    }

    /// Return to `Idle`: stop watching and drop the snapshot.
    pub fn clear(&self) {
        let mut watcher = self.watcher.lock();
        watcher.stop();

        let mut state = self.state.lock();
        state.generation += 1;
        if state.selection.take().is_some() {
            state.notify(SessionEvent::Cleared);
            crate::debug_event!("session", "cleared");
        }
    }

    /// Receive [`SessionEvent`]s. Dropped receivers are pruned on the next event.
    pub fn subscribe(&self) -> Receiver<SessionEvent> {
        let (tx, rx) = crossbeam_channel::unbounded();
        self.state.lock().subscribers.push(tx);
        rx
    }

    pub fn state(&self) -> SessionState {
        if self.state.lock().selection.is_some() {
            SessionState::Loaded
        } else {
            SessionState::Idle
        }
    }

    pub fn current_app(&self) -> Option<ApplicationDescriptor> {
        self.state.lock().selection.as_ref().map(|s| s.app.clone())
    }

    pub fn document_path(&self) -> Option<PathBuf> {
        self.state.lock().selection.as_ref().map(|s| s.path.clone())
    }

    /// How the most recent load or reload resolved.
    pub fn load_status(&self) -> Option<LoadStatus> {
        self.state.lock().selection.as_ref().map(|s| s.status.clone())
    }

    pub fn watch_active(&self) -> bool {
        self.watcher.lock().is_active()
    }

    /// Copy of the in-memory document, `None` when idle.
    pub fn document(&self) -> Option<PreferenceDocument> {
        self.state.lock().selection.as_ref().map(|s| s.document.clone())
    }

    /// All entries sorted by key. Empty when idle.
    pub fn entries(&self) -> Vec<PreferenceEntry> {
        self.state
            .lock()
            .selection
            .as_ref()
            .map(|s| s.document.entries())
            .unwrap_or_default()
    }

    /// Entries whose key contains `query`, ignoring case.
    pub fn filtered(&self, query: &str) -> Vec<PreferenceEntry> {
        self.state
            .lock()
            .selection
            .as_ref()
            .map(|s| s.document.filtered(query))
            .unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<PrefValue> {
        self.state
            .lock()
            .selection
            .as_ref()
            .and_then(|s| s.document.get(key).cloned())
    }

    /// Write `key = value` and update the snapshot from what was written.
    ///
    /// On failure the snapshot is left as it was.
    pub fn set_value(&self, key: &str, value: PrefValue) -> SessionResult<()> {
        let mut state = self.state.lock();
        let selection = state.selection_mut()?;
        let document = self.store.set_value(key, value, &selection.path)?;
        selection.document = document;
        selection.status = LoadStatus::Parsed;
        state.notify(SessionEvent::Edited {
            key: Some(key.to_string()),
        });
        Ok(())
    }

    /// Insert a new entry. Same write path as [`set_value`](Self::set_value).
    pub fn add(&self, key: &str, value: PrefValue) -> SessionResult<()> {
        self.set_value(key, value)
    }

    /// Replace an existing value from user-typed text, keeping its kind.
    pub fn update_from_text(&self, key: &str, text: &str) -> SessionResult<()> {
        let kind = self
            .get(key)
            .map(|v| v.kind())
            .ok_or_else(|| PreferencesError::KeyNotFound(key.to_string()))?;
        let value = PrefValue::parse(kind, text)?;
        self.set_value(key, value)
    }

    pub fn delete(&self, key: &str) -> SessionResult<()> {
        let mut state = self.state.lock();
        let selection = state.selection_mut()?;
        let document = self.store.delete_key(key, &selection.path)?;
        selection.document = document;
        selection.status = LoadStatus::Parsed;
        state.notify(SessionEvent::Edited {
            key: Some(key.to_string()),
        });
        Ok(())
    }

    /// Remove every key, replacing the file with an empty document.
    pub fn clear_all(&self) -> SessionResult<()> {
        let mut state = self.state.lock();
        let selection = state.selection_mut()?;
        let document = self.store.clear_all(&selection.path)?;
        selection.document = document;
        selection.status = LoadStatus::Parsed;
        state.notify(SessionEvent::Edited { key: None });
        Ok(())
    }

    /// Re-read the document now, as a watcher event would.
    pub fn reload(&self) -> SessionResult<()> {
        let (generation, path) = {
            let state = self.state.lock();
            let selection = state.selection.as_ref().ok_or(SessionError::NoSelection)?;
            (state.generation, selection.path.clone())
        };
        reload(&self.store, &Arc::downgrade(&self.state), generation, &path);
        Ok(())
    }
}

/// Apply an outside change to the snapshot.
///
/// Runs under the state lock, so it is ordered against edits. A reload from
/// an older selection, an unchanged document, or an unparseable file leaves
/// the snapshot as it is.
fn reload(store: &DocumentStore, state: &Weak<Mutex<State>>, generation: u64, path: &Path) {
    let Some(state) = state.upgrade() else {
        return;
    };
    let mut state = state.lock();
    if state.generation != generation {
        crate::debug_event!("session", "stale reload ignored");
        return;
    }
    let Some(selection) = state.selection.as_mut() else {
        return;
    };

    let loaded = store.load(path);
    if loaded.is_corrupt() {
        tracing::warn!(
            "[session] keeping last good snapshot, {} is unreadable",
            path.display()
        );
        selection.status = loaded.status;
        return;
    }

    selection.status = loaded.status;
    if loaded.document.identical(&selection.document) {
        crate::debug_event!("session", "reload unchanged", "{}", path.display());
        return;
    }
    selection.document = loaded.document;
    crate::log_event!("session", "reloaded", "{}", path.display());
    state.notify(SessionEvent::Reloaded);
}
