//! Single-file change watcher.
//!
//! Editors and `cfprefsd` replace preference files by writing a sibling and
//! renaming it over the target, which invalidates an inode-level watch on the
//! file itself. The watcher therefore observes the parent directory
//! non-recursively and filters events by file name.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, select};
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use super::debouncer::Debouncer;
use super::delivery::{DeliveryContext, Immediate};
use super::error::WatchError;

/// How long the worker sleeps when nothing is pending.
const IDLE_TICK: Duration = Duration::from_millis(250);

type Callback = Arc<dyn Fn() + Send + Sync + 'static>;

/// Watch handle for exactly one path at a time.
///
/// [`watch`](Self::watch) releases any previous subscription before arming a
/// new one. Dropping the watcher releases the active subscription.
pub struct ChangeWatcher {
    context: Arc<dyn DeliveryContext>,
    debounce: Duration,
    active: Option<Subscription>,
}

impl ChangeWatcher {
    /// Create a watcher that delivers callbacks through `context`.
    pub fn new(context: Arc<dyn DeliveryContext>, debounce: Duration) -> Self {
        Self {
            context,
            debounce,
            active: None,
        }
    }

    /// Create a watcher that runs callbacks on its own worker thread.
    pub fn immediate(debounce: Duration) -> Self {
        Self::new(Arc::new(Immediate), debounce)
    }

    /// Start observing `path`, replacing any active watch.
    ///
    /// The file itself need not exist yet, but its directory must. On error
    /// no watch is active.
    pub fn watch<F>(&mut self, path: &Path, on_change: F) -> Result<(), WatchError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.stop();

        let unavailable = |reason: &str| WatchError::WatchUnavailable {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        };

        let file_name = path
            .file_name()
            .map(OsString::from)
            .ok_or_else(|| unavailable("path has no file name"))?;
        let dir = match path.parent() {
            Some(p) if p.as_os_str().is_empty() => PathBuf::from("."),
            Some(p) => p.to_path_buf(),
            None => return Err(unavailable("path has no parent directory")),
        };
        if !dir.is_dir() {
            return Err(unavailable("parent directory does not exist"));
        }

        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = event_tx.send(res);
        })?;
        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| unavailable(&e.to_string()))?;

        let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded(1);
        let live = Arc::new(AtomicBool::new(true));
        let worker = Worker {
            file_name,
            debouncer: Debouncer::new(self.debounce),
            context: Arc::clone(&self.context),
            callback: Arc::new(on_change),
            live: Arc::clone(&live),
        };
        let handle = thread::Builder::new()
            .name("simprefs-watcher".to_string())
            .spawn(move || worker.run(event_rx, shutdown_rx))
            .map_err(|e| WatchError::InitFailed {
                reason: e.to_string(),
            })?;

        crate::log_event!("watcher", "armed", "{}", path.display());

        self.active = Some(Subscription {
            path: path.to_path_buf(),
            live,
            watcher: Some(watcher),
            shutdown: Some(shutdown_tx),
            worker: Some(handle),
        });
        Ok(())
    }

    /// Release the active watch. Safe to call when nothing is watched.
    ///
    /// Once this returns, no callback for the released subscription starts.
    pub fn stop(&mut self) {
        self.active = None;
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// The path currently being watched.
    pub fn watched_path(&self) -> Option<&Path> {
        self.active.as_ref().map(|s| s.path.as_path())
    }
}

/// One armed OS-level watch and its worker thread.
struct Subscription {
    path: PathBuf,
    live: Arc<AtomicBool>,
    watcher: Option<RecommendedWatcher>,
    shutdown: Option<Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.live.store(false, Ordering::SeqCst);
        // Dropping the notify watcher removes the OS watch.
        drop(self.watcher.take());
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.worker.take() {
            // A callback running on the worker may itself release the watch.
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
        crate::log_event!("watcher", "released", "{}", self.path.display());
    }
}

struct Worker {
    file_name: OsString,
    debouncer: Debouncer,
    context: Arc<dyn DeliveryContext>,
    callback: Callback,
    live: Arc<AtomicBool>,
}

impl Worker {
    fn run(mut self, events: Receiver<notify::Result<Event>>, shutdown: Receiver<()>) {
        loop {
            let timeout = self.debouncer.time_until_ready().unwrap_or(IDLE_TICK);
            select! {
                recv(shutdown) -> _ => break,
                recv(events) -> msg => match msg {
                    Ok(Ok(event)) => {
                        if self.is_relevant(&event) {
                            crate::debug_event!("watcher", "event", "{:?}", event.kind);
                            self.debouncer.record();
                        }
                    }
                    Ok(Err(e)) => tracing::warn!("[watcher] file watch error: {e}"),
                    Err(_) => break,
                },
                default(timeout) => {}
            }

            if self.debouncer.take_ready() {
                self.dispatch();
            }
        }
    }

    fn is_relevant(&self, event: &Event) -> bool {
        let kind_matches = match event.kind {
            EventKind::Create(_) | EventKind::Remove(_) => true,
            EventKind::Modify(ModifyKind::Metadata(_)) => false,
            EventKind::Modify(_) => true,
            _ => false,
        };
        kind_matches
            && event
                .paths
                .iter()
                .any(|p| p.file_name() == Some(self.file_name.as_os_str()))
    }

    fn dispatch(&self) {
        if !self.live.load(Ordering::SeqCst) {
            return;
        }
        let live = Arc::clone(&self.live);
        let callback = Arc::clone(&self.callback);
        self.context.deliver(Box::new(move || {
            if live.load(Ordering::SeqCst) {
                callback();
            }
        }));
    }
}
