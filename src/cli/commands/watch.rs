//! Watch command: reprint an app's preferences on every change.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, bail};

use super::context::{report_load, resolve_target};
use crate::cli::args::{GlobalOptions, TargetArgs};
use crate::cli::output::{dim, entries_table, heading};
use crate::config::Settings;
use crate::session::{PreferenceSession, SessionEvent};
use crate::watcher::{CallbackQueue, ChangeWatcher};

/// How long the main loop waits for a queued callback before checking events.
const POLL: Duration = Duration::from_millis(200);

/// Run watch command.
///
/// Watcher callbacks are queued and run here on the main thread, so every
/// reload and every print happens in one place.
pub fn run_watch(
    global: &GlobalOptions,
    settings: &Settings,
    target: &TargetArgs,
    filter: Option<&str>,
    max_changes: Option<usize>,
) -> Result<()> {
    let (device, app) = resolve_target(global, settings, target)?;

    let queue = CallbackQueue::new();
    let watcher = ChangeWatcher::new(Arc::new(queue.clone()), settings.watcher.debounce());
    let session = PreferenceSession::new(settings.store(), watcher);
    let events = session.subscribe();

    report_load(&app, session.select_application(app.clone()));
    if !session.watch_active() {
        bail!(
            "Cannot watch {}; its directory is missing",
            app.preferences_path().display()
        );
    }

    println!(
        "{}",
        heading(&format!("{} on {}", app.display_name, device.name))
    );
    print_snapshot(&session, settings, filter);
    println!("{}", dim("Watching for changes (Ctrl-C to stop)"));

    let mut changes = 0;
    loop {
        queue.run_next(POLL);
        for event in events.try_iter() {
            if event != SessionEvent::Reloaded {
                continue;
            }
            changes += 1;
            let stamp = chrono::Local::now().format("%H:%M:%S");
            println!("{}", heading(&format!("Changed at {stamp}")));
            print_snapshot(&session, settings, filter);
        }
        if max_changes.is_some_and(|max| changes >= max) {
            return Ok(());
        }
    }
}

fn print_snapshot(session: &PreferenceSession, settings: &Settings, filter: Option<&str>) {
    let entries = session.filtered(filter.unwrap_or_default());
    if entries.is_empty() {
        println!("No preferences.");
    } else {
        println!("{}", entries_table(&entries, &settings.formatter()));
    }
}
