//! End-to-end: device scan -> discovery -> session -> disk -> watcher.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{SimulatorFixture, read_prefs, write_prefs};
use plist::Value;
use simprefs::discovery::device;
use simprefs::{
    ApplicationLocator, CallbackQueue, ChangeWatcher, DocumentStore, LoadStatus, PrefValue,
    PreferenceSession, SessionEvent, SessionState,
};

const WAIT: Duration = Duration::from_secs(5);

fn session() -> PreferenceSession {
    PreferenceSession::new(
        DocumentStore::default(),
        ChangeWatcher::immediate(Duration::from_millis(50)),
    )
}

#[test]
fn test_discover_select_edit_and_observe() {
    let fixture = SimulatorFixture::new();
    let data_root = fixture.add_device(
        "AAAA-1111",
        "iPhone 15",
        "com.apple.CoreSimulator.SimRuntime.iOS-17-0",
    );
    let prefs_path = fixture.install_app(
        &data_root,
        "com.example.app",
        "Example",
        &[
            ("launchCount", Value::from(3i64)),
            ("onboarded", Value::Boolean(false)),
        ],
    );
    fixture.add_container(&data_root, "com.example.orphan", &[]);

    let devices = device::scan_devices_root(&fixture.devices_root()).unwrap();
    let iphone = device::resolve(&devices, "iphone 15").unwrap();
    assert_eq!(iphone.runtime_display(), "iOS 17.0");

    let session = session();
    let discovery = session.select_device(iphone, &ApplicationLocator::new());
    assert_eq!(discovery.applications.len(), 1);
    assert_eq!(discovery.applications[0].display_name, "Example");
    assert_eq!(discovery.unresolved.len(), 1);
    assert!(discovery.is_complete());

    let events = session.subscribe();
    let app = discovery.find("com.example.app").unwrap();
    assert_eq!(session.select_application(app), LoadStatus::Parsed);
    assert_eq!(session.state(), SessionState::Loaded);
    assert!(matches!(
        events.recv_timeout(WAIT).unwrap(),
        SessionEvent::Loaded { .. }
    ));

    // Self-write: visible at once and persisted with its type.
    session.update_from_text("launchCount", "4").unwrap();
    assert_eq!(session.get("launchCount"), Some(PrefValue::from(4)));
    assert_eq!(
        read_prefs(&prefs_path).get("launchCount"),
        Some(&Value::from(4i64))
    );

    // Outside write: picked up through the watcher.
    std::thread::sleep(Duration::from_millis(200));
    write_prefs(
        &prefs_path,
        &[
            ("launchCount", Value::from(10i64)),
            ("onboarded", Value::Boolean(true)),
        ],
    );

    let deadline = std::time::Instant::now() + WAIT;
    let mut reloaded = false;
    while std::time::Instant::now() < deadline {
        match events.recv_timeout(WAIT) {
            Ok(SessionEvent::Reloaded) => {
                reloaded = true;
                break;
            }
            Ok(_) => continue,
            Err(_) => break,
        }
    }
    assert!(reloaded);
    assert_eq!(session.get("onboarded"), Some(PrefValue::Boolean(true)));
    assert_eq!(session.get("launchCount"), Some(PrefValue::from(10)));
}

#[test]
fn test_queue_delivery_reloads_on_owner_thread() {
    let fixture = SimulatorFixture::new();
    let data_root = fixture.add_device("BBBB", "iPad", "");
    let prefs_path = fixture.install_app(
        &data_root,
        "com.example.pad",
        "Pad",
        &[("theme", Value::String("light".into()))],
    );

    let queue = CallbackQueue::new();
    let session = PreferenceSession::new(
        DocumentStore::default(),
        ChangeWatcher::new(Arc::new(queue.clone()), Duration::from_millis(50)),
    );
    let discovery = ApplicationLocator::new().discover_in(&data_root);
    session.select_application(discovery.find("com.example.pad").unwrap());
    std::thread::sleep(Duration::from_millis(200));

    write_prefs(&prefs_path, &[("theme", Value::String("dark".into()))]);

    // Nothing changes until the owner drains the queue.
    std::thread::sleep(Duration::from_millis(300));
    assert_eq!(session.get("theme"), Some(PrefValue::from("light")));

    assert!(queue.run_next(WAIT));
    assert_eq!(session.get("theme"), Some(PrefValue::from("dark")));
}

#[test]
fn test_unresolved_container_can_still_be_opened() {
    let fixture = SimulatorFixture::new();
    let data_root = fixture.add_device("CCCC", "Watch", "");
    fixture.add_container(
        &data_root,
        "com.example.headless",
        &[("k", Value::Boolean(true))],
    );

    let discovery = ApplicationLocator::new().discover_in(&data_root);
    assert!(discovery.applications.is_empty());

    let app = discovery.find("com.example.headless").unwrap();
    assert_eq!(app.display_name, "com.example.headless");
    assert!(app.bundle_path.is_none());

    let session = session();
    session.select_application(app);
    assert_eq!(session.get("k"), Some(PrefValue::Boolean(true)));
}

#[test]
fn test_background_discovery() {
    let fixture = SimulatorFixture::new();
    let data_root = fixture.add_device("DDDD", "iPhone SE", "");
    fixture.install_app(&data_root, "com.example.b", "beta", &[]);
    fixture.install_app(&data_root, "com.example.a", "Alpha", &[]);

    let devices = device::scan_devices_root(&fixture.devices_root()).unwrap();
    let rx = ApplicationLocator::new().discover_in_background(&devices[0]);
    let discovery = rx.recv_timeout(WAIT).unwrap();

    let names: Vec<_> = discovery
        .applications
        .iter()
        .map(|a| a.display_name.as_str())
        .collect();
    assert_eq!(names, vec!["Alpha", "beta"]);
}
