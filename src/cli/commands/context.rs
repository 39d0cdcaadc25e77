//! Device and application resolution shared by the commands.

use anyhow::{Context, Result, bail};

use crate::cli::args::{GlobalOptions, TargetArgs};
use crate::config::Settings;
use crate::discovery::{
    ApplicationDescriptor, ApplicationLocator, DeviceDescriptor, Discovery, device,
};
use crate::preferences::LoadStatus;
use crate::session::PreferenceSession;
use crate::watcher::ChangeWatcher;

/// Enumerate devices according to the global options and settings.
///
/// `--data-root` yields a single device. `--devices-root` scans that
/// directory. Otherwise simctl is tried first, then the configured devices
/// directory.
pub fn load_devices(global: &GlobalOptions, settings: &Settings) -> Result<Vec<DeviceDescriptor>> {
    if let Some(data_root) = &global.data_root {
        return Ok(vec![DeviceDescriptor::from_data_root(data_root)]);
    }

    if let Some(root) = &global.devices_root {
        return device::scan_devices_root(root)
            .with_context(|| format!("Cannot read devices directory {}", root.display()));
    }

    match device::list_with_simctl(&settings.simulator) {
        Ok(devices) => Ok(devices),
        Err(e) => {
            tracing::warn!("[cli] simctl unavailable, scanning devices directory: {e}");
            let root = &settings.simulator.devices_root;
            device::scan_devices_root(root)
                .with_context(|| format!("Cannot read devices directory {}", root.display()))
        }
    }
}

/// Pick the device named by `selector`.
pub fn select_device(
    global: &GlobalOptions,
    settings: &Settings,
    selector: &str,
) -> Result<DeviceDescriptor> {
    let devices = load_devices(global, settings)?;
    if global.data_root.is_some() {
        if let Some(only) = devices.into_iter().next() {
            return Ok(only);
        }
        bail!("No device data root given");
    }

    match device::resolve(&devices, selector) {
        Some(found) => Ok(found.clone()),
        None => bail!("No device matches '{selector}'. Run 'simprefs devices' to list them."),
    }
}

/// Discover the apps on a device, logging directories that could not be read.
pub fn discover(device: &DeviceDescriptor) -> Discovery {
    let discovery = ApplicationLocator::new().discover(device);
    for path in &discovery.unreadable {
        tracing::warn!("[cli] could not list {}", path.display());
    }
    discovery
}

/// Resolve the device and application for a preference command.
pub fn resolve_target(
    global: &GlobalOptions,
    settings: &Settings,
    target: &TargetArgs,
) -> Result<(DeviceDescriptor, ApplicationDescriptor)> {
    let device = select_device(global, settings, &target.device)?;
    let discovery = discover(&device);
    match discovery.find(&target.bundle_id) {
        Some(app) => Ok((device, app)),
        None => bail!(
            "No app '{}' with a preferences file on {}",
            target.bundle_id,
            device.name
        ),
    }
}

/// Open a session on the target app with callbacks run on the watcher thread.
pub fn open_session(
    global: &GlobalOptions,
    settings: &Settings,
    target: &TargetArgs,
) -> Result<PreferenceSession> {
    let (_, app) = resolve_target(global, settings, target)?;
    let session = PreferenceSession::new(
        settings.store(),
        ChangeWatcher::immediate(settings.watcher.debounce()),
    );
    report_load(&app, session.select_application(app.clone()));
    Ok(session)
}

/// Tell the user about a document that could not be parsed.
pub fn report_load(app: &ApplicationDescriptor, status: LoadStatus) {
    if let LoadStatus::Corrupt { reason } = status {
        eprintln!(
            "Warning: {} could not be parsed ({reason}); showing it as empty",
            app.preferences_path().display()
        );
    }
}
