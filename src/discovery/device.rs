//! Simulator device enumeration.
//!
//! Devices come from two places: the JSON printed by
//! `xcrun simctl list -j devices`, or an offline scan of the CoreSimulator
//! devices directory where each device keeps a `device.plist`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::{Deserialize, Serialize};

use super::error::DeviceError;
use crate::config::SimulatorConfig;

/// One simulator device. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceDescriptor {
    pub id: String,
    pub name: String,
    pub runtime_label: String,
    pub data_root: PathBuf,
}

impl DeviceDescriptor {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        runtime_label: impl Into<String>,
        data_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            runtime_label: runtime_label.into(),
            data_root: data_root.into(),
        }
    }

    /// A device standing for a bare data directory, named after it.
    pub fn from_data_root(data_root: impl Into<PathBuf>) -> Self {
        let data_root = data_root.into();
        let name = data_root.display().to_string();
        Self::new(name.clone(), name, "", data_root)
    }

    /// `com.apple.CoreSimulator.SimRuntime.iOS-17-0` becomes `iOS 17.0`.
    /// Labels in any other shape are returned unchanged.
    pub fn runtime_display(&self) -> String {
        let Some(tail) = self
            .runtime_label
            .strip_prefix("com.apple.CoreSimulator.SimRuntime.")
        else {
            return self.runtime_label.clone();
        };
        match tail.split_once('-') {
            Some((platform, version)) => format!("{platform} {}", version.replace('-', ".")),
            None => tail.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SimctlOutput {
    #[serde(default)]
    devices: BTreeMap<String, Vec<SimctlDevice>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimctlDevice {
    name: Option<String>,
    udid: Option<String>,
    #[serde(default)]
    is_available: bool,
    data_path: Option<PathBuf>,
}

/// Parse `simctl list -j devices` output.
///
/// Entries missing a name, udid or data path are skipped, as are unavailable
/// devices unless `include_unavailable` is set. Sorted by name.
pub fn from_simctl_json(
    json: &str,
    include_unavailable: bool,
) -> Result<Vec<DeviceDescriptor>, DeviceError> {
    let output: SimctlOutput = serde_json::from_str(json)?;

    let mut devices: Vec<DeviceDescriptor> = output
        .devices
        .into_iter()
        .flat_map(|(runtime, list)| {
            list.into_iter().filter_map(move |device| {
                if !device.is_available && !include_unavailable {
                    return None;
                }
                Some(DeviceDescriptor::new(
                    device.udid?,
                    device.name?,
                    runtime.clone(),
                    device.data_path?,
                ))
            })
        })
        .collect();

    devices.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    Ok(devices)
}

/// Run the configured simctl and parse its device list.
pub fn list_with_simctl(config: &SimulatorConfig) -> Result<Vec<DeviceDescriptor>, DeviceError> {
    let output = Command::new(&config.simctl)
        .args(["simctl", "list", "-j", "devices"])
        .output()
        .map_err(|e| DeviceError::CommandFailed {
            program: config.simctl.clone(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(DeviceError::CommandFailed {
            program: config.simctl.clone(),
            reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let devices = from_simctl_json(
        &String::from_utf8_lossy(&output.stdout),
        config.include_unavailable,
    )?;
    crate::debug_event!("devices", "simctl", "{} devices", devices.len());
    Ok(devices)
}

/// Enumerate devices from a CoreSimulator devices directory.
///
/// Each `<root>/<UDID>/device.plist` with `UDID`, `name` and `runtime` keys
/// yields a device whose data root is `<root>/<UDID>/data`. Anything else in
/// the directory is ignored.
pub fn scan_devices_root(root: &Path) -> Result<Vec<DeviceDescriptor>, DeviceError> {
    let mut devices = Vec::new();

    for entry in fs::read_dir(root)? {
        let Ok(entry) = entry else { continue };
        let dir = entry.path();
        let manifest = dir.join("device.plist");
        if !manifest.is_file() {
            continue;
        }

        match read_device_plist(&manifest) {
            Some((id, name, runtime)) => {
                devices.push(DeviceDescriptor::new(id, name, runtime, dir.join("data")));
            }
            None => {
                tracing::warn!("[devices] skipping unreadable {}", manifest.display());
            }
        }
    }

    devices.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
    crate::debug_event!(
        "devices",
        "scanned",
        "{} devices under {}",
        devices.len(),
        root.display()
    );
    Ok(devices)
}

fn read_device_plist(path: &Path) -> Option<(String, String, String)> {
    let value = plist::Value::from_file(path).ok()?;
    let dict = value.as_dictionary()?;
    let field = |key: &str| dict.get(key).and_then(|v| v.as_string()).map(str::to_string);
    Some((field("UDID")?, field("name")?, field("runtime").unwrap_or_default()))
}

/// Pick a device by exact id, else by case-insensitive name.
pub fn resolve<'a>(devices: &'a [DeviceDescriptor], selector: &str) -> Option<&'a DeviceDescriptor> {
    devices
        .iter()
        .find(|d| d.id == selector)
        .or_else(|| devices.iter().find(|d| d.name.eq_ignore_ascii_case(selector)))
}
