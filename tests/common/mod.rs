//! Fabricated CoreSimulator trees for integration tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use plist::{Dictionary, Value};
use tempfile::TempDir;

pub struct SimulatorFixture {
    pub dir: TempDir,
}

impl SimulatorFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("Devices")).unwrap();
        Self { dir }
    }

    /// `<tmp>/Devices`, laid out like `~/Library/Developer/CoreSimulator/Devices`.
    pub fn devices_root(&self) -> PathBuf {
        self.dir.path().join("Devices")
    }

    /// Create a device and return its data root.
    pub fn add_device(&self, udid: &str, name: &str, runtime: &str) -> PathBuf {
        let device_dir = self.devices_root().join(udid);
        let data_root = device_dir.join("data");
        fs::create_dir_all(data_root.join("Containers/Data/Application")).unwrap();
        fs::create_dir_all(data_root.join("Containers/Bundle/Application")).unwrap();

        let mut dict = Dictionary::new();
        dict.insert("UDID".into(), Value::String(udid.into()));
        dict.insert("name".into(), Value::String(name.into()));
        dict.insert("runtime".into(), Value::String(runtime.into()));
        Value::Dictionary(dict)
            .to_file_xml(device_dir.join("device.plist"))
            .unwrap();
        data_root
    }

    /// Install an app bundle plus a data container holding `prefs`.
    /// Returns the preferences file path.
    pub fn install_app(
        &self,
        data_root: &Path,
        bundle_id: &str,
        display_name: &str,
        prefs: &[(&str, Value)],
    ) -> PathBuf {
        let bundle = data_root
            .join("Containers/Bundle/Application")
            .join(format!("BUNDLE-{bundle_id}"))
            .join(format!("{display_name}.app"));
        fs::create_dir_all(&bundle).unwrap();

        let mut info = Dictionary::new();
        info.insert("CFBundleIdentifier".into(), Value::String(bundle_id.into()));
        info.insert("CFBundleDisplayName".into(), Value::String(display_name.into()));
        info.insert("CFBundleExecutable".into(), Value::String("App".into()));
        Value::Dictionary(info)
            .to_file_xml(bundle.join("Info.plist"))
            .unwrap();

        self.add_container(data_root, bundle_id, prefs)
    }

    /// A data container with preferences but no installed bundle.
    pub fn add_container(&self, data_root: &Path, bundle_id: &str, prefs: &[(&str, Value)]) -> PathBuf {
        let prefs_dir = data_root
            .join("Containers/Data/Application")
            .join(format!("DATA-{bundle_id}"))
            .join("Library/Preferences");
        fs::create_dir_all(&prefs_dir).unwrap();

        let path = prefs_dir.join(format!("{bundle_id}.plist"));
        write_prefs(&path, prefs);
        path
    }
}

/// Overwrite a preferences file the way an outside process would.
pub fn write_prefs(path: &Path, prefs: &[(&str, Value)]) {
    let mut dict = Dictionary::new();
    for (key, value) in prefs {
        dict.insert((*key).to_string(), value.clone());
    }
    Value::Dictionary(dict).to_file_binary(path).unwrap();
}

pub fn read_prefs(path: &Path) -> Dictionary {
    Value::from_file(path)
        .unwrap()
        .into_dictionary()
        .unwrap()
}
