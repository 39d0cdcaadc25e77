//! Reading an installed bundle's `Info.plist`.

use std::path::{Path, PathBuf};

/// The parts of a bundle's metadata manifest discovery cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleManifest {
    pub identifier: String,
    pub display_name: Option<String>,
    pub name: Option<String>,
    pub executable: Option<String>,
    /// `CFBundleIcons.CFBundlePrimaryIcon.CFBundleIconFiles`, in manifest order.
    pub icon_files: Vec<String>,
    pub bundle_path: PathBuf,
}

impl BundleManifest {
    /// Read the manifest of the bundle at `bundle_path`.
    ///
    /// Looks for `Info.plist` at the bundle root (iOS layout) and then under
    /// `Contents/` (macOS layout). Returns `None` when neither parses or the
    /// identifier is missing.
    pub fn read(bundle_path: &Path) -> Option<Self> {
        let value = [
            bundle_path.join("Info.plist"),
            bundle_path.join("Contents").join("Info.plist"),
        ]
        .iter()
        .filter(|p| p.is_file())
        .find_map(|p| match plist::Value::from_file(p) {
            Ok(value) => Some(value),
            Err(e) => {
                crate::debug_event!("discovery", "bad manifest", "{}: {e}", p.display());
                None
            }
        })?;

        let dict = value.as_dictionary()?;
        let string = |key: &str| {
            dict.get(key)
                .and_then(plist::Value::as_string)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let icon_files = dict
            .get("CFBundleIcons")
            .and_then(plist::Value::as_dictionary)
            .and_then(|icons| icons.get("CFBundlePrimaryIcon"))
            .and_then(plist::Value::as_dictionary)
            .and_then(|primary| primary.get("CFBundleIconFiles"))
            .and_then(plist::Value::as_array)
            .map(|files| {
                files
                    .iter()
                    .filter_map(plist::Value::as_string)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Some(Self {
            identifier: string("CFBundleIdentifier")?,
            display_name: string("CFBundleDisplayName"),
            name: string("CFBundleName"),
            executable: string("CFBundleExecutable"),
            icon_files,
            bundle_path: bundle_path.to_path_buf(),
        })
    }

    /// Display name, falling back through the internal name and executable
    /// name to the identifier itself.
    pub fn best_name(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.name.as_deref())
            .or(self.executable.as_deref())
            .unwrap_or(&self.identifier)
    }
}
