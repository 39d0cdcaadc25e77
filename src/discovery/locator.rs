//! Correlating data containers with installed bundles.
//!
//! A simulator keeps an app's writable data and its installed bundle in two
//! unrelated directories, each named by an opaque UUID:
//!
//! ```text
//! <data_root>/Containers/Data/Application/<UUID>/Library/Preferences/<bundle-id>.plist
//! <data_root>/Containers/Bundle/Application/<UUID>/<Name>.app/Info.plist
//! ```
//!
//! The preferences file name gives a candidate bundle identifier; the
//! manifest with the same `CFBundleIdentifier` gives the app its name.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crossbeam_channel::Receiver;
use rayon::prelude::*;
use serde::Serialize;
use walkdir::WalkDir;

use super::device::DeviceDescriptor;
use super::manifest::BundleManifest;

const ICON_CANDIDATES: &[&str] = &[
    "AppIcon60x60@2x.png",
    "AppIcon76x76@2x.png",
    "AppIcon60x60@3x.png",
    "AppIcon40x40@2x.png",
];

/// An installed application with a preferences document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationDescriptor {
    pub bundle_identifier: String,
    pub display_name: String,
    pub data_container: PathBuf,
    pub bundle_path: Option<PathBuf>,
}

impl ApplicationDescriptor {
    /// Path of the preferences document inside the data container.
    pub fn preferences_path(&self) -> PathBuf {
        preferences_dir(&self.data_container).join(format!("{}.plist", self.bundle_identifier))
    }

    /// Best-effort path to the app icon inside the bundle.
    ///
    /// Tries the usual `AppIcon*` file names first, then the last entry of
    /// the manifest's primary icon files.
    pub fn icon_path(&self) -> Option<PathBuf> {
        let bundle = self.bundle_path.as_ref()?;

        let mut names: Vec<String> = fs::read_dir(bundle)
            .ok()?
            .filter_map(Result::ok)
            .filter_map(|e| e.file_name().to_str().map(str::to_string))
            .collect();
        names.sort();

        for candidate in ICON_CANDIDATES {
            if let Some(found) = names.iter().find(|n| n.contains(candidate)) {
                return Some(bundle.join(found));
            }
        }

        let manifest = BundleManifest::read(bundle)?;
        let icon = manifest.icon_files.last()?;
        let file = if icon.ends_with(".png") {
            icon.clone()
        } else {
            format!("{icon}.png")
        };
        Some(bundle.join(file))
    }
}

/// A preferences document whose identifier matched no installed bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedContainer {
    pub bundle_identifier: String,
    pub data_container: PathBuf,
}

impl UnresolvedContainer {
    /// Treat the container as an application named after its identifier.
    pub fn to_descriptor(&self) -> ApplicationDescriptor {
        ApplicationDescriptor {
            bundle_identifier: self.bundle_identifier.clone(),
            display_name: self.bundle_identifier.clone(),
            data_container: self.data_container.clone(),
            bundle_path: None,
        }
    }
}

/// Result of scanning one device.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Discovery {
    /// Resolved applications, sorted by case-insensitive display name.
    pub applications: Vec<ApplicationDescriptor>,
    /// Preferences documents left out because no manifest matched them.
    pub unresolved: Vec<UnresolvedContainer>,
    /// Directories that could not be listed; each contributed nothing.
    pub unreadable: Vec<PathBuf>,
}

impl Discovery {
    pub fn is_complete(&self) -> bool {
        self.unreadable.is_empty()
    }

    /// Find an application by bundle identifier, falling back to an
    /// unresolved container with that identifier.
    pub fn find(&self, bundle_identifier: &str) -> Option<ApplicationDescriptor> {
        self.applications
            .iter()
            .find(|a| a.bundle_identifier == bundle_identifier)
            .cloned()
            .or_else(|| {
                self.unresolved
                    .iter()
                    .find(|u| u.bundle_identifier == bundle_identifier)
                    .map(UnresolvedContainer::to_descriptor)
            })
    }
}

/// Walks a device's data and bundle containers and pairs them up.
#[derive(Debug, Clone)]
pub struct ApplicationLocator {
    data_containers: PathBuf,
    bundle_containers: PathBuf,
}

impl Default for ApplicationLocator {
    fn default() -> Self {
        Self {
            data_containers: PathBuf::from("Containers/Data/Application"),
            bundle_containers: PathBuf::from("Containers/Bundle/Application"),
        }
    }
}

struct Candidate {
    bundle_identifier: String,
    data_container: PathBuf,
}

impl ApplicationLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn discover(&self, device: &DeviceDescriptor) -> Discovery {
        self.discover_in(&device.data_root)
    }

    /// Run [`discover`](Self::discover) on the rayon pool; the result arrives
    /// on the returned channel.
    pub fn discover_in_background(&self, device: &DeviceDescriptor) -> Receiver<Discovery> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        let locator = self.clone();
        let data_root = device.data_root.clone();
        rayon::spawn(move || {
            let _ = tx.send(locator.discover_in(&data_root));
        });
        rx
    }

    /// Scan the device whose data lives under `data_root`.
    pub fn discover_in(&self, data_root: &Path) -> Discovery {
        let mut unreadable = Vec::new();

        let candidates = self.scan_containers(&data_root.join(&self.data_containers), &mut unreadable);
        let manifests = self.scan_bundles(&data_root.join(&self.bundle_containers), &mut unreadable);

        let mut by_identifier: HashMap<&str, &BundleManifest> = HashMap::new();
        for manifest in &manifests {
            by_identifier
                .entry(manifest.identifier.as_str())
                .or_insert(manifest);
        }

        let mut seen = HashSet::new();
        let mut applications = Vec::new();
        let mut unresolved = Vec::new();

        for candidate in candidates {
            if !seen.insert(candidate.bundle_identifier.clone()) {
                continue;
            }
            match by_identifier.get(candidate.bundle_identifier.as_str()) {
                Some(manifest) => applications.push(ApplicationDescriptor {
                    display_name: manifest.best_name().to_string(),
                    bundle_identifier: candidate.bundle_identifier,
                    data_container: candidate.data_container,
                    bundle_path: Some(manifest.bundle_path.clone()),
                }),
                None => {
                    crate::debug_event!(
                        "discovery",
                        "unresolved",
                        "{}",
                        candidate.bundle_identifier
                    );
                    unresolved.push(UnresolvedContainer {
                        bundle_identifier: candidate.bundle_identifier,
                        data_container: candidate.data_container,
                    });
                }
            }
        }

        applications.sort_by(|a, b| {
            a.display_name
                .to_lowercase()
                .cmp(&b.display_name.to_lowercase())
                .then_with(|| a.bundle_identifier.cmp(&b.bundle_identifier))
        });

        crate::log_event!(
            "discovery",
            "scanned",
            "{} apps, {} unresolved, {} unreadable in {}",
            applications.len(),
            unresolved.len(),
            unreadable.len(),
            data_root.display()
        );

        Discovery {
            applications,
            unresolved,
            unreadable,
        }
    }

    /// One candidate per `*.plist` in each container's preferences directory.
    fn scan_containers(&self, root: &Path, unreadable: &mut Vec<PathBuf>) -> Vec<Candidate> {
        let Some(containers) = list_dir(root, unreadable) else {
            return Vec::new();
        };

        let mut candidates = Vec::new();
        for container in containers.into_iter().filter(|p| p.is_dir()) {
            let prefs = preferences_dir(&container);
            let files = match fs::read_dir(&prefs) {
                Ok(entries) => entries,
                // No preferences yet: nothing to inspect.
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    tracing::warn!("[discovery] cannot list {}: {e}", prefs.display());
                    unreadable.push(prefs);
                    continue;
                }
            };

            let mut names: Vec<PathBuf> = files
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| p.extension().is_some_and(|ext| ext == "plist"))
                .filter(|p| !is_hidden(p))
                .collect();
            names.sort();

            for file in names {
                if let Some(stem) = file.file_stem().and_then(|s| s.to_str()) {
                    candidates.push(Candidate {
                        bundle_identifier: stem.to_string(),
                        data_container: container.clone(),
                    });
                }
            }
        }
        candidates
    }

    /// Manifests of every `<UUID>/<Name>.app` under the bundle root.
    fn scan_bundles(&self, root: &Path, unreadable: &mut Vec<PathBuf>) -> Vec<BundleManifest> {
        let mut bundles = Vec::new();

        for entry in WalkDir::new(root)
            .min_depth(2)
            .max_depth(2)
            .sort_by_file_name()
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if entry.file_type().is_dir()
                        && path.extension().is_some_and(|ext| ext == "app")
                    {
                        bundles.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let path = e.path().unwrap_or(root).to_path_buf();
                    if e.io_error().map(|io| io.kind()) == Some(ErrorKind::NotFound) {
                        crate::debug_event!("discovery", "missing", "{}", path.display());
                    } else {
                        tracing::warn!("[discovery] cannot list {}: {e}", path.display());
                    }
                    unreadable.push(path);
                }
            }
        }

        bundles
            .par_iter()
            .filter_map(|bundle| BundleManifest::read(bundle))
            .collect()
    }
}

fn preferences_dir(container: &Path) -> PathBuf {
    container.join("Library").join("Preferences")
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('.'))
}

/// Sorted, non-hidden children of `dir`, or `None` (recorded) if it cannot be listed.
fn list_dir(dir: &Path, unreadable: &mut Vec<PathBuf>) -> Option<Vec<PathBuf>> {
    match fs::read_dir(dir) {
        Ok(entries) => {
            let mut paths: Vec<PathBuf> = entries
                .filter_map(Result::ok)
                .map(|e| e.path())
                .filter(|p| !is_hidden(p))
                .collect();
            paths.sort();
            Some(paths)
        }
        Err(e) => {
            if e.kind() == ErrorKind::NotFound {
                crate::debug_event!("discovery", "missing", "{}", dir.display());
            } else {
                tracing::warn!("[discovery] cannot list {}: {e}", dir.display());
            }
            unreadable.push(dir.to_path_buf());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    struct Sim {
        _temp: TempDir,
        root: PathBuf,
    }

    impl Sim {
        fn new() -> Self {
            let temp = TempDir::new().unwrap();
            let root = temp.path().join("data");
            fs::create_dir_all(root.join("Containers/Data/Application")).unwrap();
            fs::create_dir_all(root.join("Containers/Bundle/Application")).unwrap();
            Self { _temp: temp, root }
        }

        fn container(&self, uuid: &str, bundle_ids: &[&str]) -> PathBuf {
            let container = self.root.join("Containers/Data/Application").join(uuid);
            let prefs = container.join("Library/Preferences");
            fs::create_dir_all(&prefs).unwrap();
            for id in bundle_ids {
                plist::Value::Dictionary(plist::Dictionary::new())
                    .to_file_xml(prefs.join(format!("{id}.plist")))
                    .unwrap();
            }
            container
        }

        fn bundle(&self, uuid: &str, app: &str, id: &str, display: Option<&str>) -> PathBuf {
            let path = self
                .root
                .join("Containers/Bundle/Application")
                .join(uuid)
                .join(format!("{app}.app"));
            fs::create_dir_all(&path).unwrap();
            let mut dict = plist::Dictionary::new();
            dict.insert("CFBundleIdentifier".into(), plist::Value::String(id.into()));
            dict.insert("CFBundleName".into(), plist::Value::String(app.into()));
            if let Some(display) = display {
                dict.insert(
                    "CFBundleDisplayName".into(),
                    plist::Value::String(display.into()),
                );
            }
            plist::Value::Dictionary(dict)
                .to_file_xml(path.join("Info.plist"))
                .unwrap();
            path
        }
    }

    #[test]
    fn test_correlates_container_with_manifest() {
        let sim = Sim::new();
        let container = sim.container("C1", &["com.example.app"]);
        let bundle = sim.bundle("B1", "ExampleApp", "com.example.app", Some("Example"));

        let discovery = ApplicationLocator::new().discover_in(&sim.root);

        assert_eq!(discovery.applications.len(), 1);
        let app = &discovery.applications[0];
        assert_eq!(app.display_name, "Example");
        assert_eq!(app.bundle_identifier, "com.example.app");
        assert_eq!(app.data_container, container);
        assert_eq!(app.bundle_path.as_deref(), Some(bundle.as_path()));
        assert_eq!(
            app.preferences_path(),
            container.join("Library/Preferences/com.example.app.plist")
        );
        assert!(discovery.unresolved.is_empty());
        assert!(discovery.is_complete());
    }

    #[test]
    fn test_unmatched_container_is_skipped_but_counted() {
        let sim = Sim::new();
        sim.container("C1", &["com.example.orphan"]);
        sim.bundle("B1", "Other", "com.example.other", None);

        let discovery = ApplicationLocator::new().discover_in(&sim.root);

        assert!(discovery.applications.is_empty());
        assert_eq!(discovery.unresolved.len(), 1);
        assert_eq!(discovery.unresolved[0].bundle_identifier, "com.example.orphan");

        let fallback = discovery.find("com.example.orphan").unwrap();
        assert_eq!(fallback.display_name, "com.example.orphan");
        assert!(fallback.bundle_path.is_none());
    }

    #[test]
    fn test_containers_without_preferences_are_ignored() {
        let sim = Sim::new();
        fs::create_dir_all(sim.root.join("Containers/Data/Application/EMPTY/Documents")).unwrap();
        sim.bundle("B1", "App", "com.example.app", None);

        let discovery = ApplicationLocator::new().discover_in(&sim.root);
        assert!(discovery.applications.is_empty());
        assert!(discovery.unresolved.is_empty());
        assert!(discovery.is_complete());
    }

    #[test]
    fn test_duplicates_keep_first_and_sort_by_name() {
        let sim = Sim::new();
        let first = sim.container("A-first", &["com.example.zeta", "com.example.alpha"]);
        sim.container("B-second", &["com.example.zeta"]);
        sim.bundle("B1", "zeta", "com.example.zeta", Some("zeta"));
        sim.bundle("B2", "Alpha", "com.example.alpha", Some("Alpha"));
        sim.bundle("B3", "Mid", "com.example.mid", Some("mid"));
        sim.container("C-mid", &["com.example.mid"]);

        let discovery = ApplicationLocator::new().discover_in(&sim.root);
        let names: Vec<&str> = discovery
            .applications
            .iter()
            .map(|a| a.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["Alpha", "mid", "zeta"]);

        let zeta = discovery.find("com.example.zeta").unwrap();
        assert_eq!(zeta.data_container, first);
    }

    #[test]
    fn test_missing_directories_degrade_to_empty() {
        let temp = TempDir::new().unwrap();
        let discovery = ApplicationLocator::new().discover_in(&temp.path().join("nowhere"));

        assert!(discovery.applications.is_empty());
        assert_eq!(discovery.unreadable.len(), 2);
        assert!(!discovery.is_complete());
    }

    #[test]
    fn test_missing_bundle_dir_still_lists_unresolved() {
        let sim = Sim::new();
        fs::remove_dir_all(sim.root.join("Containers/Bundle")).unwrap();
        sim.container("C1", &["com.example.app"]);

        let discovery = ApplicationLocator::new().discover_in(&sim.root);
        assert!(discovery.applications.is_empty());
        assert_eq!(discovery.unresolved.len(), 1);
        assert_eq!(discovery.unreadable.len(), 1);
    }

    #[test]
    fn test_icon_path_prefers_known_names() {
        let sim = Sim::new();
        sim.container("C1", &["com.example.app"]);
        let bundle = sim.bundle("B1", "App", "com.example.app", None);
        fs::write(bundle.join("AppIcon60x60@2x.png"), b"png").unwrap();

        let discovery = ApplicationLocator::new().discover_in(&sim.root);
        assert_eq!(
            discovery.applications[0].icon_path(),
            Some(bundle.join("AppIcon60x60@2x.png"))
        );
    }

    #[test]
    fn test_background_discovery() {
        let sim = Sim::new();
        sim.container("C1", &["com.example.app"]);
        sim.bundle("B1", "App", "com.example.app", Some("Example"));
        let device = DeviceDescriptor::from_data_root(&sim.root);

        let rx = ApplicationLocator::new().discover_in_background(&device);
        let discovery = rx
            .recv_timeout(std::time::Duration::from_secs(10))
            .unwrap();
        assert_eq!(discovery.applications[0].display_name, "Example");
    }
}
