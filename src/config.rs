//! Configuration module for simprefs.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//! - CLI argument overrides (applied by the binary after loading)
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `SIMPREFS_` and use double
//! underscores to separate nested levels:
//! - `SIMPREFS_WATCHER__DEBOUNCE_MS=50` sets `watcher.debounce_ms`
//! - `SIMPREFS_DOCUMENT__FORMAT=binary` sets `document.format`
//! - `SIMPREFS_SIMULATOR__DEVICES_ROOT=/tmp/devices` sets `simulator.devices_root`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::preferences::{DateStyle, DocumentFormat, DocumentStore, TimeZoneChoice, ValueFormatter};

/// Directory holding a project-local settings file.
pub const CONFIG_DIR: &str = ".simprefs";
const CONFIG_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "SIMPREFS_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Where simulator devices live and how to enumerate them
    #[serde(default)]
    pub simulator: SimulatorConfig,

    /// How preference documents are written
    #[serde(default)]
    pub document: DocumentConfig,

    /// Change watcher tuning
    #[serde(default)]
    pub watcher: WatcherConfig,

    /// Value rendering
    #[serde(default)]
    pub display: DisplayConfig,

    /// Log levels
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SimulatorConfig {
    /// CoreSimulator devices directory, scanned when simctl is unavailable
    #[serde(default = "default_devices_root")]
    pub devices_root: PathBuf,

    /// Program used to run `simctl` (invoked as `<simctl> simctl list -j devices`)
    #[serde(default = "default_simctl")]
    pub simctl: String,

    /// List devices whose runtime is not installed
    #[serde(default)]
    pub include_unavailable: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct DocumentConfig {
    /// Property-list encoding for writes: "xml" or "binary"
    #[serde(default)]
    pub format: DocumentFormat,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct WatcherConfig {
    /// Quiet period before a burst of file events is reported
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct DisplayConfig {
    #[serde(default)]
    pub date_style: DateStyle,

    #[serde(default)]
    pub timezone: TimeZoneChoice,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Default level for all targets: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-target overrides, e.g. `watcher = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_version() -> u32 { 1 }
fn default_simctl() -> String { "xcrun".to_string() }
fn default_debounce_ms() -> u64 { 150 }
fn default_log_level() -> String { "warn".to_string() }

fn default_devices_root() -> PathBuf {
    let relative = Path::new("Library/Developer/CoreSimulator/Devices");
    dirs::home_dir()
        .map(|home| home.join(relative))
        .unwrap_or_else(|| relative.to_path_buf())
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            simulator: SimulatorConfig::default(),
            document: DocumentConfig::default(),
            watcher: WatcherConfig::default(),
            display: DisplayConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            devices_root: default_devices_root(),
            simctl: default_simctl(),
            include_unavailable: false,
        }
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl WatcherConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        match Self::config_path() {
            Some(path) => Self::load_from(path),
            None => Self::figment(None).extract().map_err(Box::new),
        }
    }

    /// Load configuration from a specific file, still honouring env overrides
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(Some(path.as_ref())).extract().map_err(Box::new)
    }

    fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::new().merge(Serialized::defaults(Settings::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        // Double underscore separates nested levels; single underscores stay
        // inside field names.
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// The settings file `load` would read.
    ///
    /// Searches from the current directory up for `.simprefs/settings.toml`,
    /// then falls back to the user configuration directory.
    pub fn config_path() -> Option<PathBuf> {
        Self::find_workspace_config().or_else(|| {
            let user = dirs::config_dir()?.join("simprefs").join(CONFIG_FILE);
            user.exists().then_some(user)
        })
    }

    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join(CONFIG_FILE));
            }
        }

        None
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file at `.simprefs/settings.toml` in the
    /// current directory.
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(CONFIG_DIR).join(CONFIG_FILE);
        Self::init_config_file_at(&config_path, force)?;
        Ok(config_path)
    }

    /// Write default settings to `path` unless it already exists.
    pub fn init_config_file_at(path: &Path, force: bool) -> Result<(), Box<dyn std::error::Error>> {
        if !force && path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }
        Settings::default().save(path)
    }

    /// Date formatter built from `[display]`.
    pub fn formatter(&self) -> ValueFormatter {
        ValueFormatter::new(self.display.date_style, self.display.timezone)
    }

    /// Document store writing in the configured format.
    pub fn store(&self) -> DocumentStore {
        DocumentStore::new(self.document.format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.simulator.simctl, "xcrun");
        assert!(
            settings
                .simulator
                .devices_root
                .ends_with("Library/Developer/CoreSimulator/Devices")
        );
        assert_eq!(settings.document.format, DocumentFormat::Xml);
        assert_eq!(settings.display.date_style, DateStyle::Medium);
        assert_eq!(settings.logging.default, "warn");
    }

    #[test]
    fn test_load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");

        let toml_content = r#"
version = 2

[simulator]
devices_root = "/tmp/devices"
include_unavailable = true

[document]
format = "binary"

[display]
date_style = "iso8601"
timezone = "utc"

[logging.modules]
watcher = "debug"
"#;

        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.version, 2);
        assert_eq!(settings.simulator.devices_root, PathBuf::from("/tmp/devices"));
        assert!(settings.simulator.include_unavailable);
        assert_eq!(settings.document.format, DocumentFormat::Binary);
        assert_eq!(settings.display.date_style, DateStyle::Iso8601);
        assert_eq!(settings.display.timezone, TimeZoneChoice::Utc);
        assert_eq!(settings.logging.modules["watcher"], "debug");
        // Untouched sections keep their defaults
        assert_eq!(settings.simulator.simctl, "xcrun");
        assert_eq!(settings.store().format(), DocumentFormat::Binary);
    }

    #[test]
    fn test_save_settings() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("settings.toml");

        let mut settings = Settings::default();
        settings.simulator.simctl = "/usr/local/bin/xcrun".to_string();
        settings.display.date_style = DateStyle::Long;

        settings.save(&config_path).unwrap();

        let loaded = Settings::load_from(&config_path).unwrap();
        assert_eq!(loaded.simulator.simctl, "/usr/local/bin/xcrun");
        assert_eq!(loaded.display.date_style, DateStyle::Long);
    }

    #[test]
    fn test_invalid_value_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "[document]\nformat = \"yaml\"\n").unwrap();

        assert!(Settings::load_from(&config_path).is_err());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join(CONFIG_DIR).join(CONFIG_FILE);

        Settings::init_config_file_at(&config_path, false).unwrap();
        assert!(config_path.exists());
        assert!(Settings::init_config_file_at(&config_path, false).is_err());
        assert!(Settings::init_config_file_at(&config_path, true).is_ok());

        let loaded = Settings::load_from(&config_path).unwrap();
        assert_eq!(loaded.simulator.simctl, "xcrun");
    }

    #[test]
    fn test_env_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("settings.toml");
        fs::write(&config_path, "[watcher]\ndebounce_ms = 500\n").unwrap();

        unsafe {
            std::env::set_var("SIMPREFS_WATCHER__DEBOUNCE_MS", "42");
        }
        let settings = Settings::load_from(&config_path).unwrap();
        unsafe {
            std::env::remove_var("SIMPREFS_WATCHER__DEBOUNCE_MS");
        }

        assert_eq!(settings.watcher.debounce_ms, 42);
        assert_eq!(settings.watcher.debounce(), Duration::from_millis(42));
    }
}
