//! Logging setup for the library and the `simprefs` binary.
//!
//! Compact timestamped output on stderr with per-target level configuration,
//! so command output on stdout stays clean for piping.
//!
//! # Configuration
//!
//! ```toml
//! [logging]
//! default = "warn"    # quiet by default
//!
//! [logging.modules]
//! simprefs = "debug"  # everything from the library
//! ```
//!
//! # Environment Variable
//!
//! `RUST_LOG` takes precedence over config:
//! ```bash
//! RUST_LOG=debug simprefs list booted com.example.app
//! RUST_LOG=simprefs=trace simprefs watch booted com.example.app
//! ```

use std::sync::Once;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Compact time format: HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Build the filter directive string from config.
fn filter_directives(config: &LoggingConfig) -> String {
    let mut filter_str = config.default.clone();
    let mut modules: Vec<_> = config.modules.iter().collect();
    modules.sort();
    for (module, level) in modules {
        filter_str.push_str(&format!(",{module}={level}"));
    }
    filter_str
}

/// Initialize logging with configuration.
///
/// Call once at startup. Safe to call multiple times (only first call takes effect).
///
/// The `RUST_LOG` environment variable takes precedence over config settings.
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(filter_directives(config))
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_timer(CompactTime)
            .with_level(true)
            .with_filter(filter);

        tracing_subscriber::registry().with(fmt_layer).init();
    });
}

/// Log an event with component context.
///
/// # Examples
/// ```ignore
/// log_event!("watcher", "armed", "{}", path.display());
/// log_event!("session", "cleared");
/// ```
#[macro_export]
macro_rules! log_event {
    ($component:expr, $event:expr) => {
        tracing::info!("[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::info!("[{}] {}: {}", $component, $event, format!($($arg)*))
    };
}

/// Debug-only event logging.
///
/// # Examples
/// ```ignore
/// debug_event!("store", "saved", "{} keys", document.len());
/// ```
#[macro_export]
macro_rules! debug_event {
    ($component:expr, $event:expr) => {
        tracing::debug!("[{}] {}", $component, $event)
    };
    ($component:expr, $event:expr, $($arg:tt)*) => {
        tracing::debug!("[{}] {}: {}", $component, $event, format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_directives() {
        let mut config = LoggingConfig::default();
        assert_eq!(filter_directives(&config), "warn");

        config.modules.insert("simprefs::watcher".into(), "debug".into());
        config.modules.insert("notify".into(), "error".into());
        assert_eq!(
            filter_directives(&config),
            "warn,notify=error,simprefs::watcher=debug"
        );
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_with_config(&LoggingConfig::default());
        init_with_config(&LoggingConfig::default());
        crate::log_event!("test", "logged");
        crate::debug_event!("test", "logged", "{}", 1);
    }
}
