//! CLI argument parsing using clap.
//!
//! Contains the Cli struct and the Commands enum.

use clap::{
    Args, Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

use crate::preferences::ValueKind;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

const AFTER_HELP: &str = "Examples:
  simprefs devices
  simprefs apps \"iPhone 15\"
  simprefs list \"iPhone 15\" com.example.app --filter onboarding
  simprefs set \"iPhone 15\" com.example.app launchCount 3 --kind integer
  simprefs watch \"iPhone 15\" com.example.app
  simprefs --data-root ./fixture/data list - com.example.app";

/// Inspect and live-edit simulator app preferences
#[derive(Parser, Debug)]
#[command(
    name = "simprefs",
    version = env!("CARGO_PKG_VERSION"),
    about = "Inspect and live-edit simulator app preferences",
    long_about = "Discover the apps installed in local simulators and read, edit, and watch their preference files.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = AFTER_HELP
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOptions,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalOptions {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true, env = "SIMPREFS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Scan this CoreSimulator devices directory instead of running simctl
    #[arg(long, global = true, value_name = "PATH")]
    pub devices_root: Option<PathBuf>,

    /// Treat this directory as the data root of a single device; DEVICE is then ignored
    #[arg(long, global = true, value_name = "PATH", conflicts_with = "devices_root")]
    pub data_root: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List simulator devices
    #[command(about = "List simulator devices")]
    Devices {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List the apps installed on a device
    #[command(about = "List apps with a preferences file on a device")]
    Apps {
        /// Device name or UDID
        device: String,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show an app's preferences
    #[command(about = "Show an app's preferences, sorted by key")]
    List {
        #[command(flatten)]
        target: TargetArgs,

        /// Only keys containing this text (case-insensitive)
        #[arg(short, long)]
        filter: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print one value
    #[command(about = "Print the value stored under a key")]
    Get {
        #[command(flatten)]
        target: TargetArgs,

        key: String,

        /// Print the value as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set a value
    #[command(
        about = "Set a key, keeping the existing value's type unless --kind is given",
        after_help = "Kinds: string, integer, real, boolean, date (RFC 3339), data (hex), array (JSON), dictionary (JSON)"
    )]
    Set {
        #[command(flatten)]
        target: TargetArgs,

        key: String,

        value: String,

        /// Value type; new keys default to string
        #[arg(short, long)]
        kind: Option<ValueKind>,
    },

    /// Remove a key
    #[command(about = "Remove a key")]
    Delete {
        #[command(flatten)]
        target: TargetArgs,

        key: String,
    },

    /// Remove every key
    #[command(about = "Remove every key from an app's preferences")]
    Clear {
        #[command(flatten)]
        target: TargetArgs,

        /// Confirm clearing
        #[arg(long)]
        yes: bool,
    },

    /// Follow an app's preferences as they change
    #[command(about = "Print an app's preferences and reprint them on every change")]
    Watch {
        #[command(flatten)]
        target: TargetArgs,

        /// Only keys containing this text (case-insensitive)
        #[arg(short, long)]
        filter: Option<String>,

        /// Exit after this many changes
        #[arg(long, value_name = "N")]
        max_changes: Option<usize>,
    },

    /// Initialize project
    #[command(about = "Create .simprefs/settings.toml with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings")]
    Config,
}

/// Device and app selection for preference commands.
#[derive(Args, Debug, Clone)]
pub struct TargetArgs {
    /// Device name or UDID
    pub device: String,

    /// Bundle identifier of the app
    pub bundle_id: String,
}
