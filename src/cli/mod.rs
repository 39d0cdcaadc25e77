//! CLI module for simprefs.
//!
//! Provides command-line interface parsing and command dispatch.

pub mod args;
pub mod commands;
pub mod output;

pub use args::{Cli, Commands, GlobalOptions, TargetArgs};

use anyhow::{Context, Result};

use crate::config::Settings;

/// Load settings, honouring `--config`.
pub fn load_settings(global: &GlobalOptions) -> Result<(Settings, Option<std::path::PathBuf>)> {
    match &global.config {
        Some(path) => {
            let settings = Settings::load_from(path)
                .with_context(|| format!("Cannot load configuration from {}", path.display()))?;
            Ok((settings, Some(path.clone())))
        }
        None => {
            let settings = Settings::load().context("Cannot load configuration")?;
            Ok((settings, Settings::config_path()))
        }
    }
}

/// Dispatch a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let (settings, source) = load_settings(&cli.global)?;
    crate::logging::init_with_config(&settings.logging);
    crate::debug_event!(
        "cli",
        "settings",
        "{}",
        source
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "defaults".to_string())
    );

    let global = &cli.global;
    match &cli.command {
        Commands::Devices { json } => commands::devices::run_devices(global, &settings, *json),
        Commands::Apps { device, json } => {
            commands::devices::run_apps(global, &settings, device, *json)
        }
        Commands::List {
            target,
            filter,
            json,
        } => commands::prefs::run_list(global, &settings, target, filter.as_deref(), *json),
        Commands::Get { target, key, json } => {
            commands::prefs::run_get(global, &settings, target, key, *json)
        }
        Commands::Set {
            target,
            key,
            value,
            kind,
        } => commands::prefs::run_set(global, &settings, target, key, value, *kind),
        Commands::Delete { target, key } => {
            commands::prefs::run_delete(global, &settings, target, key)
        }
        Commands::Clear { target, yes } => {
            commands::prefs::run_clear(global, &settings, target, *yes)
        }
        Commands::Watch {
            target,
            filter,
            max_changes,
        } => commands::watch::run_watch(
            global,
            &settings,
            target,
            filter.as_deref(),
            *max_changes,
        ),
        Commands::Init { force } => commands::init::run_init(*force),
        Commands::Config => commands::init::run_config(&settings, source.as_deref()),
    }
}
