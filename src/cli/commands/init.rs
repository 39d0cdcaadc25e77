//! Init and Config commands.

use anyhow::{Result, anyhow};

use crate::cli::output::dim;
use crate::config::Settings;

/// Run init command - create configuration file.
pub fn run_init(force: bool) -> Result<()> {
    let path = Settings::init_config_file(force).map_err(|e| anyhow!("{e}"))?;
    println!("Created configuration file at: {}", path.display());
    println!("Edit this file to customize your settings.");
    Ok(())
}

/// Run config command - display current configuration.
pub fn run_config(config: &Settings, source: Option<&std::path::Path>) -> Result<()> {
    match source {
        Some(path) => println!("{}", dim(&format!("# Loaded from {}", path.display()))),
        None => println!("{}", dim("# Defaults (no settings file found)")),
    }
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
