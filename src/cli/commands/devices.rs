//! Devices and Apps commands.

use anyhow::Result;

use super::context;
use crate::cli::args::GlobalOptions;
use crate::cli::output::{apps_table, devices_table, dim, heading};
use crate::config::Settings;

/// Run devices command - list simulator devices.
pub fn run_devices(global: &GlobalOptions, settings: &Settings, json: bool) -> Result<()> {
    let devices = context::load_devices(global, settings)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    if devices.is_empty() {
        println!("No devices found.");
        return Ok(());
    }
    println!("{}", devices_table(&devices));
    Ok(())
}

/// Run apps command - list apps with a preferences file on a device.
pub fn run_apps(
    global: &GlobalOptions,
    settings: &Settings,
    selector: &str,
    json: bool,
) -> Result<()> {
    let device = context::select_device(global, settings, selector)?;
    let discovery = context::discover(&device);

    if json {
        println!("{}", serde_json::to_string_pretty(&discovery)?);
        return Ok(());
    }

    println!("{}", heading(&format!("Apps on {}", device.name)));
    if discovery.applications.is_empty() {
        println!("No apps with preferences found.");
    } else {
        println!("{}", apps_table(&discovery.applications));
    }

    if !discovery.unresolved.is_empty() {
        println!(
            "{}",
            dim(&format!(
                "{} container(s) have preferences but no matching installed bundle",
                discovery.unresolved.len()
            ))
        );
    }
    if !discovery.is_complete() {
        println!(
            "{}",
            dim(&format!(
                "{} director(ies) could not be read",
                discovery.unreadable.len()
            ))
        );
    }
    Ok(())
}
