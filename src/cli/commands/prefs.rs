//! Preference commands: list, get, set, delete, clear.

use anyhow::{Result, bail};

use super::context::open_session;
use crate::cli::args::{GlobalOptions, TargetArgs};
use crate::cli::output::{entries_json, entries_table};
use crate::config::Settings;
use crate::preferences::{PrefValue, PreferencesError, ValueKind};

/// Run list command - print an app's preferences.
pub fn run_list(
    global: &GlobalOptions,
    settings: &Settings,
    target: &TargetArgs,
    filter: Option<&str>,
    json: bool,
) -> Result<()> {
    let session = open_session(global, settings, target)?;
    let entries = session.filtered(filter.unwrap_or_default());

    if json {
        println!("{}", serde_json::to_string_pretty(&entries_json(&entries))?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No preferences.");
    } else {
        println!("{}", entries_table(&entries, &settings.formatter()));
    }
    Ok(())
}

/// Run get command - print one value.
pub fn run_get(
    global: &GlobalOptions,
    settings: &Settings,
    target: &TargetArgs,
    key: &str,
    json: bool,
) -> Result<()> {
    let session = open_session(global, settings, target)?;
    let Some(value) = session.get(key) else {
        return Err(PreferencesError::KeyNotFound(key.to_string()).into());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&value.to_json())?);
    } else {
        match &value {
            PrefValue::Array(_) | PrefValue::Dictionary(_) => println!("{}", value.edit_text()),
            other => println!("{}", other.display(&settings.formatter())),
        }
    }
    Ok(())
}

/// Run set command.
///
/// With `--kind` the text is parsed as that kind. Without it an existing key
/// keeps its kind and a new key is stored as a string.
pub fn run_set(
    global: &GlobalOptions,
    settings: &Settings,
    target: &TargetArgs,
    key: &str,
    text: &str,
    kind: Option<ValueKind>,
) -> Result<()> {
    let session = open_session(global, settings, target)?;

    match kind {
        Some(kind) => session.set_value(key, PrefValue::parse(kind, text)?)?,
        None if session.get(key).is_some() => session.update_from_text(key, text)?,
        None => session.add(key, PrefValue::String(text.to_string()))?,
    }

    if let Some(value) = session.get(key) {
        println!(
            "{key} = {} ({})",
            value.display(&settings.formatter()),
            value.kind()
        );
    }
    Ok(())
}

/// Run delete command.
pub fn run_delete(
    global: &GlobalOptions,
    settings: &Settings,
    target: &TargetArgs,
    key: &str,
) -> Result<()> {
    let session = open_session(global, settings, target)?;
    if session.get(key).is_none() {
        return Err(PreferencesError::KeyNotFound(key.to_string()).into());
    }
    session.delete(key)?;
    println!("Deleted {key}");
    Ok(())
}

/// Run clear command.
pub fn run_clear(
    global: &GlobalOptions,
    settings: &Settings,
    target: &TargetArgs,
    yes: bool,
) -> Result<()> {
    if !yes {
        bail!("Refusing to remove every key without --yes");
    }
    let session = open_session(global, settings, target)?;
    let removed = session.entries().len();
    session.clear_all()?;
    println!("Removed {removed} key(s) from {}", target.bundle_id);
    Ok(())
}
