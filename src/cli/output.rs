//! Terminal rendering for command output.

use comfy_table::{ContentArrangement, Table, presets};
use console::style;

use crate::discovery::{ApplicationDescriptor, DeviceDescriptor};
use crate::preferences::{PreferenceEntry, ValueFormatter};

/// Section heading, styled when the terminal supports it.
pub fn heading(text: &str) -> String {
    style(text).cyan().bold().to_string()
}

/// Secondary text such as counts and hints.
pub fn dim(text: &str) -> String {
    style(text).dim().to_string()
}

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_HORIZONTAL_ONLY)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn devices_table(devices: &[DeviceDescriptor]) -> Table {
    let mut table = table(vec!["Name", "Runtime", "UDID"]);
    for device in devices {
        table.add_row(vec![
            device.name.clone(),
            device.runtime_display(),
            device.id.clone(),
        ]);
    }
    table
}

pub fn apps_table(apps: &[ApplicationDescriptor]) -> Table {
    let mut table = table(vec!["Name", "Bundle ID", "Container"]);
    for app in apps {
        table.add_row(vec![
            app.display_name.clone(),
            app.bundle_identifier.clone(),
            app.data_container.display().to_string(),
        ]);
    }
    table
}

pub fn entries_table(entries: &[PreferenceEntry], formatter: &ValueFormatter) -> Table {
    let mut table = table(vec!["Key", "Type", "Value"]);
    for entry in entries {
        table.add_row(vec![
            entry.key.clone(),
            entry.value.kind().to_string(),
            entry.value.display(formatter),
        ]);
    }
    table
}

/// Entries as a JSON object keyed by preference key.
pub fn entries_json(entries: &[PreferenceEntry]) -> serde_json::Value {
    let map = entries
        .iter()
        .map(|entry| (entry.key.clone(), entry.value.to_json()))
        .collect::<serde_json::Map<_, _>>();
    serde_json::Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preferences::PrefValue;

    #[test]
    fn test_entries_table_shows_kind_and_summary() {
        let entries = vec![
            PreferenceEntry::new("blob", PrefValue::Data(vec![1, 2, 3])),
            PreferenceEntry::new("count", 4),
        ];
        let rendered = entries_table(&entries, &ValueFormatter::default()).to_string();
        assert!(rendered.contains("blob"));
        assert!(rendered.contains("<3 bytes>"));
        assert!(rendered.contains("integer"));
    }

    #[test]
    fn test_entries_json() {
        let entries = vec![
            PreferenceEntry::new("flag", true),
            PreferenceEntry::new("name", "x"),
        ];
        let json = entries_json(&entries);
        assert_eq!(json, serde_json::json!({ "flag": true, "name": "x" }));
    }
}
