//! Date rendering for displayed preference values.
//!
//! A [`ValueFormatter`] is built once from `[display]` settings and handed to
//! every call that renders values.

use chrono::{DateTime, Local, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DateStyle {
    /// `5/31/25, 2:30 PM`
    Short,
    /// `May 31, 2025 at 2:30:00 PM`
    #[default]
    Medium,
    /// `May 31, 2025 at 2:30:00 PM +02:00`
    Long,
    /// `2025-05-31T12:30:00Z`
    Iso8601,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeZoneChoice {
    #[default]
    Local,
    Utc,
}

/// Renders dates in a fixed style and time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueFormatter {
    style: DateStyle,
    zone: TimeZoneChoice,
}

impl ValueFormatter {
    pub fn new(style: DateStyle, zone: TimeZoneChoice) -> Self {
        Self { style, zone }
    }

    pub fn format_date(&self, date: &DateTime<Utc>) -> String {
        match self.zone {
            TimeZoneChoice::Utc => render(self.style, date),
            TimeZoneChoice::Local => render(self.style, &date.with_timezone(&Local)),
        }
    }
}

impl Default for ValueFormatter {
    fn default() -> Self {
        Self::new(DateStyle::default(), TimeZoneChoice::default())
    }
}

fn render<Tz>(style: DateStyle, date: &DateTime<Tz>) -> String
where
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    match style {
        DateStyle::Short => date.format("%-m/%-d/%y, %-I:%M %p").to_string(),
        DateStyle::Medium => date.format("%b %-d, %Y at %-I:%M:%S %p").to_string(),
        DateStyle::Long => date.format("%B %-d, %Y at %-I:%M:%S %p %:z").to_string(),
        DateStyle::Iso8601 => date.to_rfc3339_opts(SecondsFormat::Secs, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 31, 14, 30, 5).unwrap()
    }

    #[test]
    fn test_styles_in_utc() {
        let date = sample();
        let fmt = |style| ValueFormatter::new(style, TimeZoneChoice::Utc).format_date(&date);

        assert_eq!(fmt(DateStyle::Short), "5/31/25, 2:30 PM");
        assert_eq!(fmt(DateStyle::Medium), "May 31, 2025 at 2:30:05 PM");
        assert_eq!(fmt(DateStyle::Long), "May 31, 2025 at 2:30:05 PM +00:00");
        assert_eq!(fmt(DateStyle::Iso8601), "2025-05-31T14:30:05Z");
    }

    #[test]
    fn test_style_names_deserialize() {
        #[derive(Deserialize)]
        struct Wrapper {
            style: DateStyle,
            zone: TimeZoneChoice,
        }
        let w: Wrapper = toml::from_str("style = \"iso8601\"\nzone = \"utc\"").unwrap();
        assert_eq!(w.style, DateStyle::Iso8601);
        assert_eq!(w.zone, TimeZoneChoice::Utc);
    }
}
