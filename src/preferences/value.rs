//! The closed set of value kinds a preference document can hold.
//!
//! [`PrefValue`] mirrors the property-list data model so that every stored
//! value survives a load/save cycle with its type intact: an integer stays an
//! integer, a date stays a date. Conversions to and from [`plist::Value`] live
//! here; the string renderings used for display and deduplication are
//! [`PrefValue::canonical`] and [`PrefValue::display`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, Utc};
use plist::Integer;

use super::error::{PrefResult, PreferencesError};
use super::format::ValueFormatter;

/// A single preference value.
///
/// Equality is structural and type-aware (`Integer(1) != Real(1.0)`).
#[derive(Debug, Clone, PartialEq)]
pub enum PrefValue {
    String(String),
    Integer(Integer),
    Real(f64),
    Boolean(bool),
    Date(DateTime<Utc>),
    Data(Vec<u8>),
    Array(Vec<PrefValue>),
    Dictionary(BTreeMap<String, PrefValue>),
}

/// Discriminant of [`PrefValue`], used when parsing user-entered text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    Integer,
    Real,
    Boolean,
    Date,
    Data,
    Array,
    Dictionary,
}

impl ValueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueKind::String => "string",
            ValueKind::Integer => "integer",
            ValueKind::Real => "real",
            ValueKind::Boolean => "boolean",
            ValueKind::Date => "date",
            ValueKind::Data => "data",
            ValueKind::Array => "array",
            ValueKind::Dictionary => "dictionary",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "string" | "str" => Ok(ValueKind::String),
            "integer" | "int" => Ok(ValueKind::Integer),
            "real" | "float" | "double" => Ok(ValueKind::Real),
            "boolean" | "bool" => Ok(ValueKind::Boolean),
            "date" => Ok(ValueKind::Date),
            "data" => Ok(ValueKind::Data),
            "array" => Ok(ValueKind::Array),
            "dictionary" | "dict" => Ok(ValueKind::Dictionary),
            other => Err(format!(
                "unknown value kind '{other}' (expected string, integer, real, boolean, date, data, array or dictionary)"
            )),
        }
    }
}

impl PrefValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            PrefValue::String(_) => ValueKind::String,
            PrefValue::Integer(_) => ValueKind::Integer,
            PrefValue::Real(_) => ValueKind::Real,
            PrefValue::Boolean(_) => ValueKind::Boolean,
            PrefValue::Date(_) => ValueKind::Date,
            PrefValue::Data(_) => ValueKind::Data,
            PrefValue::Array(_) => ValueKind::Array,
            PrefValue::Dictionary(_) => ValueKind::Dictionary,
        }
    }

    /// Parse user-entered text as a value of the given kind.
    ///
    /// Dates are RFC 3339, data is hex (an optional `0x` prefix is accepted),
    /// arrays and dictionaries are JSON.
    pub fn parse(kind: ValueKind, text: &str) -> PrefResult<Self> {
        let invalid = |reason: String| PreferencesError::InvalidValue {
            kind: kind.to_string(),
            text: text.to_string(),
            reason,
        };

        match kind {
            ValueKind::String => Ok(PrefValue::String(text.to_string())),
            ValueKind::Integer => {
                let trimmed = text.trim();
                if let Ok(n) = trimmed.parse::<i64>() {
                    Ok(PrefValue::Integer(n.into()))
                } else {
                    trimmed
                        .parse::<u64>()
                        .map(|n| PrefValue::Integer(n.into()))
                        .map_err(|e| invalid(e.to_string()))
                }
            }
            ValueKind::Real => text
                .trim()
                .parse::<f64>()
                .map(PrefValue::Real)
                .map_err(|e| invalid(e.to_string())),
            ValueKind::Boolean => match text.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" | "1" => Ok(PrefValue::Boolean(true)),
                "false" | "no" | "0" => Ok(PrefValue::Boolean(false)),
                _ => Err(invalid("expected true/false, yes/no or 1/0".to_string())),
            },
            ValueKind::Date => DateTime::parse_from_rfc3339(text.trim())
                .map(|dt| PrefValue::Date(dt.with_timezone(&Utc)))
                .map_err(|e| invalid(e.to_string())),
            ValueKind::Data => decode_hex(text.trim()).map(PrefValue::Data).map_err(invalid),
            ValueKind::Array | ValueKind::Dictionary => {
                let json: serde_json::Value =
                    serde_json::from_str(text).map_err(|e| invalid(e.to_string()))?;
                let value = PrefValue::try_from(json).map_err(|e| invalid(e.to_string()))?;
                if value.kind() != kind {
                    return Err(invalid(format!("JSON text is a {}", value.kind())));
                }
                Ok(value)
            }
        }
    }

    /// Deterministic full rendering of the value.
    ///
    /// Used for entry identity and deduplication only. Different kinds can
    /// render identically (`Integer(1)` and `Real(1.0)` both give `"1"`), so
    /// this is never a substitute for `==`.
    pub fn canonical(&self) -> String {
        match self {
            PrefValue::String(s) => s.clone(),
            PrefValue::Integer(n) => integer_to_string(n),
            PrefValue::Real(r) => r.to_string(),
            PrefValue::Boolean(b) => b.to_string(),
            PrefValue::Date(d) => d.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            PrefValue::Data(bytes) => format!("<{}>", hex::encode(bytes)),
            PrefValue::Array(items) => {
                let inner: Vec<String> = items.iter().map(PrefValue::canonical).collect();
                format!("[{}]", inner.join(", "))
            }
            PrefValue::Dictionary(map) => {
                let inner: Vec<String> = map
                    .iter()
                    .map(|(k, v)| format!("{k} = {}", v.canonical()))
                    .collect();
                format!("{{{}}}", inner.join(", "))
            }
        }
    }

    /// Short human-readable rendering for tables.
    pub fn display(&self, formatter: &ValueFormatter) -> String {
        match self {
            PrefValue::Date(d) => formatter.format_date(d),
            PrefValue::Data(bytes) => format!("<{} bytes>", bytes.len()),
            PrefValue::Array(items) => format!("[{} items]", items.len()),
            PrefValue::Dictionary(map) => format!("{{{} keys}}", map.len()),
            scalar => scalar.canonical(),
        }
    }

    /// Like `==`, but reals compare by bit pattern, so a `NaN` is identical
    /// to itself. Used to tell whether a reloaded file changed anything.
    pub fn identical(&self, other: &PrefValue) -> bool {
        match (self, other) {
            (PrefValue::Real(a), PrefValue::Real(b)) => a.to_bits() == b.to_bits(),
            (PrefValue::Array(a), PrefValue::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.identical(y))
            }
            (PrefValue::Dictionary(a), PrefValue::Dictionary(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.identical(vb))
            }
            (a, b) => a == b,
        }
    }

    /// Text suitable for editing: scalars as `canonical`, containers as JSON.
    pub fn edit_text(&self) -> String {
        match self {
            PrefValue::Array(_) | PrefValue::Dictionary(_) => self.to_json().to_string(),
            other => other.canonical(),
        }
    }

    /// JSON projection for machine-readable output.
    ///
    /// Dates and data are wrapped in single-key objects (`{"$date": ..}`,
    /// `{"$data": ..}`) so they stay distinguishable from strings.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::{Value, json};

        match self {
            PrefValue::String(s) => Value::String(s.clone()),
            PrefValue::Integer(n) => match (n.as_signed(), n.as_unsigned()) {
                (Some(i), _) => json!(i),
                (None, Some(u)) => json!(u),
                (None, None) => Value::Null,
            },
            PrefValue::Real(r) => json!(r),
            PrefValue::Boolean(b) => Value::Bool(*b),
            PrefValue::Date(d) => json!({ "$date": d.to_rfc3339_opts(SecondsFormat::AutoSi, true) }),
            PrefValue::Data(bytes) => json!({ "$data": hex::encode(bytes) }),
            PrefValue::Array(items) => Value::Array(items.iter().map(PrefValue::to_json).collect()),
            PrefValue::Dictionary(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for PrefValue {
    fn from(s: &str) -> Self {
        PrefValue::String(s.to_string())
    }
}

impl From<String> for PrefValue {
    fn from(s: String) -> Self {
        PrefValue::String(s)
    }
}

impl From<i64> for PrefValue {
    fn from(n: i64) -> Self {
        PrefValue::Integer(n.into())
    }
}

impl From<i32> for PrefValue {
    fn from(n: i32) -> Self {
        PrefValue::Integer(i64::from(n).into())
    }
}

impl From<f64> for PrefValue {
    fn from(r: f64) -> Self {
        PrefValue::Real(r)
    }
}

impl From<bool> for PrefValue {
    fn from(b: bool) -> Self {
        PrefValue::Boolean(b)
    }
}

impl From<DateTime<Utc>> for PrefValue {
    fn from(d: DateTime<Utc>) -> Self {
        PrefValue::Date(d)
    }
}

impl From<Vec<u8>> for PrefValue {
    fn from(bytes: Vec<u8>) -> Self {
        PrefValue::Data(bytes)
    }
}

impl TryFrom<plist::Value> for PrefValue {
    type Error = PreferencesError;

    fn try_from(value: plist::Value) -> Result<Self, Self::Error> {
        Ok(match value {
            plist::Value::String(s) => PrefValue::String(s),
            plist::Value::Integer(n) => PrefValue::Integer(n),
            plist::Value::Real(r) => PrefValue::Real(r),
            plist::Value::Boolean(b) => PrefValue::Boolean(b),
            plist::Value::Date(d) => PrefValue::Date(DateTime::<Utc>::from(SystemTime::from(d))),
            plist::Value::Data(bytes) => PrefValue::Data(bytes),
            // Keyed-archive references; only seen in archived blobs, never as a
            // top-level defaults value.
            plist::Value::Uid(uid) => PrefValue::Integer(uid.get().into()),
            plist::Value::Array(items) => PrefValue::Array(
                items
                    .into_iter()
                    .map(PrefValue::try_from)
                    .collect::<PrefResult<_>>()?,
            ),
            plist::Value::Dictionary(dict) => PrefValue::Dictionary(
                dict.into_iter()
                    .map(|(k, v)| PrefValue::try_from(v).map(|v| (k, v)))
                    .collect::<PrefResult<_>>()?,
            ),
            other => {
                return Err(PreferencesError::UnsupportedValue {
                    kind: format!("{other:?}"),
                });
            }
        })
    }
}

impl From<&PrefValue> for plist::Value {
    fn from(value: &PrefValue) -> Self {
        match value {
            PrefValue::String(s) => plist::Value::String(s.clone()),
            PrefValue::Integer(n) => plist::Value::Integer(*n),
            PrefValue::Real(r) => plist::Value::Real(*r),
            PrefValue::Boolean(b) => plist::Value::Boolean(*b),
            PrefValue::Date(d) => plist::Value::Date(plist::Date::from(SystemTime::from(*d))),
            PrefValue::Data(bytes) => plist::Value::Data(bytes.clone()),
            PrefValue::Array(items) => {
                plist::Value::Array(items.iter().map(plist::Value::from).collect())
            }
            PrefValue::Dictionary(map) => {
                let mut dict = plist::Dictionary::new();
                for (k, v) in map {
                    dict.insert(k.clone(), plist::Value::from(v));
                }
                plist::Value::Dictionary(dict)
            }
        }
    }
}

impl TryFrom<serde_json::Value> for PrefValue {
    type Error = PreferencesError;

    fn try_from(value: serde_json::Value) -> Result<Self, Self::Error> {
        use serde_json::Value;

        Ok(match value {
            Value::String(s) => PrefValue::String(s),
            Value::Bool(b) => PrefValue::Boolean(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    PrefValue::Integer(i.into())
                } else if let Some(u) = n.as_u64() {
                    PrefValue::Integer(u.into())
                } else {
                    PrefValue::Real(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::Array(items) => PrefValue::Array(
                items
                    .into_iter()
                    .map(PrefValue::try_from)
                    .collect::<PrefResult<_>>()?,
            ),
            Value::Object(map) => PrefValue::Dictionary(
                map.into_iter()
                    .map(|(k, v)| PrefValue::try_from(v).map(|v| (k, v)))
                    .collect::<PrefResult<_>>()?,
            ),
            Value::Null => {
                return Err(PreferencesError::UnsupportedValue {
                    kind: "null".to_string(),
                });
            }
        })
    }
}

fn integer_to_string(n: &Integer) -> String {
    match (n.as_signed(), n.as_unsigned()) {
        (Some(i), _) => i.to_string(),
        (None, Some(u)) => u.to_string(),
        (None, None) => String::new(),
    }
}

/// Hex digits, with an optional `0x` prefix and any whitespace between bytes.
fn decode_hex(text: &str) -> Result<Vec<u8>, String> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    let digits: String = digits.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(digits).map_err(|e| e.to_string())
}
