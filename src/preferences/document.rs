//! In-memory snapshot of one preferences file.

use std::collections::BTreeMap;

use super::entry::PreferenceEntry;
use super::error::{PrefResult, PreferencesError};
use super::value::PrefValue;

/// A mapping from key to value with unique keys.
///
/// Keys are kept in a `BTreeMap`, so every listing comes out sorted by key
/// without a separate sort step. On-disk order carries no meaning.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreferenceDocument {
    values: BTreeMap<String, PrefValue>,
}

impl PreferenceDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&PrefValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Insert or replace a value. Returns the value previously stored under `key`.
    pub fn set(&mut self, key: impl Into<String>, value: PrefValue) -> PrefResult<Option<PrefValue>> {
        let key = key.into();
        if key.is_empty() {
            return Err(PreferencesError::InvalidKey);
        }
        Ok(self.values.insert(key, value))
    }

    /// Same keys holding [`identical`](PrefValue::identical) values.
    pub fn identical(&self, other: &PreferenceDocument) -> bool {
        self.values.len() == other.values.len()
            && self
                .values
                .iter()
                .zip(&other.values)
                .all(|((ka, va), (kb, vb))| ka == kb && va.identical(vb))
    }

    pub fn remove(&mut self, key: &str) -> Option<PrefValue> {
        self.values.remove(key)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &PrefValue)> {
        self.values.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.values.keys()
    }

    /// All entries, alphabetical by key.
    pub fn entries(&self) -> Vec<PreferenceEntry> {
        self.values
            .iter()
            .map(|(k, v)| PreferenceEntry::new(k.clone(), v.clone()))
            .collect()
    }

    /// Entries whose key contains `query`, ignoring case. An empty query
    /// matches everything.
    pub fn filtered(&self, query: &str) -> Vec<PreferenceEntry> {
        if query.is_empty() {
            return self.entries();
        }
        let needle = query.to_lowercase();
        self.values
            .iter()
            .filter(|(k, _)| k.to_lowercase().contains(&needle))
            .map(|(k, v)| PreferenceEntry::new(k.clone(), v.clone()))
            .collect()
    }

    pub(crate) fn to_plist(&self) -> plist::Value {
        let mut dict = plist::Dictionary::new();
        for (k, v) in &self.values {
            dict.insert(k.clone(), plist::Value::from(v));
        }
        plist::Value::Dictionary(dict)
    }

    pub(crate) fn from_plist(value: plist::Value) -> PrefResult<Self> {
        match value {
            plist::Value::Dictionary(dict) => {
                let mut values = BTreeMap::new();
                for (k, v) in dict {
                    values.insert(k, PrefValue::try_from(v)?);
                }
                Ok(Self { values })
            }
            other => Err(PreferencesError::UnsupportedValue {
                kind: format!("top-level {}", plist_kind(&other)),
            }),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, PrefValue)> for PreferenceDocument {
    fn from_iter<I: IntoIterator<Item = (K, PrefValue)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

fn plist_kind(value: &plist::Value) -> &'static str {
    match value {
        plist::Value::Array(_) => "array",
        plist::Value::Dictionary(_) => "dictionary",
        plist::Value::Boolean(_) => "boolean",
        plist::Value::Data(_) => "data",
        plist::Value::Date(_) => "date",
        plist::Value::Real(_) => "real",
        plist::Value::Integer(_) => "integer",
        plist::Value::String(_) => "string",
        _ => "value",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn greek() -> PreferenceDocument {
        [
            ("gamma", PrefValue::from(3)),
            ("alpha", PrefValue::from(1)),
            ("beta", PrefValue::from(2)),
        ]
        .into_iter()
        .collect()
    }

    fn keys(entries: &[PreferenceEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.key.as_str()).collect()
    }

    #[test]
    fn test_entries_are_sorted() {
        assert_eq!(keys(&greek().entries()), vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_filter_is_case_insensitive_substring() {
        let doc = greek();
        assert_eq!(keys(&doc.filtered("a")), vec!["alpha", "beta", "gamma"]);
        assert_eq!(keys(&doc.filtered("al")), vec!["alpha"]);
        assert_eq!(keys(&doc.filtered("AL")), vec!["alpha"]);
        assert_eq!(keys(&doc.filtered("")), vec!["alpha", "beta", "gamma"]);
        assert!(doc.filtered("zeta").is_empty());
    }

    #[test]
    fn test_set_replaces_without_duplicating() {
        let mut doc = greek();
        let previous = doc.set("beta", PrefValue::from("two")).unwrap();
        assert_eq!(previous, Some(PrefValue::from(2)));
        assert_eq!(doc.len(), 3);
        assert_eq!(doc.get("beta"), Some(&PrefValue::from("two")));

        assert_eq!(doc.set("delta", PrefValue::from(4)).unwrap(), None);
        assert_eq!(doc.len(), 4);
    }

    #[test]
    fn test_empty_key_rejected() {
        let mut doc = PreferenceDocument::new();
        assert!(matches!(
            doc.set("", PrefValue::from(1)),
            Err(PreferencesError::InvalidKey)
        ));
        assert!(doc.is_empty());
    }

    #[test]
    fn test_non_dictionary_root_rejected() {
        let err = PreferenceDocument::from_plist(plist::Value::Array(vec![])).unwrap_err();
        assert!(err.to_string().contains("top-level array"));
    }
}
