//! Key/value pairs as listed to callers.

use std::hash::{Hash, Hasher};

use super::value::PrefValue;

/// One key and its value, as presented in a listing.
///
/// Two entries compare equal when their keys match and their values render
/// to the same [`canonical`](PrefValue::canonical) string. This is a cheap
/// identity for deduplication and UI diffing; it treats `Integer(1)` and
/// `Real(1.0)` as the same. Use [`PreferenceEntry::same_as`] when the value
/// kind matters.
#[derive(Debug, Clone)]
pub struct PreferenceEntry {
    pub key: String,
    pub value: PrefValue,
}

impl PreferenceEntry {
    pub fn new(key: impl Into<String>, value: impl Into<PrefValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Exact, type-aware comparison.
    pub fn same_as(&self, other: &PreferenceEntry) -> bool {
        self.key == other.key && self.value == other.value
    }
}

impl PartialEq for PreferenceEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.value.canonical() == other.value.canonical()
    }
}

impl Eq for PreferenceEntry {}

impl Hash for PreferenceEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
        self.value.canonical().hash(state);
    }
}
