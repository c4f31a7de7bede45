//! Flat, insertion-ordered result records.

#[cfg(feature = "serde")]
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Ordered list of named scalar results for one event.
///
/// Entries are append-only and keep insertion order; downstream consumers
/// rely on both the key names and their order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputRecord {
    entries: Vec<(String, f64)>,
}

impl OutputRecord {
    /// Creates an empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty record with room for `capacity` entries.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Appends a named value.
    pub fn add(&mut self, key: impl Into<String>, value: f64) {
        self.entries.push((key.into(), value));
    }

    /// Returns the first value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|&(_, value)| value)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the record has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Iterates over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), *value))
    }
}

#[cfg(feature = "serde")]
impl Serialize for OutputRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_insertion_order() {
        let mut record = OutputRecord::new();
        record.add("zeta", 1.0);
        record.add("alpha", 2.0);
        record.add("mid", 3.0);
        assert_eq!(record.keys().collect::<Vec<_>>(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(record.get("alpha"), Some(2.0));
        assert_eq!(record.get("missing"), None);
        assert_eq!(record.len(), 3);
    }

    #[test]
    fn test_non_finite_values_are_kept() {
        let mut record = OutputRecord::with_capacity(1);
        record.add("ratio", f64::NAN);
        assert!(record.get("ratio").is_some_and(f64::is_nan));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serialize_preserves_order() {
        let mut record = OutputRecord::new();
        record.add("run", 512.0);
        record.add("eventID", 7.0);
        record.add("xmean", f64::NAN);
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"run":512.0,"eventID":7.0,"xmean":null}"#);
    }
}
