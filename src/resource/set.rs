//! Ordered key/value snapshot of a string resource document.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Default partition size used for bulk translation requests.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// An ordered mapping from resource key to text value.
///
/// Keys are unique. Insertion order is kept so that translation batches and
/// written files stay stable between runs; it carries no other meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceSet {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .map(|&position| self.entries[position].1.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Inserts an entry, replacing the value in place if the key already exists.
    ///
    /// Returns the previous value, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        if let Some(&position) = self.index.get(&key) {
            return Some(std::mem::replace(&mut self.entries[position].1, value));
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push((key, value));
        None
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Keeps only the entries whose key is in `keys`, preserving this set's order.
    pub fn filter_keys<S: AsRef<str>>(&self, keys: &[S]) -> Self {
        let wanted: HashSet<&str> = keys.iter().map(AsRef::as_ref).collect();
        self.iter()
            .filter(|(key, _)| wanted.contains(key))
            .collect()
    }

    /// The last `n` entries. `0` yields an empty set.
    pub fn tail(&self, n: usize) -> Self {
        let start = self.entries.len().saturating_sub(n);
        self.entries[start..].iter().cloned().collect()
    }

    /// Splits the set into consecutive partitions of at most `size` entries.
    ///
    /// The returned iterator is lazy and can be cloned to start over.
    pub fn chunks(self, size: usize) -> Chunks {
        Chunks {
            entries: self.entries,
            size: size.max(1),
            offset: 0,
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ResourceSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (key, value) in iter {
            set.insert(key, value);
        }
        set
    }
}

impl IntoIterator for ResourceSet {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Lazy partitioning of a [`ResourceSet`], produced by [`ResourceSet::chunks`].
#[derive(Debug, Clone)]
pub struct Chunks {
    entries: Vec<(String, String)>,
    size: usize,
    offset: usize,
}

impl Iterator for Chunks {
    type Item = ResourceSet;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.entries.len() {
            return None;
        }
        let end = (self.offset + self.size).min(self.entries.len());
        let chunk = self.entries[self.offset..end].iter().cloned().collect();
        self.offset = end;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.entries.len().saturating_sub(self.offset);
        let chunks = remaining.div_ceil(self.size);
        (chunks, Some(chunks))
    }
}

impl ExactSizeIterator for Chunks {}

impl Serialize for ResourceSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ResourceSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SetVisitor;

        impl<'de> Visitor<'de> for SetVisitor {
            type Value = ResourceSet;

            fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str("a flat map of string keys to string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut set = ResourceSet::new();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    set.insert(key, value);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(SetVisitor)
    }
}
