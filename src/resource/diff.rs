//! Set differences between two resource snapshots.

use super::set::ResourceSet;

/// The outcome of comparing a base snapshot with a target snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiffResult {
    /// In base, absent from target (base values, base order).
    pub missing: ResourceSet,
    /// In both, with a different value (base values, base order).
    pub changed: ResourceSet,
    /// In target, absent from base (target values, target order).
    pub extra: ResourceSet,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.changed.is_empty() && self.extra.is_empty()
    }
}

pub fn diff(base: &ResourceSet, target: &ResourceSet) -> DiffResult {
    let mut result = DiffResult::default();

    for (key, value) in base.iter() {
        match target.get(key) {
            None => {
                result.missing.insert(key, value);
            }
            Some(existing) if existing != value => {
                result.changed.insert(key, value);
            }
            Some(_) => {}
        }
    }

    for (key, value) in target.iter() {
        if !base.contains_key(key) {
            result.extra.insert(key, value);
        }
    }

    result
}

/// Entries of `a` that are absent from `b` or hold a different value there.
pub fn differing(a: &ResourceSet, b: &ResourceSet) -> ResourceSet {
    a.iter()
        .filter(|(key, value)| b.get(key) != Some(*value))
        .collect()
}
