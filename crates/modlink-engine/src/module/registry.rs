//! Module registry
//!
//! Maps a compiled unit's identity to the record(s) that own a unit with
//! that identity. Lookups from a unit back to its owning record go through
//! here when the linker asks a unit for its imports.

use super::ModuleId;
use crate::unit::UnitId;
use rustc_hash::FxHashMap;

/// Registry from unit identity to owning records
///
/// Identities minted by [`UnitId::fresh`] are unique, so buckets normally
/// hold one record. A compiler that reuses identities puts several records
/// in one bucket; callers disambiguate by comparing the units themselves.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    buckets: FxHashMap<UnitId, Vec<ModuleId>>,
    len: usize,
}

impl ModuleRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `module` as an owner of `unit`
    pub fn insert(&mut self, unit: UnitId, module: ModuleId) {
        let bucket = self.buckets.entry(unit).or_default();
        if !bucket.contains(&module) {
            bucket.push(module);
            self.len += 1;
        }
    }

    /// Remove `module` from the bucket for `unit`
    ///
    /// Returns `true` if the entry existed.
    pub fn remove(&mut self, unit: UnitId, module: ModuleId) -> bool {
        let Some(bucket) = self.buckets.get_mut(&unit) else {
            return false;
        };
        let Some(pos) = bucket.iter().position(|m| *m == module) else {
            return false;
        };
        bucket.remove(pos);
        if bucket.is_empty() {
            self.buckets.remove(&unit);
        }
        self.len -= 1;
        true
    }

    /// Records registered under `unit`, in registration order
    pub fn candidates(&self, unit: UnitId) -> &[ModuleId] {
        self.buckets.get(&unit).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Total number of registered records
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether no record is registered
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_remove() {
        let mut registry = ModuleRegistry::new();
        let unit = UnitId::fresh();
        let module = ModuleId::new(0, 0);

        registry.insert(unit, module);
        assert_eq!(registry.candidates(unit), &[module]);
        assert_eq!(registry.len(), 1);

        assert!(registry.remove(unit, module));
        assert!(registry.candidates(unit).is_empty());
        assert!(registry.is_empty());
        assert!(!registry.remove(unit, module));
    }

    #[test]
    fn test_shared_identity_keeps_both_owners() {
        let mut registry = ModuleRegistry::new();
        let unit = UnitId::fresh();
        let first = ModuleId::new(0, 0);
        let second = ModuleId::new(1, 0);

        registry.insert(unit, first);
        registry.insert(unit, second);
        registry.insert(unit, second);
        assert_eq!(registry.candidates(unit), &[first, second]);
        assert_eq!(registry.len(), 2);

        registry.remove(unit, first);
        assert_eq!(registry.candidates(unit), &[second]);
    }
}
