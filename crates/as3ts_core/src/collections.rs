//! Collection types used throughout the converter.

use rustc_hash::FxHashMap;
use std::hash::Hash;

pub use rustc_hash::FxHashSet;

/// Hash map with the fast non-cryptographic Fx hasher.
pub type FxMap<K, V> = FxHashMap<K, V>;

/// A set that remembers insertion order.
/// Used where output must list entries in the order they were first seen.
#[derive(Debug, Clone)]
pub struct OrderedSet<T> {
    entries: Vec<T>,
    index: FxHashMap<T, usize>,
}

impl<T: Eq + Hash + Clone> OrderedSet<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Insert a value. Returns `false` if it was already present.
    pub fn insert(&mut self, value: T) -> bool {
        if self.index.contains_key(&value) {
            return false;
        }
        self.index.insert(value.clone(), self.entries.len());
        self.entries.push(value);
        true
    }

    pub fn contains(&self, value: &T) -> bool {
        self.index.contains_key(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.entries
    }
}

impl<T: Eq + Hash + Clone> Default for OrderedSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_set_keeps_first_insertion() {
        let mut set = OrderedSet::new();
        assert!(set.insert("b"));
        assert!(set.insert("a"));
        assert!(!set.insert("b"));
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec!["b", "a"]);
        assert_eq!(set.len(), 2);
    }
}
