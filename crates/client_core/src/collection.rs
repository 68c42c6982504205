use std::collections::HashSet;

use shared::domain::Keyed;
use tracing::{debug, warn};

/// Ordered items with unique keys.
///
/// Removal scans linearly, so every removal is O(n). That is fine for a
/// page of stories and is the known limit for large collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionStore<T> {
    items: Vec<T>,
}

impl<T> Default for CollectionStore<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Keyed + Clone> CollectionStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, key: T::Key) -> bool {
        self.items.iter().any(|item| item.key() == key)
    }

    /// Later items that repeat an earlier key are dropped; the number dropped
    /// is returned.
    pub fn replace_all(&mut self, items: Vec<T>) -> usize {
        let mut seen = HashSet::with_capacity(items.len());
        let incoming = items.len();
        self.items = items
            .into_iter()
            .filter(|item| seen.insert(item.key()))
            .collect();

        let dropped = incoming - self.items.len();
        if dropped > 0 {
            warn!(dropped, "collection: dropped items with duplicate keys");
        }
        dropped
    }

    pub fn remove_by_id(&mut self, key: T::Key) -> bool {
        let Some(index) = self.items.iter().position(|item| item.key() == key) else {
            debug!(key = ?key, "collection: remove of absent key ignored");
            return false;
        };
        self.items.remove(index);
        true
    }

    pub fn without(&self, key: T::Key) -> Self {
        Self {
            items: self
                .items
                .iter()
                .filter(|item| item.key() != key)
                .cloned()
                .collect(),
        }
    }
}

#[cfg(test)]
#[path = "tests/collection_tests.rs"]
mod tests;
