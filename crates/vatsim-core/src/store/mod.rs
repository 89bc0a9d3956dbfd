// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Keyed, insertion-ordered entity storage.

mod arena;

pub use arena::{Arena, Handle};

use std::collections::HashMap;
use std::hash::Hash;

/// Entities of one family, keyed by correlation key.
///
/// Iteration follows insertion order: surviving entities keep their place
/// across cycles and new entities are appended.
#[derive(Debug)]
pub struct EntityStore<K, T> {
    arena: Arena<T>,
    by_key: HashMap<K, Handle<T>>,
    key_of: HashMap<Handle<T>, K>,
    order: Vec<Handle<T>>,
}

impl<K, T> Default for EntityStore<K, T> {
    fn default() -> Self {
        Self {
            arena: Arena::new(),
            by_key: HashMap::new(),
            key_of: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<K: Eq + Hash + Clone, T> EntityStore<K, T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    #[must_use]
    pub fn get(&self, handle: Handle<T>) -> Option<&T> {
        self.arena.get(handle)
    }

    pub fn get_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.arena.get_mut(handle)
    }

    #[must_use]
    pub fn contains(&self, handle: Handle<T>) -> bool {
        self.arena.contains(handle)
    }

    /// Handle of the live entity with the given key.
    #[must_use]
    pub fn handle_of(&self, key: &K) -> Option<Handle<T>> {
        self.by_key.get(key).copied()
    }

    #[must_use]
    pub fn key_of(&self, handle: Handle<T>) -> Option<&K> {
        self.key_of.get(&handle)
    }

    /// Live entities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<T>, &T)> + '_ {
        self.order
            .iter()
            .filter_map(move |&handle| self.arena.get(handle).map(|value| (handle, value)))
    }

    /// Live handles in insertion order.
    pub fn handles(&self) -> impl Iterator<Item = Handle<T>> + '_ {
        self.order
            .iter()
            .copied()
            .filter(move |&handle| self.arena.contains(handle))
    }

    /// Append a new entity under `key`.
    pub(crate) fn insert(&mut self, key: K, value: T) -> Handle<T> {
        let handle = self.arena.insert(value);
        self.by_key.insert(key.clone(), handle);
        self.key_of.insert(handle, key);
        self.order.push(handle);
        handle
    }

    /// Drop an entity. The ordering vector is compacted lazily by
    /// [`EntityStore::prune_order`].
    pub(crate) fn evict(&mut self, handle: Handle<T>) -> Option<(K, T)> {
        let value = self.arena.remove(handle)?;
        let key = self.key_of.remove(&handle)?;
        self.by_key.remove(&key);
        Some((key, value))
    }

    pub(crate) fn prune_order(&mut self) {
        let arena = &self.arena;
        self.order.retain(|&handle| arena.contains(handle));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iteration_keeps_insertion_order() {
        let mut store = EntityStore::new();
        store.insert("c", 3);
        store.insert("a", 1);
        store.insert("b", 2);

        let values: Vec<_> = store.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![3, 1, 2]);
    }

    #[test]
    fn test_evict_releases_key() {
        let mut store = EntityStore::new();
        let a = store.insert("a", 1);
        store.insert("b", 2);

        assert_eq!(store.evict(a), Some(("a", 1)));
        store.prune_order();

        assert!(store.handle_of(&"a").is_none());
        assert!(store.get(a).is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(store.handles().count(), 1);
    }
}
