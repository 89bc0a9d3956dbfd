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

//! Multi-key lookup from normalized string keys to entity handles.
//!
//! Entries are added from the reconciler's add path. Correlation keys never
//! change after creation, so an index stays correct for live entities.
//! Entries of evicted entities are dropped by [`KeyIndex::retain`] at the end
//! of the cycle that evicted them; until then the owning repository filters
//! them through the handle's generation check.

use std::collections::HashMap;

use crate::store::Handle;

/// How an entity yields its index keys.
#[derive(Debug, Clone, Copy)]
pub enum KeyExtractor<T> {
    /// One key per entity. An empty key is not indexed.
    Single(fn(&T) -> &str),
    /// Zero or more keys per entity.
    Many(fn(&T) -> &[String]),
}

/// Index mapping each key to the entities carrying it, in insertion order.
#[derive(Debug)]
pub struct KeyIndex<T> {
    extractor: KeyExtractor<T>,
    entries: HashMap<String, Vec<Handle<T>>>,
}

impl<T> KeyIndex<T> {
    #[must_use]
    pub fn single(extract: fn(&T) -> &str) -> Self {
        Self {
            extractor: KeyExtractor::Single(extract),
            entries: HashMap::new(),
        }
    }

    #[must_use]
    pub fn many(extract: fn(&T) -> &[String]) -> Self {
        Self {
            extractor: KeyExtractor::Many(extract),
            entries: HashMap::new(),
        }
    }

    /// Index `entity` under all of its current keys.
    pub fn put(&mut self, handle: Handle<T>, entity: &T) {
        match self.extractor {
            KeyExtractor::Single(extract) => self.put_key(extract(entity), handle),
            KeyExtractor::Many(extract) => {
                for key in extract(entity) {
                    self.put_key(key, handle);
                }
            }
        }
    }

    fn put_key(&mut self, key: &str, handle: Handle<T>) {
        let key = normalize_key(key);
        if key.is_empty() {
            return;
        }

        let handles = self.entries.entry(key).or_default();
        if !handles.contains(&handle) {
            handles.push(handle);
        }
    }

    /// Keep only the handles for which `live` holds. Keys left without any
    /// handle are dropped.
    pub fn retain(&mut self, mut live: impl FnMut(Handle<T>) -> bool) {
        self.entries.retain(|_, handles| {
            handles.retain(|&handle| live(handle));
            !handles.is_empty()
        });
    }

    /// Handles indexed under `key`, in insertion order. Never fails; an
    /// unknown key yields an empty slice.
    #[must_use]
    pub fn get(&self, key: &str) -> &[Handle<T>] {
        self.entries
            .get(&normalize_key(key))
            .map_or(&[], Vec::as_slice)
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Trim and upper-case a lookup key.
#[must_use]
pub fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Arena;

    struct Station {
        icao: String,
        iatas: Vec<String>,
    }

    fn station(icao: &str, iatas: &[&str]) -> Station {
        Station {
            icao: icao.to_string(),
            iatas: iatas.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    fn station_icao(station: &Station) -> &str {
        &station.icao
    }

    fn station_iatas(station: &Station) -> &[String] {
        &station.iatas
    }

    fn index_all(index: &mut KeyIndex<Station>, arena: &Arena<Station>, handles: &[Handle<Station>]) {
        for &handle in handles {
            if let Some(entity) = arena.get(handle) {
                index.put(handle, entity);
            }
        }
    }

    #[test]
    fn test_single_key_lookup_is_case_insensitive() {
        let mut arena = Arena::new();
        let mut index = KeyIndex::single(station_icao);

        let eddf = arena.insert(station("EDDF", &["FRA"]));
        index_all(&mut index, &arena, &[eddf]);

        assert_eq!(index.get(" eddf "), &[eddf]);
        assert!(index.get("EDDM").is_empty());
    }

    #[test]
    fn test_many_keys_keep_insertion_order() {
        let mut arena = Arena::new();
        let mut index = KeyIndex::many(station_iatas);

        let first = arena.insert(station("KJFK", &["JFK", "NYC"]));
        let second = arena.insert(station("KLGA", &["LGA", "NYC"]));
        let no_codes = arena.insert(station("ZZZZ", &[]));
        index_all(&mut index, &arena, &[first, second, no_codes]);

        assert_eq!(index.get("nyc"), &[first, second]);
        assert_eq!(index.get("JFK"), &[first]);
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn test_blank_key_is_not_indexed() {
        let mut arena = Arena::new();
        let mut index = KeyIndex::single(station_icao);

        let blank = arena.insert(station("  ", &[]));
        index_all(&mut index, &arena, &[blank]);

        assert!(index.is_empty());
        assert!(index.get("").is_empty());
    }

    #[test]
    fn test_repeated_put_does_not_duplicate() {
        let mut arena = Arena::new();
        let mut index = KeyIndex::single(station_icao);

        let eddf = arena.insert(station("EDDF", &[]));
        index_all(&mut index, &arena, &[eddf, eddf]);

        assert_eq!(index.get("EDDF").len(), 1);
    }

    #[test]
    fn test_retain_drops_evicted_handles() {
        let mut arena = Arena::new();
        let mut index = KeyIndex::many(station_iatas);

        let kjfk = arena.insert(station("KJFK", &["JFK", "NYC"]));
        let klga = arena.insert(station("KLGA", &["LGA", "NYC"]));
        index_all(&mut index, &arena, &[kjfk, klga]);

        arena.remove(kjfk);
        index.retain(|handle| arena.contains(handle));

        assert_eq!(index.get("NYC"), &[klga]);
        assert!(index.get("JFK").is_empty());
        assert_eq!(index.len(), 2);
    }
}
