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

//! Keyed reconciliation of fetched raw records against live entities.
//!
//! Each cycle the freshly fetched records of one family are matched to the
//! entities already in the store by correlation key:
//!
//! - a key seen for the first time creates and populates a new entity
//! - a known key populates the existing entity in place, keeping its handle
//! - a live key missing from the snapshot evicts the entity, after its
//!   removal hook has cleared any derived relationships
//!
//! All removals run before any add or update, so nothing touched later in the
//! cycle can point at an entity evicted in the same cycle.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::hash::Hash;

use log::debug;

use crate::quality::{DataQualityWarning, QualityLog};
use crate::store::{EntityStore, Handle};

/// An entity that can be materialized from raw records of type `R`.
pub trait Reconcile<R>: Sized {
    /// Correlation key, immutable for the life of the entity.
    type Key: Eq + Hash + Clone + Debug;

    /// Family name used in logs and warnings.
    const FAMILY: &'static str;

    fn key(raw: &R) -> Self::Key;

    /// Create a blank entity carrying the immutable key fields of `raw`.
    fn create(raw: &R) -> Self;

    /// Copy the mutable fields of `raw` onto the entity and report whether
    /// any of them changed. Must leave derived relationship fields alone.
    fn populate(&mut self, raw: &R) -> bool;
}

/// Replace `slot` with `value`, reporting whether they differed.
pub(crate) fn assign<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}

/// Like [`assign`], reusing the allocation of `slot`.
pub(crate) fn assign_from<T: PartialEq + Clone>(slot: &mut T, value: &T) -> bool {
    if slot == value {
        false
    } else {
        slot.clone_from(value);
        true
    }
}

/// Outcome of one reconciliation pass.
#[derive(Debug)]
pub struct Delta<K, T> {
    /// Entities created this cycle, in snapshot order.
    pub added: Vec<Handle<T>>,
    /// Entities kept whose populated fields changed.
    pub updated: Vec<Handle<T>>,
    /// Entities kept whose populated fields did not change.
    pub unchanged: Vec<Handle<T>>,
    /// Evicted entities with their former keys. These handles no longer
    /// resolve.
    pub removed: Vec<(Handle<T>, K)>,
}

impl<K, T> Default for Delta<K, T> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            updated: Vec::new(),
            unchanged: Vec::new(),
            removed: Vec::new(),
        }
    }
}

impl<K, T> Delta<K, T> {
    /// True when the pass added, updated and removed nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }

    /// Every live entity touched by the pass: added first, then retained.
    pub fn live(&self) -> impl Iterator<Item = Handle<T>> + '_ {
        self.added
            .iter()
            .chain(&self.updated)
            .chain(&self.unchanged)
            .copied()
    }
}

/// Reconcile `fetched` against `store`.
///
/// Raw records that collide on their derived key are resolved last-wins,
/// keeping the position of the first occurrence, and reported as a
/// [`DataQualityWarning::DuplicateKey`]. `on_remove` runs for every vanished
/// entity before it is evicted.
pub fn reconcile<R, T, F>(
    store: &mut EntityStore<T::Key, T>,
    fetched: impl IntoIterator<Item = R>,
    quality: &mut QualityLog,
    mut on_remove: F,
) -> Delta<T::Key, T>
where
    T: Reconcile<R>,
    F: FnMut(Handle<T>, &mut T),
{
    let records = dedupe::<R, T>(fetched, quality);

    let mut delta = Delta::default();

    // Removals first
    let fetched_keys: HashSet<&T::Key> = records.iter().map(|(key, _)| key).collect();
    let vanished: Vec<Handle<T>> = store
        .handles()
        .filter(|&handle| {
            store
                .key_of(handle)
                .is_some_and(|key| !fetched_keys.contains(key))
        })
        .collect();

    for handle in vanished {
        if let Some(entity) = store.get_mut(handle) {
            on_remove(handle, entity);
        }
        if let Some((key, _)) = store.evict(handle) {
            debug!("Removed {} {:?}", T::FAMILY, key);
            delta.removed.push((handle, key));
        }
    }
    store.prune_order();

    for (key, raw) in records {
        match store.handle_of(&key) {
            Some(handle) => {
                if let Some(entity) = store.get_mut(handle) {
                    if entity.populate(&raw) {
                        delta.updated.push(handle);
                    } else {
                        delta.unchanged.push(handle);
                    }
                }
            }
            None => {
                let mut entity = T::create(&raw);
                entity.populate(&raw);
                delta.added.push(store.insert(key, entity));
            }
        }
    }

    delta
}

/// Collapse records sharing a key: last record wins, first position kept.
fn dedupe<R, T: Reconcile<R>>(
    fetched: impl IntoIterator<Item = R>,
    quality: &mut QualityLog,
) -> Vec<(T::Key, R)> {
    let mut positions: HashMap<T::Key, usize> = HashMap::new();
    let mut records: Vec<(T::Key, R)> = Vec::new();

    for raw in fetched {
        let key = T::key(&raw);
        if let Some(&position) = positions.get(&key) {
            quality.record(DataQualityWarning::DuplicateKey {
                family: T::FAMILY,
                key: format!("{key:?}"),
            });
            records[position].1 = raw;
        } else {
            positions.insert(key.clone(), records.len());
            records.push((key, raw));
        }
    }

    records
}
