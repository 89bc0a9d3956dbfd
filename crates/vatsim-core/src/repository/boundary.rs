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

//! FIR boundary repository and the default point-in-polygon containment.

use geo::{Contains, Point};

use crate::lookup::KeyIndex;
use crate::model::FirBoundary;
use crate::position::Position;
use crate::quality::QualityLog;
use crate::raw::RawBoundary;
use crate::reconcile::{reconcile, Delta};
use crate::store::{EntityStore, Handle};
use crate::wiring::BoundaryContainment;

fn boundary_id(boundary: &FirBoundary) -> &str {
    &boundary.id
}

#[derive(Debug)]
pub struct BoundaryRepository {
    store: EntityStore<String, FirBoundary>,
    by_id: KeyIndex<FirBoundary>,
}

impl Default for BoundaryRepository {
    fn default() -> Self {
        Self {
            store: EntityStore::new(),
            by_id: KeyIndex::single(boundary_id),
        }
    }
}

impl BoundaryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reconcile<F>(&mut self, raws: Vec<RawBoundary>, quality: &mut QualityLog, on_remove: F) -> Delta<String, FirBoundary>
    where
        F: FnMut(Handle<FirBoundary>, &mut FirBoundary),
    {
        let delta = reconcile(&mut self.store, raws, quality, on_remove);
        if !delta.removed.is_empty() {
            let store = &self.store;
            self.by_id.retain(|handle| store.contains(handle));
        }
        for &handle in &delta.added {
            if let Some(boundary) = self.store.get(handle) {
                self.by_id.put(handle, boundary);
            }
        }
        delta
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    #[must_use]
    pub fn get(&self, handle: Handle<FirBoundary>) -> Option<&FirBoundary> {
        self.store.get(handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<FirBoundary>, &FirBoundary)> + '_ {
        self.store.iter()
    }

    /// First live boundary with the given id.
    #[must_use]
    pub fn handle_by_id(&self, id: &str) -> Option<Handle<FirBoundary>> {
        self.by_id
            .get(id)
            .iter()
            .copied()
            .find(|&handle| self.store.contains(handle))
    }

    #[must_use]
    pub fn get_by_id(&self, id: &str) -> Option<&FirBoundary> {
        self.handle_by_id(id).and_then(|handle| self.store.get(handle))
    }
}

fn contains(boundary: &FirBoundary, position: Position) -> bool {
    let Some(bounds) = boundary.bounds else {
        return false;
    };

    let mut longitudes = vec![position.longitude];
    if boundary.crosses_antimeridian() {
        longitudes.push(position.longitude + 360.0);
        longitudes.push(position.longitude - 360.0);
    }

    longitudes.into_iter().any(|longitude| {
        let point = Point::new(longitude, position.latitude);
        bounds.contains(&point) && boundary.geometry.contains(&point)
    })
}

impl BoundaryContainment for BoundaryRepository {
    fn boundaries_containing(&self, position: Position) -> Vec<Handle<FirBoundary>> {
        if !position.is_canonical() {
            return Vec::new();
        }

        self.store
            .iter()
            .filter(|(_, boundary)| contains(boundary, position))
            .map(|(handle, _)| handle)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(id: &str, min_lon: f64, min_lat: f64, size: f64) -> RawBoundary {
        RawBoundary {
            id: id.to_string(),
            oceanic: false,
            extension: false,
            polygons: vec![vec![vec![
                [min_lon, min_lat],
                [min_lon + size, min_lat],
                [min_lon + size, min_lat + size],
                [min_lon, min_lat + size],
                [min_lon, min_lat],
            ]]],
        }
    }

    fn repository(raws: Vec<RawBoundary>) -> BoundaryRepository {
        let mut repository = BoundaryRepository::new();
        let mut quality = QualityLog::new();
        repository.reconcile(raws, &mut quality, |_, _| {});
        repository
    }

    #[test]
    fn test_containment() {
        let repository = repository(vec![square("EDGG", 6.0, 48.0, 4.0), square("EDMM", 9.0, 47.0, 4.0)]);

        let both = repository.boundaries_containing(Position::new(49.0, 9.5));
        assert_eq!(both.len(), 2);

        let one = repository.boundaries_containing(Position::new(49.0, 7.0));
        assert_eq!(one, vec![repository.handle_by_id("EDGG").unwrap()]);

        assert!(repository.boundaries_containing(Position::new(0.0, 0.0)).is_empty());
    }

    #[test]
    fn test_containment_across_antimeridian() {
        // Spans 170E to 190E, i.e. 170W on the far side of the seam
        let repository = repository(vec![square("NZZO", 170.0, -40.0, 20.0)]);

        assert_eq!(repository.boundaries_containing(Position::new(-30.0, 175.0)).len(), 1);
        assert_eq!(repository.boundaries_containing(Position::new(-30.0, -175.0)).len(), 1);
        assert!(repository.boundaries_containing(Position::new(-30.0, -165.0)).is_empty());
    }

    #[test]
    fn test_lookup_by_id_is_case_insensitive() {
        let repository = repository(vec![square("egtt", 0.0, 50.0, 2.0)]);
        assert!(repository.get_by_id("EGTT").is_some());
        assert!(repository.get_by_id("EGPX").is_none());
    }
}
