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

//! Client repository.
//!
//! Pilots, controllers and ATIS stations live in one collection. The
//! pilots-only and controllers-only views filter it on the fly, so they can
//! never drift from the primary collection.

use log::debug;

use crate::lookup::KeyIndex;
use crate::model::{Client, ClientKey};
use crate::position::Position;
use crate::quality::{DataQualityWarning, QualityLog};
use crate::raw::RawClient;
use crate::reconcile::{reconcile, Delta};
use crate::spatial::SpatialIndex;
use crate::store::{EntityStore, Handle};

fn client_callsign(client: &Client) -> &str {
    &client.callsign
}

#[derive(Debug)]
pub struct ClientRepository {
    store: EntityStore<ClientKey, Client>,
    by_callsign: KeyIndex<Client>,
    spatial: SpatialIndex<Client>,
}

impl Default for ClientRepository {
    fn default() -> Self {
        Self {
            store: EntityStore::new(),
            by_callsign: KeyIndex::single(client_callsign),
            spatial: SpatialIndex::new(),
        }
    }
}

impl ClientRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reconcile<F>(&mut self, raws: Vec<RawClient>, quality: &mut QualityLog, on_remove: F) -> Delta<ClientKey, Client>
    where
        F: FnMut(Handle<Client>, &mut Client),
    {
        let delta = reconcile(&mut self.store, raws, quality, on_remove);
        if !delta.removed.is_empty() {
            let store = &self.store;
            self.by_callsign.retain(|handle| store.contains(handle));
        }
        for &handle in &delta.added {
            if let Some(client) = self.store.get(handle) {
                self.by_callsign.put(handle, client);
            }
        }
        delta
    }

    /// Rebuild the spatial index from the live pilots. Pilots outside the
    /// canonical coordinate range stay in the collection but are reported
    /// and left out of the index.
    pub(crate) fn rebuild_spatial(&mut self, quality: &mut QualityLog) {
        let points: Vec<_> = self
            .store
            .iter()
            .filter_map(|(handle, client)| client.pilot().map(|pilot| (handle, pilot.position)))
            .collect();

        for handle in self.spatial.rebuild(points) {
            if let Some(client) = self.store.get(handle) {
                let position = client.pilot().map(|pilot| pilot.position).unwrap_or_default();
                quality.record(DataQualityWarning::OutOfBounds {
                    callsign: client.callsign.clone(),
                    latitude: position.latitude,
                    longitude: position.longitude,
                });
            }
        }

        debug!("{} pilots spatially indexed", self.spatial.len());
    }

    pub(crate) fn get_mut(&mut self, handle: Handle<Client>) -> Option<&mut Client> {
        self.store.get_mut(handle)
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
    pub fn get(&self, handle: Handle<Client>) -> Option<&Client> {
        self.store.get(handle)
    }

    /// All clients in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<Client>, &Client)> + '_ {
        self.store.iter()
    }

    /// Pilots-only view.
    pub fn pilots(&self) -> impl Iterator<Item = (Handle<Client>, &Client)> + '_ {
        self.store.iter().filter(|(_, client)| client.is_pilot())
    }

    /// Controllers-only view, ATIS stations included.
    pub fn controllers(&self) -> impl Iterator<Item = (Handle<Client>, &Client)> + '_ {
        self.store.iter().filter(|(_, client)| client.is_controller())
    }

    /// Live clients using `callsign`, across all sessions and kinds.
    #[must_use]
    pub fn get_by_callsign(&self, callsign: &str) -> Vec<&Client> {
        self.by_callsign
            .get(callsign)
            .iter()
            .filter_map(|&handle| self.store.get(handle))
            .collect()
    }

    /// Number of pilots in the spatial index.
    #[must_use]
    pub fn spatially_indexed(&self) -> usize {
        self.spatial.len()
    }

    /// Pilots nearest to `position`, nearest first, with their distance in
    /// nautical miles. Evaluated lazily against the last completed cycle.
    pub fn stream_search_by_position(
        &self,
        position: Position,
        max_distance_nm: f64,
        max_count: usize,
    ) -> impl Iterator<Item = (&Client, f64)> + '_ {
        self.spatial
            .nearest(position, max_distance_nm, max_count)
            .filter_map(|(handle, distance)| self.store.get(handle).map(|client| (client, distance)))
    }

    /// Collected form of [`ClientRepository::stream_search_by_position`].
    #[must_use]
    pub fn list_search_by_position(&self, position: Position, max_distance_nm: f64, max_count: usize) -> Vec<(&Client, f64)> {
        self.stream_search_by_position(position, max_distance_nm, max_count)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::raw::{RawClientDetails, RawController, RawPilot};

    fn pilot(cid: u64, callsign: &str, latitude: f64, longitude: f64) -> RawClient {
        RawClient {
            cid,
            callsign: callsign.to_string(),
            name: String::new(),
            server: String::new(),
            rating: 1,
            logon_time: Utc::now(),
            last_updated: Utc::now(),
            details: RawClientDetails::Pilot(RawPilot {
                latitude,
                longitude,
                ..Default::default()
            }),
        }
    }

    fn controller(cid: u64, callsign: &str) -> RawClient {
        RawClient {
            details: RawClientDetails::Controller(RawController::default()),
            ..pilot(cid, callsign, 0.0, 0.0)
        }
    }

    fn cycle(repository: &mut ClientRepository, raws: Vec<RawClient>) -> QualityLog {
        let mut quality = QualityLog::new();
        repository.reconcile(raws, &mut quality, |_, _| {});
        repository.rebuild_spatial(&mut quality);
        quality
    }

    #[test]
    fn test_reconnecting_callsign_keeps_index_bounded() {
        let mut repository = ClientRepository::new();

        for round in 0..1000_u64 {
            let raws = if round % 2 == 0 { vec![pilot(round, "DLH456", 50.0, 8.5)] } else { Vec::new() };
            cycle(&mut repository, raws);
        }

        assert!(repository.is_empty());
        assert!(repository.by_callsign.get("DLH456").is_empty());
        assert!(repository.by_callsign.is_empty());

        cycle(&mut repository, vec![pilot(5000, "DLH456", 50.0, 8.5)]);
        assert_eq!(repository.by_callsign.get("DLH456").len(), 1);
        assert_eq!(repository.get_by_callsign("dlh456").len(), 1);
    }

    #[test]
    fn test_removing_pilots_empties_pilot_view_only() {
        let mut repository = ClientRepository::new();
        cycle(
            &mut repository,
            vec![
                pilot(1, "DLH456", 50.0, 8.5),
                pilot(2, "N12345", 40.0, -73.0),
                controller(3, "EDDF_TWR"),
                controller(4, "EDGG_CTR"),
            ],
        );
        assert_eq!(repository.pilots().count(), 2);
        assert_eq!(repository.controllers().count(), 2);

        cycle(&mut repository, vec![controller(3, "EDDF_TWR"), controller(4, "EDGG_CTR")]);

        assert_eq!(repository.pilots().count(), 0);
        let callsigns: Vec<_> = repository.controllers().map(|(_, c)| c.callsign.as_str()).collect();
        assert_eq!(callsigns, vec!["EDDF_TWR", "EDGG_CTR"]);
        assert_eq!(repository.spatially_indexed(), 0);
    }

    #[test]
    fn test_search_by_position() {
        let mut repository = ClientRepository::new();
        cycle(
            &mut repository,
            vec![
                pilot(1, "NEAR", 50.1, 8.6),
                pilot(2, "FAR", 40.0, -73.0),
                pilot(3, "MID", 51.5, -0.4),
                controller(4, "EDDF_TWR"),
            ],
        );

        let results = repository.list_search_by_position(Position::new(50.03, 8.57), 500.0, 10);
        let callsigns: Vec<_> = results.iter().map(|(c, _)| c.callsign.as_str()).collect();
        assert_eq!(callsigns, vec!["NEAR", "MID"]);
        assert!(results[0].1 < results[1].1);

        assert_eq!(repository.stream_search_by_position(Position::new(50.03, 8.57), 10_000.0, 1).count(), 1);
    }

    #[test]
    fn test_out_of_bounds_pilot_stays_in_collection() {
        let mut repository = ClientRepository::new();
        let quality = cycle(&mut repository, vec![pilot(1, "LOST", 91.0, 0.0), pilot(2, "OK", 0.0, 0.0)]);

        assert_eq!(repository.pilots().count(), 2);
        assert_eq!(repository.spatially_indexed(), 1);
        assert!(matches!(
            &quality.warnings()[0],
            DataQualityWarning::OutOfBounds { callsign, .. } if callsign == "LOST"
        ));
    }

    #[test]
    fn test_same_cid_runs_concurrent_sessions() {
        let mut repository = ClientRepository::new();
        let quality = cycle(&mut repository, vec![controller(7, "EDDF_TWR"), controller(7, "EDDF_GND")]);

        assert!(quality.is_empty());
        assert_eq!(repository.len(), 2);
        assert_eq!(repository.get_by_callsign("eddf_twr").len(), 1);
    }
}
