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

use crate::lookup::KeyIndex;
use crate::model::Airline;
use crate::quality::QualityLog;
use crate::raw::RawAirline;
use crate::reconcile::{reconcile, Delta};
use crate::store::{EntityStore, Handle};
use crate::wiring::AirlineLookup;

fn airline_icao(airline: &Airline) -> &str {
    &airline.icao
}

#[derive(Debug)]
pub struct AirlineRepository {
    store: EntityStore<String, Airline>,
    by_icao: KeyIndex<Airline>,
}

impl Default for AirlineRepository {
    fn default() -> Self {
        Self {
            store: EntityStore::new(),
            by_icao: KeyIndex::single(airline_icao),
        }
    }
}

impl AirlineRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reconcile(&mut self, raws: Vec<RawAirline>, quality: &mut QualityLog) -> Delta<String, Airline> {
        let delta = reconcile(&mut self.store, raws, quality, |_, _| {});
        if !delta.removed.is_empty() {
            let store = &self.store;
            self.by_icao.retain(|handle| store.contains(handle));
        }
        for &handle in &delta.added {
            if let Some(airline) = self.store.get(handle) {
                self.by_icao.put(handle, airline);
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
    pub fn get(&self, handle: Handle<Airline>) -> Option<&Airline> {
        self.store.get(handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<Airline>, &Airline)> + '_ {
        self.store.iter()
    }

    /// Airline with the given ICAO designator.
    #[must_use]
    pub fn get_by_icao(&self, icao: &str) -> Option<&Airline> {
        self.get_by_key(icao).and_then(|handle| self.store.get(handle))
    }
}

impl AirlineLookup for AirlineRepository {
    fn get_by_key(&self, icao_prefix: &str) -> Option<Handle<Airline>> {
        self.by_icao
            .get(icao_prefix)
            .iter()
            .copied()
            .find(|&handle| self.store.contains(handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn airline(icao: &str, name: &str) -> RawAirline {
        RawAirline {
            icao: icao.to_string(),
            name: name.to_string(),
            callsign: String::new(),
            country: "Germany".to_string(),
        }
    }

    #[test]
    fn test_lookup_by_key() {
        let mut repository = AirlineRepository::new();
        let mut quality = QualityLog::new();
        repository.reconcile(vec![airline("DLH", "Lufthansa"), airline("BAW", "British Airways")], &mut quality);

        assert_eq!(repository.get_by_icao("dlh").map(|a| a.name.as_str()), Some("Lufthansa"));
        assert!(repository.get_by_key("XXX").is_none());
    }

    #[test]
    fn test_removed_airline_is_not_found() {
        let mut repository = AirlineRepository::new();
        let mut quality = QualityLog::new();
        repository.reconcile(vec![airline("DLH", "Lufthansa")], &mut quality);
        repository.reconcile(Vec::new(), &mut quality);

        assert!(repository.get_by_key("DLH").is_none());
        assert!(repository.is_empty());
    }
}
