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
use crate::model::{FirKey, FlightInformationRegion};
use crate::quality::QualityLog;
use crate::raw::RawFlightInformationRegion;
use crate::reconcile::{reconcile, Delta};
use crate::store::{EntityStore, Handle};

fn fir_icao(fir: &FlightInformationRegion) -> &str {
    &fir.icao
}

fn fir_prefix(fir: &FlightInformationRegion) -> &str {
    &fir.prefix_position
}

#[derive(Debug)]
pub struct FirRepository {
    store: EntityStore<FirKey, FlightInformationRegion>,
    by_icao: KeyIndex<FlightInformationRegion>,
    by_prefix: KeyIndex<FlightInformationRegion>,
}

impl Default for FirRepository {
    fn default() -> Self {
        Self {
            store: EntityStore::new(),
            by_icao: KeyIndex::single(fir_icao),
            by_prefix: KeyIndex::single(fir_prefix),
        }
    }
}

impl FirRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn reconcile<F>(
        &mut self,
        raws: Vec<RawFlightInformationRegion>,
        quality: &mut QualityLog,
        on_remove: F,
    ) -> Delta<FirKey, FlightInformationRegion>
    where
        F: FnMut(Handle<FlightInformationRegion>, &mut FlightInformationRegion),
    {
        let delta = reconcile(&mut self.store, raws, quality, on_remove);
        if !delta.removed.is_empty() {
            let store = &self.store;
            self.by_icao.retain(|handle| store.contains(handle));
            self.by_prefix.retain(|handle| store.contains(handle));
        }
        for &handle in &delta.added {
            if let Some(fir) = self.store.get(handle) {
                self.by_icao.put(handle, fir);
                self.by_prefix.put(handle, fir);
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
    pub fn get(&self, handle: Handle<FlightInformationRegion>) -> Option<&FlightInformationRegion> {
        self.store.get(handle)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle<FlightInformationRegion>, &FlightInformationRegion)> + '_ {
        self.store.iter()
    }

    #[must_use]
    pub fn handles_by_icao(&self, icao: &str) -> Vec<Handle<FlightInformationRegion>> {
        self.live(self.by_icao.get(icao))
    }

    /// FIRs staffed under the given callsign prefix.
    #[must_use]
    pub fn handles_by_prefix(&self, prefix: &str) -> Vec<Handle<FlightInformationRegion>> {
        self.live(self.by_prefix.get(prefix))
    }

    #[must_use]
    pub fn get_by_icao(&self, icao: &str) -> Vec<&FlightInformationRegion> {
        self.handles_by_icao(icao)
            .into_iter()
            .filter_map(|handle| self.store.get(handle))
            .collect()
    }

    fn live(&self, handles: &[Handle<FlightInformationRegion>]) -> Vec<Handle<FlightInformationRegion>> {
        handles
            .iter()
            .copied()
            .filter(|&handle| self.store.contains(handle))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fir(icao: &str, prefix: &str) -> RawFlightInformationRegion {
        RawFlightInformationRegion {
            icao: icao.to_string(),
            name: format!("{icao} FIR"),
            prefix_position: prefix.to_string(),
            boundary_id: String::new(),
        }
    }

    #[test]
    fn test_sectors_share_icao() {
        let mut repository = FirRepository::new();
        let mut quality = QualityLog::new();
        repository.reconcile(vec![fir("EGTT", "LON"), fir("EGTT", "LTC"), fir("EDGG", "")], &mut quality, |_, _| {});

        assert!(quality.is_empty());
        assert_eq!(repository.len(), 3);
        assert_eq!(repository.get_by_icao("egtt").len(), 2);
        assert_eq!(repository.handles_by_prefix("LTC").len(), 1);
        assert!(repository.handles_by_prefix("").is_empty());
    }
}
