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

//! Airport repository.
//!
//! The reference data lists one row per airport alias, so rows are merged
//! per ICAO code before reconciliation. Single-valued fields that disagree
//! across rows keep the first value and raise a warning.

use std::collections::HashMap;

use crate::error::CoreError;
use crate::lookup::{normalize_key, KeyIndex};
use crate::model::{Airport, AirportRecord};
use crate::position::Position;
use crate::quality::{DataQualityWarning, QualityLog};
use crate::raw::RawAirport;
use crate::reconcile::{reconcile, Delta};
use crate::store::{EntityStore, Handle};
use crate::wiring::AirportLookup;

fn airport_icao(airport: &Airport) -> &str {
    &airport.icao
}

fn airport_iatas(airport: &Airport) -> &[String] {
    &airport.iatas
}

#[derive(Debug)]
pub struct AirportRepository {
    store: EntityStore<String, Airport>,
    by_icao: KeyIndex<Airport>,
    by_iata: KeyIndex<Airport>,
}

impl Default for AirportRepository {
    fn default() -> Self {
        Self {
            store: EntityStore::new(),
            by_icao: KeyIndex::single(airport_icao),
            by_iata: KeyIndex::many(airport_iatas),
        }
    }
}

impl AirportRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge raw rows into one record per ICAO code, in first-seen order.
    ///
    /// Pseudo airports are skipped. Fails when an airport ends up without a
    /// position, before anything has been mutated.
    pub fn aggregate(raws: &[RawAirport], quality: &mut QualityLog) -> Result<Vec<AirportRecord>, CoreError> {
        let mut groups: Vec<(String, Vec<&RawAirport>)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();

        for raw in raws.iter().filter(|raw| !raw.pseudo) {
            let icao = normalize_key(&raw.icao);
            if icao.is_empty() {
                continue;
            }
            match positions.get(&icao) {
                Some(&position) => groups[position].1.push(raw),
                None => {
                    positions.insert(icao.clone(), groups.len());
                    groups.push((icao, vec![raw]));
                }
            }
        }

        groups
            .into_iter()
            .map(|(icao, rows)| merge(icao, &rows, quality))
            .collect()
    }

    pub(crate) fn reconcile(&mut self, records: Vec<AirportRecord>, quality: &mut QualityLog) -> Delta<String, Airport> {
        let delta = reconcile(&mut self.store, records, quality, |_, _| {});
        if !delta.removed.is_empty() {
            let store = &self.store;
            self.by_icao.retain(|handle| store.contains(handle));
            self.by_iata.retain(|handle| store.contains(handle));
        }

        for &handle in &delta.added {
            if let Some(airport) = self.store.get(handle) {
                self.by_icao.put(handle, airport);
                self.by_iata.put(handle, airport);
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
    pub fn get(&self, handle: Handle<Airport>) -> Option<&Airport> {
        self.store.get(handle)
    }

    /// All airports in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (Handle<Airport>, &Airport)> + '_ {
        self.store.iter()
    }

    /// Live airports with the given ICAO code.
    #[must_use]
    pub fn handles_by_icao(&self, icao: &str) -> Vec<Handle<Airport>> {
        self.live(self.by_icao.get(icao))
    }

    /// Live airports listing the given IATA/LID code.
    #[must_use]
    pub fn handles_by_iata(&self, iata: &str) -> Vec<Handle<Airport>> {
        self.live(self.by_iata.get(iata))
    }

    #[must_use]
    pub fn get_by_icao(&self, icao: &str) -> Vec<&Airport> {
        self.resolve(self.by_icao.get(icao))
    }

    #[must_use]
    pub fn get_by_iata(&self, iata: &str) -> Vec<&Airport> {
        self.resolve(self.by_iata.get(iata))
    }

    fn live(&self, handles: &[Handle<Airport>]) -> Vec<Handle<Airport>> {
        handles
            .iter()
            .copied()
            .filter(|&handle| self.store.contains(handle))
            .collect()
    }

    fn resolve(&self, handles: &[Handle<Airport>]) -> Vec<&Airport> {
        handles
            .iter()
            .filter_map(|&handle| self.store.get(handle))
            .collect()
    }
}

/// Merge the rows of one ICAO code.
fn merge(icao: String, rows: &[&RawAirport], quality: &mut QualityLog) -> Result<AirportRecord, CoreError> {
    let mut names: Vec<String> = Vec::new();
    let mut iatas: Vec<String> = Vec::new();
    let mut candidates: Vec<Position> = Vec::new();
    let mut firs: Vec<String> = Vec::new();

    for row in rows {
        let name = row.name.trim();
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }

        if let Some(iata) = row.iata_lid.as_deref().map(normalize_key) {
            if !iata.is_empty() && !iatas.contains(&iata) {
                iatas.push(iata);
            }
        }

        if let (Some(latitude), Some(longitude)) = (row.latitude, row.longitude) {
            let position = Position::new(latitude, longitude);
            if !candidates.contains(&position) {
                candidates.push(position);
            }
        }

        if let Some(fir) = row.fir.as_deref().map(normalize_key) {
            if !fir.is_empty() && !firs.contains(&fir) {
                firs.push(fir);
            }
        }
    }

    let position = exactly_one(&icao, "position", candidates, quality)
        .ok_or_else(|| CoreError::invariant(format!("airport {icao} has no position")))?;

    let fir = exactly_one(&icao, "fir", firs, quality);

    Ok(AirportRecord {
        icao,
        iatas,
        names,
        position,
        fir,
    })
}

/// First of `values`, warning when there is more than one.
/// Flight-plan codes are ICAO codes.
impl AirportLookup for AirportRepository {
    fn handles_by_code(&self, code: &str) -> Vec<Handle<Airport>> {
        self.handles_by_icao(code)
    }
}

fn exactly_one<V>(icao: &str, field: &'static str, values: Vec<V>, quality: &mut QualityLog) -> Option<V> {
    if values.len() > 1 {
        quality.record(DataQualityWarning::ConflictingValues {
            family: "airport",
            key: icao.to_string(),
            field,
        });
    }
    values.into_iter().next()
}
