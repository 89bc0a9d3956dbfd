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

//! The live network graph and the per-cycle apply step.

use std::fmt;

use chrono::{DateTime, Utc};
use log::info;

use crate::callsign::PrefixCallsignParser;
use crate::error::CoreError;
use crate::model::{Airline, Airport, Client, FirBoundary, FlightInformationRegion};
use crate::quality::{DataQualityWarning, QualityLog};
use crate::raw::NetworkSnapshot;
use crate::reconcile::Delta;
use crate::relation::Relation;
use crate::repository::{AirlineRepository, AirportRepository, BoundaryRepository, ClientRepository, FirRepository};
use crate::store::Handle;
use crate::wiring::{self, ClientWiring};

/// One family's changes in a cycle.
///
/// Handles in `removed` no longer resolve; they identify entities an
/// observer may still hold.
pub struct ChangeSet<T> {
    pub added: Vec<Handle<T>>,
    pub updated: Vec<Handle<T>>,
    pub removed: Vec<Handle<T>>,
    /// Entities retained without any change.
    pub unchanged: usize,
}

impl<T> ChangeSet<T> {
    /// True when nothing was added, updated or removed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

impl<T> Default for ChangeSet<T> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            updated: Vec::new(),
            removed: Vec::new(),
            unchanged: 0,
        }
    }
}

impl<T> Clone for ChangeSet<T> {
    fn clone(&self) -> Self {
        Self {
            added: self.added.clone(),
            updated: self.updated.clone(),
            removed: self.removed.clone(),
            unchanged: self.unchanged,
        }
    }
}

impl<T> PartialEq for ChangeSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.added == other.added
            && self.updated == other.updated
            && self.removed == other.removed
            && self.unchanged == other.unchanged
    }
}

impl<T> fmt::Debug for ChangeSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeSet")
            .field("added", &self.added)
            .field("updated", &self.updated)
            .field("removed", &self.removed)
            .field("unchanged", &self.unchanged)
            .finish()
    }
}

impl<K, T> From<&Delta<K, T>> for ChangeSet<T> {
    fn from(delta: &Delta<K, T>) -> Self {
        Self {
            added: delta.added.clone(),
            updated: delta.updated.clone(),
            removed: delta.removed.iter().map(|(handle, _)| *handle).collect(),
            unchanged: delta.unchanged.len(),
        }
    }
}

impl<T> fmt::Display for ChangeSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "+{} ~{} -{}", self.added.len(), self.updated.len(), self.removed.len())
    }
}

/// Summary of one completed cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub cycle: u64,
    pub fetched_at: DateTime<Utc>,
    pub airlines: ChangeSet<Airline>,
    pub boundaries: ChangeSet<FirBoundary>,
    pub firs: ChangeSet<FlightInformationRegion>,
    pub airports: ChangeSet<Airport>,
    pub clients: ChangeSet<Client>,
    /// Pilots in the spatial index after the rebuild.
    pub spatially_indexed: usize,
    pub warnings: Vec<DataQualityWarning>,
}

impl CycleReport {
    /// True when no family changed.
    #[must_use]
    pub fn is_quiet(&self) -> bool {
        self.airlines.is_empty()
            && self.boundaries.is_empty()
            && self.firs.is_empty()
            && self.airports.is_empty()
            && self.clients.is_empty()
    }
}

/// Every repository plus the bidirectional links between them.
#[derive(Debug, Default)]
pub struct NetworkState {
    airlines: AirlineRepository,
    boundaries: BoundaryRepository,
    firs: FirRepository,
    airports: AirportRepository,
    clients: ClientRepository,
    fir_boundaries: Relation<FlightInformationRegion, FirBoundary>,
    fir_controllers: Relation<Client, FlightInformationRegion>,
    pilot_boundaries: Relation<Client, FirBoundary>,
    cycle: u64,
    last_fetched: Option<DateTime<Utc>>,
}

impl NetworkState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile one snapshot into the graph.
    ///
    /// Families run in dependency order: airlines, boundaries, FIRs,
    /// airports, then clients. Each family removes vanished entities first,
    /// then adds and updates, then wires. The only failure is an invariant
    /// violation found while merging airports, which happens before anything
    /// is mutated.
    pub fn apply(&mut self, snapshot: NetworkSnapshot) -> Result<CycleReport, CoreError> {
        let mut quality = QualityLog::new();

        let airport_records = AirportRepository::aggregate(&snapshot.airports, &mut quality)?;

        let airlines = self.airlines.reconcile(snapshot.airlines, &mut quality);

        let fir_boundaries = &mut self.fir_boundaries;
        let pilot_boundaries = &mut self.pilot_boundaries;
        let boundaries = self.boundaries.reconcile(snapshot.boundaries, &mut quality, |handle, _| {
            fir_boundaries.clear_target(handle);
            pilot_boundaries.clear_target(handle);
        });

        let fir_controllers = &mut self.fir_controllers;
        let clients = &mut self.clients;
        let firs = self.firs.reconcile(snapshot.firs, &mut quality, |handle, _| {
            fir_boundaries.clear_source(handle);
            for &controller in fir_controllers.sources(handle) {
                if let Some(controller) = clients.get_mut(controller).and_then(Client::controller_mut) {
                    controller.station.fir = None;
                }
            }
            fir_controllers.clear_target(handle);
        });
        for handle in firs.live() {
            if let Some(fir) = self.firs.get(handle) {
                wiring::wire_fir(handle, fir, &self.boundaries, &mut self.fir_boundaries, &mut quality);
            }
        }

        let airports = self.airports.reconcile(airport_records, &mut quality);

        let pilot_boundaries = &mut self.pilot_boundaries;
        let fir_controllers = &mut self.fir_controllers;
        let clients = self.clients.reconcile(snapshot.clients, &mut quality, |handle, client| {
            wiring::unwire_client(handle, client, pilot_boundaries, fir_controllers);
        });

        let parser = PrefixCallsignParser::new(&self.airports, &self.firs);
        let client_wiring = ClientWiring {
            airports: &self.airports,
            containment: &self.boundaries,
            airlines: &self.airlines,
            parser: &parser,
        };
        for handle in clients.live() {
            if let Some(client) = self.clients.get_mut(handle) {
                wiring::wire_client(
                    handle,
                    client,
                    &client_wiring,
                    &mut self.pilot_boundaries,
                    &mut self.fir_controllers,
                    &mut quality,
                );
            }
        }

        self.clients.rebuild_spatial(&mut quality);

        self.cycle += 1;
        self.last_fetched = Some(snapshot.fetched_at);

        let report = CycleReport {
            cycle: self.cycle,
            fetched_at: snapshot.fetched_at,
            airlines: ChangeSet::from(&airlines),
            boundaries: ChangeSet::from(&boundaries),
            firs: ChangeSet::from(&firs),
            airports: ChangeSet::from(&airports),
            clients: ChangeSet::from(&clients),
            spatially_indexed: self.clients.spatially_indexed(),
            warnings: quality.into_warnings(),
        };

        info!(
            "Cycle {} applied: clients {}, airports {}, firs {}, boundaries {}, airlines {} ({} warnings)",
            report.cycle,
            report.clients,
            report.airports,
            report.firs,
            report.boundaries,
            report.airlines,
            report.warnings.len()
        );

        Ok(report)
    }

    /// Number of cycles applied so far.
    #[must_use]
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Fetch time of the snapshot behind the current state.
    #[must_use]
    pub fn last_fetched(&self) -> Option<DateTime<Utc>> {
        self.last_fetched
    }

    #[must_use]
    pub fn airlines(&self) -> &AirlineRepository {
        &self.airlines
    }

    #[must_use]
    pub fn boundaries(&self) -> &BoundaryRepository {
        &self.boundaries
    }

    #[must_use]
    pub fn firs(&self) -> &FirRepository {
        &self.firs
    }

    #[must_use]
    pub fn airports(&self) -> &AirportRepository {
        &self.airports
    }

    #[must_use]
    pub fn clients(&self) -> &ClientRepository {
        &self.clients
    }

    /// Boundary of a FIR.
    #[must_use]
    pub fn fir_boundary(&self, fir: Handle<FlightInformationRegion>) -> Option<&FirBoundary> {
        self.fir_boundaries
            .target(fir)
            .and_then(|boundary| self.boundaries.get(boundary))
    }

    /// FIRs bounded by a boundary.
    #[must_use]
    pub fn boundary_firs(&self, boundary: Handle<FirBoundary>) -> Vec<&FlightInformationRegion> {
        self.fir_boundaries
            .sources(boundary)
            .iter()
            .filter_map(|&fir| self.firs.get(fir))
            .collect()
    }

    /// Controllers working a FIR.
    #[must_use]
    pub fn fir_controllers(&self, fir: Handle<FlightInformationRegion>) -> Vec<&Client> {
        self.fir_controllers
            .sources(fir)
            .iter()
            .filter_map(|&client| self.clients.get(client))
            .collect()
    }

    /// FIR a controller is working.
    #[must_use]
    pub fn controller_fir(&self, controller: Handle<Client>) -> Option<&FlightInformationRegion> {
        self.fir_controllers
            .target(controller)
            .and_then(|fir| self.firs.get(fir))
    }

    /// Boundaries containing a pilot.
    #[must_use]
    pub fn pilot_boundaries(&self, pilot: Handle<Client>) -> Vec<&FirBoundary> {
        self.pilot_boundaries
            .targets(pilot)
            .iter()
            .filter_map(|&boundary| self.boundaries.get(boundary))
            .collect()
    }

    /// Pilots inside a boundary.
    #[must_use]
    pub fn boundary_pilots(&self, boundary: Handle<FirBoundary>) -> Vec<&Client> {
        self.pilot_boundaries
            .sources(boundary)
            .iter()
            .filter_map(|&pilot| self.clients.get(pilot))
            .collect()
    }

    /// Whether every relation has matching forward and reverse sides and
    /// only links live entities.
    #[must_use]
    pub fn relations_consistent(&self) -> bool {
        self.fir_boundaries.is_symmetric()
            && self.fir_controllers.is_symmetric()
            && self.pilot_boundaries.is_symmetric()
            && self.firs.iter().all(|(fir, _)| {
                self.fir_boundaries
                    .targets(fir)
                    .iter()
                    .all(|&boundary| self.boundaries.get(boundary).is_some())
            })
            && self.clients.iter().all(|(client, _)| {
                self.pilot_boundaries
                    .targets(client)
                    .iter()
                    .all(|&boundary| self.boundaries.get(boundary).is_some())
                    && self
                        .fir_controllers
                        .targets(client)
                        .iter()
                        .all(|&fir| self.firs.get(fir).is_some())
            })
    }
}
