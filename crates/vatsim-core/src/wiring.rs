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

//! Cross-entity link derivation.
//!
//! Runs after each family has been reconciled. Links are recomputed for every
//! live entity of the family, so a link can follow a target that appeared
//! this cycle even when the source itself did not change. Removal hooks clear
//! links explicitly before the source is evicted.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::callsign::{CallsignParseResult, CallsignParser};
use crate::model::{Airline, Airport, AirportRef, Client, ClientDetails, FirBoundary, FlightInformationRegion, Pilot};
use crate::position::Position;
use crate::quality::{DataQualityWarning, QualityLog};
use crate::relation::Relation;
use crate::repository::BoundaryRepository;
use crate::store::Handle;

lazy_static! {
    static ref AIRLINE_CALLSIGN: Regex = Regex::new(r"^([A-Z]{3})([0-9][A-Z0-9]*)$").expect("valid airline callsign pattern");
}

/// Point-in-polygon lookup of FIR boundaries.
pub trait BoundaryContainment {
    /// Boundaries containing `position`, possibly none.
    fn boundaries_containing(&self, position: Position) -> Vec<Handle<FirBoundary>>;
}

/// Airport lookup by flight-plan code.
pub trait AirportLookup {
    /// Live airports matching `code`, in insertion order.
    fn handles_by_code(&self, code: &str) -> Vec<Handle<Airport>>;
}

/// Airline lookup by 3-letter ICAO designator.
pub trait AirlineLookup {
    fn get_by_key(&self, icao_prefix: &str) -> Option<Handle<Airline>>;
}

/// Split an airline-style callsign into designator and flight number.
///
/// ```
/// use vatsim_core::wiring::split_airline_callsign;
///
/// assert_eq!(split_airline_callsign("DLH456"), Some(("DLH", "456")));
/// assert_eq!(split_airline_callsign("N12345"), None);
/// ```
#[must_use]
pub fn split_airline_callsign(callsign: &str) -> Option<(&str, &str)> {
    let captures = AIRLINE_CALLSIGN.captures(callsign)?;
    Some((captures.get(1)?.as_str(), captures.get(2)?.as_str()))
}

/// Resolve a flight-plan airport code.
///
/// Blank codes and the literal `none` mean no airport. An unknown code is a
/// note; several matches pick the first by insertion order and warn.
pub fn resolve_airport_code(airports: &dyn AirportLookup, code: &str, quality: &mut QualityLog) -> Option<Handle<Airport>> {
    let code = code.trim();
    if code.is_empty() || code.eq_ignore_ascii_case("none") {
        return None;
    }

    let matches = airports.handles_by_code(code);
    match matches.len() {
        0 => {
            quality.record(DataQualityWarning::UnknownAirport { code: code.to_string() });
            None
        }
        1 => Some(matches[0]),
        count => {
            quality.record(DataQualityWarning::AmbiguousAirport {
                code: code.to_string(),
                matches: count,
            });
            Some(matches[0])
        }
    }
}

/// Collaborators consulted while wiring clients.
#[derive(Clone, Copy)]
pub struct ClientWiring<'a> {
    pub airports: &'a dyn AirportLookup,
    pub containment: &'a dyn BoundaryContainment,
    pub airlines: &'a dyn AirlineLookup,
    pub parser: &'a dyn CallsignParser,
}

impl std::fmt::Debug for ClientWiring<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientWiring").finish_non_exhaustive()
    }
}

/// Links of a pilot or controller after an add or update.
pub(crate) fn wire_client(
    handle: Handle<Client>,
    client: &mut Client,
    wiring: &ClientWiring<'_>,
    pilot_boundaries: &mut Relation<Client, FirBoundary>,
    fir_controllers: &mut Relation<Client, FlightInformationRegion>,
    quality: &mut QualityLog,
) {
    let callsign = client.callsign.clone();
    match &mut client.details {
        ClientDetails::Pilot(pilot) => {
            wire_pilot(handle, &callsign, pilot, wiring, pilot_boundaries, quality);
        }
        ClientDetails::Controller(controller) | ClientDetails::Atis(controller) => {
            controller.station = wiring.parser.parse(&callsign, controller);
            fir_controllers.set_one(handle, controller.station.fir);
        }
    }
}

fn wire_pilot(
    handle: Handle<Client>,
    callsign: &str,
    pilot: &mut Pilot,
    wiring: &ClientWiring<'_>,
    pilot_boundaries: &mut Relation<Client, FirBoundary>,
    quality: &mut QualityLog,
) {
    if let Some(plan) = &mut pilot.flight_plan {
        for airport in plan.airport_refs_mut() {
            wire_airport(airport, wiring.airports, quality);
        }
    }

    pilot_boundaries.set(handle, wiring.containment.boundaries_containing(pilot.position));

    match split_airline_callsign(callsign) {
        Some((designator, number)) => {
            pilot.airline = wiring.airlines.get_by_key(designator);
            pilot.flight_number = Some(number.to_string());
        }
        None => {
            pilot.airline = None;
            pilot.flight_number = None;
        }
    }
}

fn wire_airport(airport: &mut AirportRef, airports: &dyn AirportLookup, quality: &mut QualityLog) {
    airport.airport = resolve_airport_code(airports, &airport.code, quality);
}

/// Clear every link of a client that is about to be evicted.
pub(crate) fn unwire_client(
    handle: Handle<Client>,
    client: &mut Client,
    pilot_boundaries: &mut Relation<Client, FirBoundary>,
    fir_controllers: &mut Relation<Client, FlightInformationRegion>,
) {
    match &mut client.details {
        ClientDetails::Pilot(pilot) => {
            pilot.clear_links();
            pilot_boundaries.clear_source(handle);
        }
        ClientDetails::Controller(controller) | ClientDetails::Atis(controller) => {
            controller.station = CallsignParseResult::EMPTY;
            fir_controllers.clear_source(handle);
        }
    }
    debug!("Unwired client {}", client.callsign);
}

/// Link a FIR to its boundary, by boundary id or else by ICAO code.
pub(crate) fn wire_fir(
    handle: Handle<FlightInformationRegion>,
    fir: &FlightInformationRegion,
    boundaries: &BoundaryRepository,
    fir_boundaries: &mut Relation<FlightInformationRegion, FirBoundary>,
    quality: &mut QualityLog,
) {
    let lookup_id = fir.boundary_lookup_id();
    let boundary = boundaries.handle_by_id(lookup_id);
    if boundary.is_none() {
        quality.record(DataQualityWarning::UnknownBoundary {
            fir: fir.icao.clone(),
            boundary: lookup_id.to_string(),
        });
    }
    fir_boundaries.set_one(handle, boundary);
}
