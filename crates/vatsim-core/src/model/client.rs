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

//! Network clients: pilots, controllers and ATIS stations.

use chrono::{DateTime, Utc};

use crate::callsign::CallsignParseResult;
use crate::model::{Airline, Airport};
use crate::position::Position;
use crate::raw::{RawClient, RawClientDetails, RawController, RawFlightPlan, RawPilot};
use crate::reconcile::{assign, assign_from, Reconcile};
use crate::store::Handle;

/// Client subtype, fixed when the client is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClientKind {
    Pilot,
    Controller,
    Atis,
}

/// One network identity may run several sessions at once under different
/// callsigns or kinds, so all three make up the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClientKey {
    pub cid: u64,
    pub callsign: String,
    pub kind: ClientKind,
}

/// An airport code from a flight plan and the airport it resolved to.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AirportRef {
    pub code: String,
    pub airport: Option<Handle<Airport>>,
}

impl AirportRef {
    /// Replace the code, dropping the resolved airport if the code changed.
    fn set_code(&mut self, code: &str) -> bool {
        if self.code == code {
            return false;
        }
        self.code = code.to_string();
        self.airport = None;
        true
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FlightPlan {
    pub flight_rules: String,
    pub aircraft: String,
    pub departure: AirportRef,
    pub arrival: AirportRef,
    pub alternate: AirportRef,
    pub cruise_tas: String,
    pub altitude: String,
    pub route: String,
    pub remarks: String,
}

impl FlightPlan {
    fn populate(&mut self, raw: &RawFlightPlan) -> bool {
        let mut changed = assign_from(&mut self.flight_rules, &raw.flight_rules);
        changed |= assign_from(&mut self.aircraft, &raw.aircraft);
        changed |= self.departure.set_code(&raw.departure);
        changed |= self.arrival.set_code(&raw.arrival);
        changed |= self.alternate.set_code(&raw.alternate);
        changed |= assign_from(&mut self.cruise_tas, &raw.cruise_tas);
        changed |= assign_from(&mut self.altitude, &raw.altitude);
        changed |= assign_from(&mut self.route, &raw.route);
        changed |= assign_from(&mut self.remarks, &raw.remarks);
        changed
    }

    /// The three airport references, mutably, for wiring.
    pub(crate) fn airport_refs_mut(&mut self) -> [&mut AirportRef; 3] {
        [&mut self.departure, &mut self.arrival, &mut self.alternate]
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pilot {
    pub position: Position,
    /// Feet.
    pub altitude: i32,
    /// Knots.
    pub ground_speed: i32,
    pub heading: i32,
    pub transponder: String,
    pub qnh_mb: i32,
    pub flight_plan: Option<FlightPlan>,
    pub airline: Option<Handle<Airline>>,
    pub flight_number: Option<String>,
}

impl Pilot {
    fn populate(&mut self, raw: &RawPilot) -> bool {
        let mut changed = assign(&mut self.position, Position::new(raw.latitude, raw.longitude));
        changed |= assign(&mut self.altitude, raw.altitude);
        changed |= assign(&mut self.ground_speed, raw.ground_speed);
        changed |= assign(&mut self.heading, raw.heading);
        changed |= assign_from(&mut self.transponder, &raw.transponder);
        changed |= assign(&mut self.qnh_mb, raw.qnh_mb);

        changed |= match (&mut self.flight_plan, &raw.flight_plan) {
            (Some(plan), Some(raw_plan)) => plan.populate(raw_plan),
            (None, Some(raw_plan)) => {
                let mut plan = FlightPlan::default();
                plan.populate(raw_plan);
                self.flight_plan = Some(plan);
                true
            }
            (Some(_), None) => {
                self.flight_plan = None;
                true
            }
            (None, None) => false,
        };
        changed
    }

    /// Drop every derived link.
    pub(crate) fn clear_links(&mut self) {
        if let Some(plan) = &mut self.flight_plan {
            for airport in plan.airport_refs_mut() {
                airport.airport = None;
            }
        }
        self.airline = None;
        self.flight_number = None;
    }
}

/// Controller or ATIS station details.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Controller {
    pub frequency: String,
    /// Raw network facility code.
    pub facility: i32,
    pub visual_range: i32,
    pub text_atis: Vec<String>,
    pub atis_code: Option<String>,
    /// Parsed station, or [`CallsignParseResult::EMPTY`] before the first
    /// wiring pass and after removal.
    pub station: CallsignParseResult,
}

impl Controller {
    fn populate(&mut self, raw: &RawController) -> bool {
        let mut changed = assign_from(&mut self.frequency, &raw.frequency);
        changed |= assign(&mut self.facility, raw.facility);
        changed |= assign(&mut self.visual_range, raw.visual_range);
        changed |= assign_from(&mut self.text_atis, &raw.text_atis);
        changed |= assign_from(&mut self.atis_code, &raw.atis_code);
        changed
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClientDetails {
    Pilot(Pilot),
    Controller(Controller),
    Atis(Controller),
}

impl ClientDetails {
    #[must_use]
    pub fn kind(&self) -> ClientKind {
        match self {
            Self::Pilot(_) => ClientKind::Pilot,
            Self::Controller(_) => ClientKind::Controller,
            Self::Atis(_) => ClientKind::Atis,
        }
    }
}

/// A connected network client.
#[derive(Debug, Clone, PartialEq)]
pub struct Client {
    pub cid: u64,
    pub callsign: String,
    pub name: String,
    pub server: String,
    pub rating: i32,
    pub logon_time: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub details: ClientDetails,
}

impl Client {
    #[must_use]
    pub fn kind(&self) -> ClientKind {
        self.details.kind()
    }

    #[must_use]
    pub fn pilot(&self) -> Option<&Pilot> {
        match &self.details {
            ClientDetails::Pilot(pilot) => Some(pilot),
            _ => None,
        }
    }

    pub(crate) fn pilot_mut(&mut self) -> Option<&mut Pilot> {
        match &mut self.details {
            ClientDetails::Pilot(pilot) => Some(pilot),
            _ => None,
        }
    }

    /// Controller details for controllers and ATIS stations alike.
    #[must_use]
    pub fn controller(&self) -> Option<&Controller> {
        match &self.details {
            ClientDetails::Controller(controller) | ClientDetails::Atis(controller) => Some(controller),
            ClientDetails::Pilot(_) => None,
        }
    }

    pub(crate) fn controller_mut(&mut self) -> Option<&mut Controller> {
        match &mut self.details {
            ClientDetails::Controller(controller) | ClientDetails::Atis(controller) => Some(controller),
            ClientDetails::Pilot(_) => None,
        }
    }

    #[must_use]
    pub fn is_pilot(&self) -> bool {
        self.kind() == ClientKind::Pilot
    }

    /// Controllers and ATIS stations.
    #[must_use]
    pub fn is_controller(&self) -> bool {
        !self.is_pilot()
    }
}

fn raw_kind(details: &RawClientDetails) -> ClientKind {
    match details {
        RawClientDetails::Pilot(_) => ClientKind::Pilot,
        RawClientDetails::Controller(_) => ClientKind::Controller,
        RawClientDetails::Atis(_) => ClientKind::Atis,
    }
}

impl Reconcile<RawClient> for Client {
    type Key = ClientKey;
    const FAMILY: &'static str = "client";

    fn key(raw: &RawClient) -> ClientKey {
        ClientKey {
            cid: raw.cid,
            callsign: raw.callsign.clone(),
            kind: raw_kind(&raw.details),
        }
    }

    fn create(raw: &RawClient) -> Self {
        let details = match raw.details {
            RawClientDetails::Pilot(_) => ClientDetails::Pilot(Pilot::default()),
            RawClientDetails::Controller(_) => ClientDetails::Controller(Controller::default()),
            RawClientDetails::Atis(_) => ClientDetails::Atis(Controller::default()),
        };

        Self {
            cid: raw.cid,
            callsign: raw.callsign.clone(),
            name: String::new(),
            server: String::new(),
            rating: 0,
            logon_time: raw.logon_time,
            last_updated: raw.last_updated,
            details,
        }
    }

    fn populate(&mut self, raw: &RawClient) -> bool {
        let mut changed = assign_from(&mut self.name, &raw.name);
        changed |= assign_from(&mut self.server, &raw.server);
        changed |= assign(&mut self.rating, raw.rating);
        changed |= assign(&mut self.logon_time, raw.logon_time);
        changed |= assign(&mut self.last_updated, raw.last_updated);

        // The kind is part of the key, so the variants always line up.
        changed |= match (&mut self.details, &raw.details) {
            (ClientDetails::Pilot(pilot), RawClientDetails::Pilot(raw)) => pilot.populate(raw),
            (ClientDetails::Controller(controller), RawClientDetails::Controller(raw))
            | (ClientDetails::Atis(controller), RawClientDetails::Atis(raw)) => controller.populate(raw),
            _ => false,
        };
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Arena;

    fn raw_pilot(callsign: &str, departure: &str) -> RawClient {
        RawClient {
            cid: 1_234_567,
            callsign: callsign.to_string(),
            name: "Test Pilot".to_string(),
            server: "GERMANY".to_string(),
            rating: 1,
            logon_time: Utc::now(),
            last_updated: Utc::now(),
            details: RawClientDetails::Pilot(RawPilot {
                latitude: 50.03,
                longitude: 8.57,
                altitude: 364,
                flight_plan: Some(RawFlightPlan {
                    departure: departure.to_string(),
                    arrival: "KJFK".to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn test_key_includes_kind() {
        let pilot = raw_pilot("DLH456", "EDDF");
        let mut atis = pilot.clone();
        atis.details = RawClientDetails::Atis(RawController::default());

        assert_ne!(Client::key(&pilot), Client::key(&atis));
        assert_eq!(Client::key(&pilot).kind, ClientKind::Pilot);
    }

    #[test]
    fn test_populate_keeps_links_when_code_is_unchanged() {
        let mut airports = Arena::new();
        let eddf = airports.insert(crate::model::Airport {
            icao: "EDDF".to_string(),
            iatas: Vec::new(),
            names: Vec::new(),
            position: Position::default(),
            fir: None,
        });

        let raw = raw_pilot("DLH456", "EDDF");
        let mut client = Client::create(&raw);
        client.populate(&raw);
        let plan = client.pilot_mut().and_then(|p| p.flight_plan.as_mut()).unwrap();
        plan.departure.airport = Some(eddf);

        client.populate(&raw);
        let departure = &client.pilot().unwrap().flight_plan.as_ref().unwrap().departure;
        assert_eq!(departure.airport, Some(eddf));

        client.populate(&raw_pilot("DLH456", "EDDM"));
        let departure = &client.pilot().unwrap().flight_plan.as_ref().unwrap().departure;
        assert_eq!(departure.code, "EDDM");
        assert!(departure.airport.is_none());
    }

    #[test]
    fn test_controller_accessors() {
        let mut raw = raw_pilot("EDDF_ATIS", "");
        raw.details = RawClientDetails::Atis(RawController {
            frequency: "118.025".to_string(),
            atis_code: Some("K".to_string()),
            ..Default::default()
        });

        let mut client = Client::create(&raw);
        client.populate(&raw);

        assert!(client.is_controller());
        assert!(client.pilot().is_none());
        let controller = client.controller().unwrap();
        assert_eq!(controller.atis_code.as_deref(), Some("K"));
        assert_eq!(controller.station, CallsignParseResult::EMPTY);
    }
}
