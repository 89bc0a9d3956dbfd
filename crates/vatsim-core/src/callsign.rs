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

//! Controller callsign parsing.
//!
//! Controller callsigns follow `IDENT[_MID]_SUFFIX`, e.g. `EDDF_N_TWR` or
//! `EGTT_CTR`. The suffix names the facility; the identifier names the
//! airport or FIR being staffed.

use std::fmt;

use crate::model::{Airport, Controller, FlightInformationRegion};
use crate::repository::{AirportRepository, FirRepository};
use crate::store::Handle;

/// Kind of position a controller is staffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FacilityType {
    Observer,
    Delivery,
    Ground,
    Tower,
    Approach,
    Departure,
    Center,
    FlightService,
    Atis,
    #[default]
    Unknown,
}

impl FacilityType {
    /// Facility named by a callsign suffix.
    #[must_use]
    pub fn from_suffix(suffix: &str) -> Option<Self> {
        match suffix.trim().to_ascii_uppercase().as_str() {
            "OBS" => Some(Self::Observer),
            "DEL" => Some(Self::Delivery),
            "GND" => Some(Self::Ground),
            "TWR" => Some(Self::Tower),
            "APP" => Some(Self::Approach),
            "DEP" => Some(Self::Departure),
            "CTR" => Some(Self::Center),
            "FSS" => Some(Self::FlightService),
            "ATIS" => Some(Self::Atis),
            _ => None,
        }
    }

    /// Facility named by the network's numeric facility code.
    #[must_use]
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Observer,
            1 => Self::FlightService,
            2 => Self::Delivery,
            3 => Self::Ground,
            4 => Self::Tower,
            5 => Self::Approach,
            6 => Self::Center,
            _ => Self::Unknown,
        }
    }

    /// Facilities that staff a single airport.
    #[must_use]
    pub fn is_airport(self) -> bool {
        matches!(
            self,
            Self::Delivery | Self::Ground | Self::Tower | Self::Approach | Self::Departure | Self::Atis
        )
    }

    /// Facilities that staff a whole FIR.
    #[must_use]
    pub fn is_fir(self) -> bool {
        matches!(self, Self::Center | Self::FlightService)
    }
}

impl fmt::Display for FacilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Observer => "OBS",
            Self::Delivery => "DEL",
            Self::Ground => "GND",
            Self::Tower => "TWR",
            Self::Approach => "APP",
            Self::Departure => "DEP",
            Self::Center => "CTR",
            Self::FlightService => "FSS",
            Self::Atis => "ATIS",
            Self::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

/// What a controller callsign resolved to.
#[derive(Debug, Clone, PartialEq)]
pub struct CallsignParseResult {
    pub identifier: String,
    pub facility: FacilityType,
    pub airport: Option<Handle<Airport>>,
    /// FIR worked by the controller. Mirrored into the state's
    /// FIR-controller relation.
    pub fir: Option<Handle<FlightInformationRegion>>,
}

impl CallsignParseResult {
    /// Result for a controller that has not been parsed, or is gone.
    pub const EMPTY: Self = Self {
        identifier: String::new(),
        facility: FacilityType::Unknown,
        airport: None,
        fir: None,
    };
}

impl Default for CallsignParseResult {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Resolves a controller's callsign to the station it staffs.
pub trait CallsignParser {
    fn parse(&self, callsign: &str, controller: &Controller) -> CallsignParseResult;
}

/// Default parser resolving the callsign prefix against the airport and FIR
/// repositories.
#[derive(Debug, Clone, Copy)]
pub struct PrefixCallsignParser<'a> {
    airports: &'a AirportRepository,
    firs: &'a FirRepository,
}

impl<'a> PrefixCallsignParser<'a> {
    #[must_use]
    pub fn new(airports: &'a AirportRepository, firs: &'a FirRepository) -> Self {
        Self { airports, firs }
    }

    /// ICAO first, then IATA, then the US convention of dropping the
    /// leading `K`.
    fn resolve_airport(&self, identifier: &str) -> Option<Handle<Airport>> {
        self.airports
            .handles_by_icao(identifier)
            .into_iter()
            .next()
            .or_else(|| self.airports.handles_by_iata(identifier).into_iter().next())
            .or_else(|| self.airports.handles_by_icao(&format!("K{identifier}")).into_iter().next())
    }

    fn resolve_fir(&self, identifier: &str) -> Option<Handle<FlightInformationRegion>> {
        self.firs
            .handles_by_icao(identifier)
            .first()
            .copied()
            .or_else(|| self.firs.handles_by_prefix(identifier).first().copied())
    }
}

impl CallsignParser for PrefixCallsignParser<'_> {
    fn parse(&self, callsign: &str, controller: &Controller) -> CallsignParseResult {
        let callsign = callsign.trim().to_ascii_uppercase();
        let segments: Vec<&str> = callsign.split('_').filter(|s| !s.is_empty()).collect();

        let Some(&identifier) = segments.first() else {
            return CallsignParseResult::EMPTY;
        };

        let facility = segments
            .last()
            .filter(|_| segments.len() > 1)
            .and_then(|suffix| FacilityType::from_suffix(suffix))
            .unwrap_or_else(|| FacilityType::from_code(controller.facility));

        let airport = if facility.is_airport() {
            self.resolve_airport(identifier)
        } else {
            None
        };

        let fir = if facility.is_fir() {
            self.resolve_fir(identifier)
        } else {
            None
        };

        CallsignParseResult {
            identifier: identifier.to_string(),
            facility,
            airport,
            fir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quality::QualityLog;
    use crate::raw::{RawAirport, RawFlightInformationRegion};

    fn airport(icao: &str, iata: &str) -> RawAirport {
        RawAirport {
            icao: icao.to_string(),
            name: icao.to_string(),
            latitude: Some(10.0),
            longitude: Some(10.0),
            iata_lid: Some(iata.to_string()),
            fir: None,
            pseudo: false,
        }
    }

    fn fir(icao: &str, prefix: &str) -> RawFlightInformationRegion {
        RawFlightInformationRegion {
            icao: icao.to_string(),
            name: String::new(),
            prefix_position: prefix.to_string(),
            boundary_id: String::new(),
        }
    }

    fn repositories() -> (AirportRepository, FirRepository) {
        let mut quality = QualityLog::new();
        let mut airports = AirportRepository::new();
        let records = AirportRepository::aggregate(
            &[airport("EDDF", "FRA"), airport("KJFK", "JFK"), airport("EGLL", "LHR")],
            &mut quality,
        )
        .unwrap();
        airports.reconcile(records, &mut quality);

        let mut firs = FirRepository::new();
        firs.reconcile(vec![fir("EGTT", "LON"), fir("EDGG", "")], &mut quality, |_, _| {});

        (airports, firs)
    }

    #[test]
    fn test_tower_resolves_airport_by_icao() {
        let (airports, firs) = repositories();
        let parser = PrefixCallsignParser::new(&airports, &firs);

        let result = parser.parse("EDDF_N_TWR", &Controller::default());

        assert_eq!(result.facility, FacilityType::Tower);
        assert_eq!(result.identifier, "EDDF");
        assert_eq!(result.airport, airports.handles_by_icao("EDDF").first().copied());
        assert!(result.fir.is_none());
    }

    #[test]
    fn test_airport_fallbacks() {
        let (airports, firs) = repositories();
        let parser = PrefixCallsignParser::new(&airports, &firs);

        let by_iata = parser.parse("LHR_GND", &Controller::default());
        assert_eq!(by_iata.airport, airports.handles_by_icao("EGLL").first().copied());

        let by_k_prefix = parser.parse("JFK_APP", &Controller::default());
        assert_eq!(by_k_prefix.airport, airports.handles_by_icao("KJFK").first().copied());
    }

    #[test]
    fn test_center_resolves_fir_by_prefix() {
        let (airports, firs) = repositories();
        let parser = PrefixCallsignParser::new(&airports, &firs);

        let by_prefix = parser.parse("LON_S_CTR", &Controller::default());
        assert_eq!(by_prefix.facility, FacilityType::Center);
        assert_eq!(by_prefix.fir, firs.handles_by_prefix("LON").first().copied());

        let by_icao = parser.parse("EDGG_CTR", &Controller::default());
        assert_eq!(by_icao.fir, firs.handles_by_icao("EDGG").first().copied());
        assert!(by_icao.airport.is_none());
    }

    #[test]
    fn test_unknown_suffix_falls_back_to_facility_code() {
        let (airports, firs) = repositories();
        let parser = PrefixCallsignParser::new(&airports, &firs);
        let controller = Controller {
            facility: 4,
            ..Default::default()
        };

        let result = parser.parse("EDDF_XYZ", &controller);
        assert_eq!(result.facility, FacilityType::Tower);
        assert!(result.airport.is_some());
    }

    #[test]
    fn test_blank_callsign_is_empty() {
        let (airports, firs) = repositories();
        let parser = PrefixCallsignParser::new(&airports, &firs);

        assert_eq!(parser.parse("  ", &Controller::default()), CallsignParseResult::EMPTY);
    }
}
