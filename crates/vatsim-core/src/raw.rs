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

//! Raw records as delivered by a snapshot source.
//!
//! These mirror the upstream feeds field for field and carry no links. The
//! repositories turn them into entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One airport row from the reference data. Several rows may share an ICAO
/// code, one per IATA/LID alias.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawAirport {
    pub icao: String,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub iata_lid: Option<String>,
    pub fir: Option<String>,
    #[serde(default)]
    pub pseudo: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawAirline {
    pub icao: String,
    pub name: String,
    pub callsign: String,
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawFlightInformationRegion {
    pub icao: String,
    pub name: String,
    /// Callsign prefix a controller uses to staff this FIR, if different
    /// from the ICAO code.
    pub prefix_position: String,
    /// Boundary id, empty when the boundary shares the FIR's ICAO code.
    pub boundary_id: String,
}

/// Boundary geometry: polygons of rings of `[longitude, latitude]` pairs.
/// The first ring of each polygon is the exterior, the rest are holes.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawBoundary {
    pub id: String,
    #[serde(default)]
    pub oceanic: bool,
    #[serde(default)]
    pub extension: bool,
    pub polygons: Vec<Vec<Vec<[f64; 2]>>>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawFlightPlan {
    pub flight_rules: String,
    pub aircraft: String,
    pub departure: String,
    pub arrival: String,
    pub alternate: String,
    pub cruise_tas: String,
    pub altitude: String,
    pub route: String,
    pub remarks: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawPilot {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: i32,
    pub ground_speed: i32,
    pub heading: i32,
    pub transponder: String,
    pub qnh_mb: i32,
    pub flight_plan: Option<RawFlightPlan>,
}

/// Shared by controllers and ATIS stations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawController {
    pub frequency: String,
    /// Network facility code: 0 OBS, 1 FSS, 2 DEL, 3 GND, 4 TWR, 5 APP,
    /// 6 CTR.
    pub facility: i32,
    pub visual_range: i32,
    pub text_atis: Vec<String>,
    pub atis_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawClientDetails {
    Pilot(RawPilot),
    Controller(RawController),
    Atis(RawController),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawClient {
    pub cid: u64,
    pub callsign: String,
    pub name: String,
    pub server: String,
    pub rating: i32,
    pub logon_time: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub details: RawClientDetails,
}

/// Everything one cycle reconciles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub airlines: Vec<RawAirline>,
    pub boundaries: Vec<RawBoundary>,
    pub firs: Vec<RawFlightInformationRegion>,
    pub airports: Vec<RawAirport>,
    pub clients: Vec<RawClient>,
    pub fetched_at: DateTime<Utc>,
}

impl Default for NetworkSnapshot {
    fn default() -> Self {
        Self {
            airlines: Vec::new(),
            boundaries: Vec::new(),
            firs: Vec::new(),
            airports: Vec::new(),
            clients: Vec::new(),
            fetched_at: Utc::now(),
        }
    }
}
