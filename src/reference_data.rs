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

//! Static reference data: airports, airlines, FIRs and their boundaries.
//!
//! Loaded once at startup from a data directory and attached to every
//! snapshot, so the reference families reconcile to "unchanged" after the
//! first cycle.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use log::{info, warn};
use serde::Deserialize;
use vatsim_core::raw::{RawAirline, RawAirport, RawBoundary, RawFlightInformationRegion};

/// Row of airports.csv. `pseudo` is 0 or 1 like the upstream dataset.
#[derive(Debug, Deserialize)]
struct AirportRow {
    icao: String,
    name: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    iata_lid: Option<String>,
    fir: Option<String>,
    #[serde(default)]
    pseudo: u8,
}

impl From<AirportRow> for RawAirport {
    fn from(row: AirportRow) -> Self {
        Self {
            icao: row.icao,
            name: row.name,
            latitude: row.latitude,
            longitude: row.longitude,
            iata_lid: row.iata_lid.filter(|code| !code.trim().is_empty()),
            fir: row.fir.filter(|code| !code.trim().is_empty()),
            pseudo: row.pseudo != 0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FirRow {
    icao: String,
    name: String,
    #[serde(default)]
    prefix_position: Option<String>,
    #[serde(default)]
    boundary_id: Option<String>,
}

impl From<FirRow> for RawFlightInformationRegion {
    fn from(row: FirRow) -> Self {
        Self {
            icao: row.icao,
            name: row.name,
            prefix_position: row.prefix_position.unwrap_or_default(),
            boundary_id: row.boundary_id.unwrap_or_default(),
        }
    }
}

/// Container for all reference data
#[derive(Debug, Default, Clone)]
pub struct ReferenceData {
    pub airlines: Vec<RawAirline>,
    pub boundaries: Vec<RawBoundary>,
    pub firs: Vec<RawFlightInformationRegion>,
    pub airports: Vec<RawAirport>,
}

impl ReferenceData {
    /// Load all reference data from a directory. Missing files are logged
    /// and leave their family empty; malformed files are an error.
    pub fn load_from_directory<P: AsRef<Path>>(directory: P) -> Result<Self, Box<dyn std::error::Error>> {
        let dir = directory.as_ref();
        let mut data = Self::default();

        if let Some(reader) = open_optional(&dir.join("airports.csv"))? {
            data.airports = read_airports(reader)?;
            info!("Loaded {} airport rows", data.airports.len());
        }

        if let Some(reader) = open_optional(&dir.join("airlines.csv"))? {
            data.airlines = read_airlines(reader)?;
            info!("Loaded {} airlines", data.airlines.len());
        }

        if let Some(reader) = open_optional(&dir.join("firs.csv"))? {
            data.firs = read_firs(reader)?;
            info!("Loaded {} FIRs", data.firs.len());
        }

        if let Some(reader) = open_optional(&dir.join("boundaries.json"))? {
            data.boundaries = read_boundaries(reader)?;
            info!("Loaded {} FIR boundaries", data.boundaries.len());
        }

        Ok(data)
    }
}

fn open_optional(path: &Path) -> Result<Option<BufReader<File>>, std::io::Error> {
    if !path.exists() {
        warn!("{} not found, continuing without it", path.display());
        return Ok(None);
    }
    Ok(Some(BufReader::new(File::open(path)?)))
}

/// Airport rows. Rows without coordinates are skipped with a warning.
pub fn read_airports<R: Read>(reader: R) -> Result<Vec<RawAirport>, csv::Error> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut airports = Vec::new();

    for (row, result) in csv_reader.deserialize::<AirportRow>().enumerate() {
        let airport = RawAirport::from(result?);
        if !airport.pseudo && (airport.latitude.is_none() || airport.longitude.is_none()) {
            warn!("airports.csv row {}: {} has no coordinates, skipping", row + 1, airport.icao);
            continue;
        }
        airports.push(airport);
    }

    Ok(airports)
}

pub fn read_airlines<R: Read>(reader: R) -> Result<Vec<RawAirline>, csv::Error> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    csv_reader.deserialize().collect()
}

pub fn read_firs<R: Read>(reader: R) -> Result<Vec<RawFlightInformationRegion>, csv::Error> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    csv_reader
        .deserialize::<FirRow>()
        .map(|row| row.map(RawFlightInformationRegion::from))
        .collect()
}

pub fn read_boundaries<R: Read>(reader: R) -> Result<Vec<RawBoundary>, serde_json::Error> {
    serde_json::from_reader(reader)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_airports() {
        let csv = "\
icao,name,latitude,longitude,iata_lid,fir,pseudo
EDDF,Frankfurt/Main,50.033,8.570,FRA,EDGG,0
EDDF,Frankfurt Main,50.033,8.570,,EDGG,0
ZZZZ,Pseudo,,,,,1
";
        let airports = read_airports(csv.as_bytes()).unwrap();

        assert_eq!(airports.len(), 3);
        assert_eq!(airports[0].iata_lid.as_deref(), Some("FRA"));
        assert_eq!(airports[1].iata_lid, None);
        assert_eq!(airports[0].fir.as_deref(), Some("EDGG"));
        assert!(!airports[0].pseudo);
        assert!(airports[2].pseudo);
        assert_eq!(airports[2].latitude, None);
    }

    #[test]
    fn test_airport_without_coordinates_is_skipped() {
        let csv = "\
icao,name,latitude,longitude,iata_lid,fir,pseudo
EDDF,Frankfurt/Main,50.033,8.570,FRA,EDGG,0
EDDM,Munich,48.354,,MUC,EDMM,0
";
        let airports = read_airports(csv.as_bytes()).unwrap();

        assert_eq!(airports.len(), 1);
        assert_eq!(airports[0].icao, "EDDF");
    }

    #[test]
    fn test_read_airlines() {
        let csv = "\
icao,name,callsign,country
DLH,Lufthansa,LUFTHANSA,Germany
BAW,British Airways,SPEEDBIRD,United Kingdom
";
        let airlines = read_airlines(csv.as_bytes()).unwrap();

        assert_eq!(airlines.len(), 2);
        assert_eq!(airlines[1].callsign, "SPEEDBIRD");
    }

    #[test]
    fn test_read_firs_with_optional_columns() {
        let csv = "\
icao,name,prefix_position,boundary_id
EDGG,Langen,,
EGTT,London,LON,EGTT
";
        let firs = read_firs(csv.as_bytes()).unwrap();

        assert_eq!(firs[0].prefix_position, "");
        assert_eq!(firs[0].boundary_id, "");
        assert_eq!(firs[1].prefix_position, "LON");
    }

    #[test]
    fn test_read_boundaries() {
        let json = r#"[{
            "id": "EDGG",
            "polygons": [[[[5.0, 49.0], [10.0, 49.0], [10.0, 52.0], [5.0, 52.0], [5.0, 49.0]]]]
        }]"#;
        let boundaries = read_boundaries(json.as_bytes()).unwrap();

        assert_eq!(boundaries.len(), 1);
        assert!(!boundaries[0].oceanic);
        assert_eq!(boundaries[0].polygons[0][0].len(), 5);
    }

    #[test]
    fn test_malformed_airports_fail() {
        let csv = "icao,name,latitude,longitude,iata_lid,fir,pseudo\nEDDF,Frankfurt,north,8.5,,,0\n";
        assert!(read_airports(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_missing_directory_yields_empty_data() {
        let data = ReferenceData::load_from_directory("/nonexistent/vatsim-map-test").unwrap();
        assert!(data.airports.is_empty());
        assert!(data.boundaries.is_empty());
    }
}
