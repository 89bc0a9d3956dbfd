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

use crate::lookup::normalize_key;
use crate::raw::RawFlightInformationRegion;
use crate::reconcile::{assign_from, Reconcile};

/// FIRs share ICAO codes across sub-sectors, so the prefix position is part
/// of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FirKey {
    pub icao: String,
    pub prefix_position: String,
}

/// A flight information region.
///
/// Its boundary and working controllers are kept in the state's relation
/// tables, not on the entity.
#[derive(Debug, Clone, PartialEq)]
pub struct FlightInformationRegion {
    pub icao: String,
    pub prefix_position: String,
    pub name: String,
    pub boundary_id: String,
}

impl FlightInformationRegion {
    /// Id used to look up the boundary: the explicit boundary id, else the
    /// ICAO code.
    #[must_use]
    pub fn boundary_lookup_id(&self) -> &str {
        if self.boundary_id.trim().is_empty() {
            &self.icao
        } else {
            &self.boundary_id
        }
    }
}

impl Reconcile<RawFlightInformationRegion> for FlightInformationRegion {
    type Key = FirKey;
    const FAMILY: &'static str = "fir";

    fn key(raw: &RawFlightInformationRegion) -> FirKey {
        FirKey {
            icao: normalize_key(&raw.icao),
            prefix_position: normalize_key(&raw.prefix_position),
        }
    }

    fn create(raw: &RawFlightInformationRegion) -> Self {
        Self {
            icao: normalize_key(&raw.icao),
            prefix_position: normalize_key(&raw.prefix_position),
            name: String::new(),
            boundary_id: String::new(),
        }
    }

    fn populate(&mut self, raw: &RawFlightInformationRegion) -> bool {
        let changed = assign_from(&mut self.name, &raw.name);
        let boundary_id = raw.boundary_id.trim();
        if self.boundary_id == boundary_id {
            changed
        } else {
            self.boundary_id = boundary_id.to_string();
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_lookup_falls_back_to_icao() {
        let raw = RawFlightInformationRegion {
            icao: "EGTT".to_string(),
            name: "London".to_string(),
            prefix_position: "LON".to_string(),
            boundary_id: String::new(),
        };
        let mut fir = FlightInformationRegion::create(&raw);
        fir.populate(&raw);
        assert_eq!(fir.boundary_lookup_id(), "EGTT");

        fir.boundary_id = "EGTT-N".to_string();
        assert_eq!(fir.boundary_lookup_id(), "EGTT-N");
    }
}
