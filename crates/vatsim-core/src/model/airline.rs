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
use crate::raw::RawAirline;
use crate::reconcile::{assign_from, Reconcile};

/// An airline, keyed by its 3-letter ICAO designator.
#[derive(Debug, Clone, PartialEq)]
pub struct Airline {
    pub icao: String,
    pub name: String,
    /// Radio telephony callsign, e.g. "LUFTHANSA".
    pub callsign: String,
    pub country: String,
}

impl Reconcile<RawAirline> for Airline {
    type Key = String;
    const FAMILY: &'static str = "airline";

    fn key(raw: &RawAirline) -> String {
        normalize_key(&raw.icao)
    }

    fn create(raw: &RawAirline) -> Self {
        Self {
            icao: normalize_key(&raw.icao),
            name: String::new(),
            callsign: String::new(),
            country: String::new(),
        }
    }

    fn populate(&mut self, raw: &RawAirline) -> bool {
        let mut changed = assign_from(&mut self.name, &raw.name);
        changed |= assign_from(&mut self.callsign, &raw.callsign);
        changed |= assign_from(&mut self.country, &raw.country);
        changed
    }
}
