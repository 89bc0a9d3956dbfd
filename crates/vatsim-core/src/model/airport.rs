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

use crate::position::Position;
use crate::reconcile::{assign, assign_from, Reconcile};

/// An airport with every alias merged in.
#[derive(Debug, Clone, PartialEq)]
pub struct Airport {
    pub icao: String,
    /// IATA/LID codes, distinct, in the order first seen.
    pub iatas: Vec<String>,
    /// Display names, distinct, in the order first seen.
    pub names: Vec<String>,
    pub position: Position,
    /// Code of the FIR the airport belongs to.
    pub fir: Option<String>,
}

impl Airport {
    /// Primary display name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.names.first().map(String::as_str)
    }
}

/// One airport after all raw rows sharing its ICAO code were merged.
#[derive(Debug, Clone, PartialEq)]
pub struct AirportRecord {
    pub icao: String,
    pub iatas: Vec<String>,
    pub names: Vec<String>,
    pub position: Position,
    pub fir: Option<String>,
}

impl Reconcile<AirportRecord> for Airport {
    type Key = String;
    const FAMILY: &'static str = "airport";

    fn key(record: &AirportRecord) -> String {
        record.icao.clone()
    }

    fn create(record: &AirportRecord) -> Self {
        Self {
            icao: record.icao.clone(),
            iatas: Vec::new(),
            names: Vec::new(),
            position: Position::default(),
            fir: None,
        }
    }

    fn populate(&mut self, record: &AirportRecord) -> bool {
        let mut changed = assign_from(&mut self.iatas, &record.iatas);
        changed |= assign_from(&mut self.names, &record.names);
        changed |= assign(&mut self.position, record.position);
        changed |= assign_from(&mut self.fir, &record.fir);
        changed
    }
}
