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

//! Data-quality warnings.
//!
//! Upstream feeds are noisy. Duplicate keys, ambiguous lookups and conflicting
//! duplicate values are never raised as errors: each one is resolved by a
//! deterministic fallback, logged, and recorded so the cycle report can carry
//! it to observers.

use std::fmt;

use log::{info, warn};

/// A recoverable data-quality event observed during a cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum DataQualityWarning {
    /// Two raw records of one family derived the same correlation key.
    /// The last record wins.
    DuplicateKey { family: &'static str, key: String },

    /// Records merged under one key disagree on a field that should be
    /// single-valued. The first value wins.
    ConflictingValues {
        family: &'static str,
        key: String,
        field: &'static str,
    },

    /// A flight plan references an airport code with no match.
    UnknownAirport { code: String },

    /// An airport code matched more than one airport. The first match by
    /// insertion order wins.
    AmbiguousAirport { code: String, matches: usize },

    /// A FIR references a boundary that does not exist.
    UnknownBoundary { fir: String, boundary: String },

    /// A position lies outside the canonical coordinate range and was left
    /// out of the spatial index.
    OutOfBounds {
        callsign: String,
        latitude: f64,
        longitude: f64,
    },
}

impl DataQualityWarning {
    /// Low-severity notes are logged at info level instead of warn.
    #[must_use]
    pub fn is_note(&self) -> bool {
        matches!(self, Self::UnknownAirport { .. })
    }
}

impl fmt::Display for DataQualityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateKey { family, key } => {
                write!(f, "duplicate {family} key \"{key}\", keeping the last record")
            }
            Self::ConflictingValues { family, key, field } => write!(
                f,
                "{family} records for \"{key}\" have differing {field} values, keeping the first"
            ),
            Self::UnknownAirport { code } => write!(f, "unknown airport \"{code}\""),
            Self::AmbiguousAirport { code, matches } => {
                write!(f, "{matches} airports match \"{code}\", using the first")
            }
            Self::UnknownBoundary { fir, boundary } => {
                write!(f, "FIR {fir} references unknown boundary \"{boundary}\"")
            }
            Self::OutOfBounds {
                callsign,
                latitude,
                longitude,
            } => write!(
                f,
                "{callsign} at ({latitude:.4}, {longitude:.4}) is outside canonical bounds, not spatially indexed"
            ),
        }
    }
}

/// Collects the warnings of a single cycle, logging each as it arrives.
#[derive(Debug, Default)]
pub struct QualityLog {
    warnings: Vec<DataQualityWarning>,
}

impl QualityLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Log and keep a warning.
    pub fn record(&mut self, warning: DataQualityWarning) {
        if warning.is_note() {
            info!("{warning}");
        } else {
            warn!("{warning}");
        }
        self.warnings.push(warning);
    }

    #[must_use]
    pub fn warnings(&self) -> &[DataQualityWarning] {
        &self.warnings
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.warnings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }

    #[must_use]
    pub fn into_warnings(self) -> Vec<DataQualityWarning> {
        self.warnings
    }
}
