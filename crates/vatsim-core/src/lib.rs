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

//! Live VATSIM network reconciliation and indexing.
//!
//! Every refresh cycle a [`SnapshotSource`] delivers the raw network records.
//! The core maps them onto a long-lived entity graph:
//!
//! - **Reconciliation**: raw records are matched to existing entities by
//!   correlation key. Known keys update their entity in place, so a
//!   [`Handle`] stays valid for as long as the entity exists.
//! - **Indexing**: key indexes resolve airport codes, callsigns and FIR
//!   prefixes; a k-d tree answers nearest-pilot queries with great-circle
//!   distances, across the antimeridian.
//! - **Wiring**: flight plans link to airports, pilots to the FIR boundaries
//!   containing them and to their airline, controllers to the FIR they work.
//!   Links are bidirectional and cleared as soon as either end goes away.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use vatsim_core::{Position, Refresher, RefresherConfig, ScriptedSource};
//!
//! #[tokio::main]
//! async fn main() {
//!     let source = ScriptedSource::new(Vec::new());
//!     let refresher = Refresher::spawn(source, RefresherConfig::default());
//!
//!     loop {
//!         tokio::time::sleep(Duration::from_secs(15)).await;
//!         refresher.read(|state| {
//!             for (pilot, distance) in state.clients().list_search_by_position(Position::new(50.03, 8.57), 50.0, 5) {
//!                 println!("{} at {distance:.1} nm", pilot.callsign);
//!             }
//!         });
//!     }
//! }
//! ```
//!
//! # Applying Snapshots Directly
//!
//! ```
//! use vatsim_core::{NetworkSnapshot, NetworkState};
//! use vatsim_core::raw::RawAirline;
//!
//! let mut state = NetworkState::new();
//! let snapshot = NetworkSnapshot {
//!     airlines: vec![RawAirline {
//!         icao: "DLH".to_string(),
//!         name: "Lufthansa".to_string(),
//!         callsign: "LUFTHANSA".to_string(),
//!         country: "Germany".to_string(),
//!     }],
//!     ..Default::default()
//! };
//!
//! let report = state.apply(snapshot.clone()).unwrap();
//! assert_eq!(report.airlines.added.len(), 1);
//!
//! // Same snapshot again: nothing changes
//! let report = state.apply(snapshot).unwrap();
//! assert!(report.is_quiet());
//! ```

pub mod callsign;
pub mod error;
pub mod lookup;
pub mod model;
pub mod position;
pub mod quality;
pub mod raw;
pub mod reconcile;
pub mod refresher;
pub mod relation;
pub mod repository;
pub mod source;
pub mod spatial;
pub mod state;
pub mod store;
pub mod wiring;

pub use callsign::{CallsignParseResult, CallsignParser, FacilityType, PrefixCallsignParser};
pub use error::{CoreError, FetchError};
pub use model::{Airline, Airport, Client, ClientDetails, ClientKind, Controller, FirBoundary, FlightInformationRegion, Pilot};
pub use position::Position;
pub use quality::DataQualityWarning;
pub use raw::NetworkSnapshot;
pub use refresher::{NetworkEvent, Refresher, RefresherConfig};
pub use source::{ScriptedSource, SnapshotSource};
pub use state::{ChangeSet, CycleReport, NetworkState};
pub use store::Handle;
pub use wiring::{AirlineLookup, AirportLookup, BoundaryContainment};
