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

//! Live domain entities.
//!
//! Entities are created once per correlation key and then mutated in place
//! every cycle. Fields holding handles to other entities are derived links,
//! written only by the wiring pass and never by `populate`.

mod airline;
mod airport;
mod boundary;
mod client;
mod fir;

pub use airline::Airline;
pub use airport::{Airport, AirportRecord};
pub use boundary::FirBoundary;
pub use client::{AirportRef, Client, ClientDetails, ClientKey, ClientKind, Controller, FlightPlan, Pilot};
pub use fir::{FirKey, FlightInformationRegion};
