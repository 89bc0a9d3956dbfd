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

//! Typed repositories, one per entity family.
//!
//! Each repository owns the entity store of its family plus the key indexes
//! built from it, and exposes read-only, insertion-ordered access. Mutation
//! happens only through [`crate::NetworkState::apply`].

mod airline;
mod airport;
mod boundary;
mod client;
mod fir;

pub use airline::AirlineRepository;
pub use airport::AirportRepository;
pub use boundary::BoundaryRepository;
pub use client::ClientRepository;
pub use fir::FirRepository;
