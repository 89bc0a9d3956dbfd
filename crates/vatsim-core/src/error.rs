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

//! Error types for snapshot fetching and cycle application.

use thiserror::Error;

/// The upstream snapshot could not be produced.
///
/// A fetch failure aborts the cycle before any mutation; the previously
/// published state stays valid.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("snapshot source unavailable: {0}")]
    Unavailable(String),

    #[error("failed to decode snapshot: {0}")]
    Decode(String),

    #[error("failed to load reference data: {0}")]
    ReferenceData(String),
}

/// Errors that abort a reconciliation cycle.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Upstream data broke an assumption the core relies on (for example a
    /// value guaranteed to be present is missing). Raised before mutation.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl CoreError {
    /// Creates an invariant violation.
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::Invariant(msg.into())
    }

    /// Whether the next cycle can reasonably be expected to succeed.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }
}
