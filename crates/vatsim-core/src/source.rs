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

//! Snapshot sources.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::FetchError;
use crate::raw::NetworkSnapshot;

/// Produces one complete snapshot per cycle.
///
/// Retries, caching and timeouts belong to the implementation. A returned
/// error aborts the cycle and leaves the published state as it was.
#[async_trait]
pub trait SnapshotSource: Send + Sync + 'static {
    async fn fetch(&self) -> Result<NetworkSnapshot, FetchError>;
}

#[async_trait]
impl<S: SnapshotSource + ?Sized> SnapshotSource for Arc<S> {
    async fn fetch(&self) -> Result<NetworkSnapshot, FetchError> {
        (**self).fetch().await
    }
}

/// Serves a scripted sequence of results, then repeats the last one.
///
/// Useful for replaying captured snapshots and in tests.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    script: Mutex<Vec<Result<NetworkSnapshot, String>>>,
}

impl ScriptedSource {
    /// Results are served front to back. `Err` entries become
    /// [`FetchError::Unavailable`].
    #[must_use]
    pub fn new(script: Vec<Result<NetworkSnapshot, String>>) -> Self {
        Self {
            script: Mutex::new(script),
        }
    }
}

#[async_trait]
impl SnapshotSource for ScriptedSource {
    async fn fetch(&self) -> Result<NetworkSnapshot, FetchError> {
        let next = {
            let mut script = self
                .script
                .lock()
                .map_err(|e| FetchError::Unavailable(format!("script lock poisoned: {e}")))?;
            if script.len() > 1 {
                script.remove(0)
            } else {
                script
                    .first()
                    .cloned()
                    .ok_or_else(|| FetchError::Unavailable("script exhausted".to_string()))?
            }
        };

        next.map_err(FetchError::Unavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_source_repeats_last() {
        let source = ScriptedSource::new(vec![Err("offline".to_string()), Ok(NetworkSnapshot::default())]);

        assert!(matches!(source.fetch().await, Err(FetchError::Unavailable(_))));
        assert!(source.fetch().await.is_ok());
        assert!(source.fetch().await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_script_fails() {
        let source = ScriptedSource::default();
        assert!(source.fetch().await.is_err());
    }
}
