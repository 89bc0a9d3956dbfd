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

//! Periodic refresh of the shared network state.
//!
//! One background task owns the write side. Each tick it fetches a snapshot
//! without holding any lock, then applies it under a single write guard, so
//! readers see either the previous cycle or the new one and nothing in
//! between.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use log::{error, info, warn};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::error::CoreError;
use crate::source::SnapshotSource;
use crate::state::{CycleReport, NetworkState};

/// Events published to observers after each cycle.
#[derive(Debug, Clone)]
pub enum NetworkEvent {
    /// A snapshot was applied.
    CycleCompleted(Arc<CycleReport>),
    /// The snapshot could not be fetched. The previous state is still
    /// published.
    FetchFailed(String),
    /// The snapshot broke an invariant and was rejected before mutation.
    CycleAborted(String),
}

#[derive(Debug, Clone)]
pub struct RefresherConfig {
    /// Time between cycles.
    pub interval: Duration,
    pub event_channel_capacity: usize,
}

impl Default for RefresherConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(15),
            event_channel_capacity: 64,
        }
    }
}

/// Handle to the refresh task and the state it maintains.
pub struct Refresher {
    state: Arc<RwLock<NetworkState>>,
    event_tx: broadcast::Sender<NetworkEvent>,
    cancel_token: CancellationToken,
}

impl std::fmt::Debug for Refresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Refresher")
            .field("cancel_token", &self.cancel_token)
            .finish_non_exhaustive()
    }
}

impl Refresher {
    /// Start refreshing from `source`. The first cycle runs immediately.
    #[must_use]
    pub fn spawn<S: SnapshotSource>(source: S, config: RefresherConfig) -> Self {
        let state = Arc::new(RwLock::new(NetworkState::new()));
        let (event_tx, _) = broadcast::channel(config.event_channel_capacity.max(1));
        let cancel_token = CancellationToken::new();

        let task_state = Arc::clone(&state);
        let task_tx = event_tx.clone();
        let task_cancel = cancel_token.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(config.interval);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    () = task_cancel.cancelled() => {
                        info!("Refresher cancelled");
                        return;
                    }
                }

                let event = run_cycle(&source, &task_state).await;
                // No subscribers is fine
                let _ = task_tx.send(event);
            }
        });

        Self {
            state,
            event_tx,
            cancel_token,
        }
    }

    /// Subscribe to cycle events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<NetworkEvent> {
        self.event_tx.subscribe()
    }

    /// Shared state, for callers that manage locking themselves.
    #[must_use]
    pub fn state(&self) -> Arc<RwLock<NetworkState>> {
        Arc::clone(&self.state)
    }

    /// Run `f` against the last published state.
    pub fn read<R>(&self, f: impl FnOnce(&NetworkState) -> R) -> Option<R> {
        self.state.read().ok().map(|state| f(&state))
    }

    /// Stop the refresh task. The state stays readable.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }
}

impl Drop for Refresher {
    fn drop(&mut self) {
        self.cancel_token.cancel();
    }
}

/// Fetch and apply one snapshot.
pub async fn run_cycle<S: SnapshotSource + ?Sized>(source: &S, state: &RwLock<NetworkState>) -> NetworkEvent {
    let snapshot = match source.fetch().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Snapshot fetch failed, keeping previous state: {e}");
            return NetworkEvent::FetchFailed(e.to_string());
        }
    };

    let result = match state.write() {
        Ok(mut state) => state.apply(snapshot),
        Err(e) => Err(CoreError::invariant(format!("network state lock poisoned: {e}"))),
    };

    match result {
        Ok(report) => NetworkEvent::CycleCompleted(Arc::new(report)),
        Err(e) => {
            error!("Cycle aborted: {e}");
            NetworkEvent::CycleAborted(e.to_string())
        }
    }
}
