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

//! HTTP snapshot source for the VATSIM v3 data feed.
//!
//! Live clients come from the feed on every fetch. Reference data is read
//! from disk on the first fetch and attached to every snapshot after that.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use serde::Deserialize;
use tokio::sync::OnceCell;
use vatsim_core::raw::{
    NetworkSnapshot, RawClient, RawClientDetails, RawController, RawFlightPlan, RawPilot,
};
use vatsim_core::{FetchError, SnapshotSource};

use crate::reference_data::ReferenceData;

#[derive(Debug, Deserialize)]
struct FeedResponse {
    #[serde(default)]
    pilots: Vec<FeedPilot>,
    #[serde(default)]
    controllers: Vec<FeedController>,
    #[serde(default)]
    atis: Vec<FeedController>,
}

#[derive(Debug, Deserialize)]
struct FeedPilot {
    cid: u64,
    callsign: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    server: String,
    #[serde(default)]
    pilot_rating: i32,
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    altitude: i32,
    #[serde(default)]
    groundspeed: i32,
    #[serde(default)]
    heading: i32,
    #[serde(default)]
    transponder: String,
    #[serde(default)]
    qnh_mb: i32,
    flight_plan: Option<FeedFlightPlan>,
    logon_time: DateTime<Utc>,
    last_updated: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FeedFlightPlan {
    flight_rules: String,
    aircraft_short: String,
    departure: String,
    arrival: String,
    alternate: String,
    cruise_tas: String,
    altitude: String,
    route: String,
    remarks: String,
}

/// Controllers and ATIS stations share one shape in the feed.
#[derive(Debug, Deserialize)]
struct FeedController {
    cid: u64,
    callsign: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    server: String,
    #[serde(default)]
    rating: i32,
    #[serde(default)]
    frequency: String,
    #[serde(default)]
    facility: i32,
    #[serde(default)]
    visual_range: i32,
    text_atis: Option<Vec<String>>,
    atis_code: Option<String>,
    logon_time: DateTime<Utc>,
    last_updated: DateTime<Utc>,
}

impl From<FeedPilot> for RawClient {
    fn from(pilot: FeedPilot) -> Self {
        let flight_plan = pilot.flight_plan.map(|plan| RawFlightPlan {
            flight_rules: plan.flight_rules,
            aircraft: plan.aircraft_short,
            departure: plan.departure,
            arrival: plan.arrival,
            alternate: plan.alternate,
            cruise_tas: plan.cruise_tas,
            altitude: plan.altitude,
            route: plan.route,
            remarks: plan.remarks,
        });

        Self {
            cid: pilot.cid,
            callsign: pilot.callsign,
            name: pilot.name,
            server: pilot.server,
            rating: pilot.pilot_rating,
            logon_time: pilot.logon_time,
            last_updated: pilot.last_updated,
            details: RawClientDetails::Pilot(RawPilot {
                latitude: pilot.latitude,
                longitude: pilot.longitude,
                altitude: pilot.altitude,
                ground_speed: pilot.groundspeed,
                heading: pilot.heading,
                transponder: pilot.transponder,
                qnh_mb: pilot.qnh_mb,
                flight_plan,
            }),
        }
    }
}

impl FeedController {
    fn into_raw(self, atis: bool) -> RawClient {
        let controller = RawController {
            frequency: self.frequency,
            facility: self.facility,
            visual_range: self.visual_range,
            text_atis: self.text_atis.unwrap_or_default(),
            atis_code: self.atis_code,
        };

        RawClient {
            cid: self.cid,
            callsign: self.callsign,
            name: self.name,
            server: self.server,
            rating: self.rating,
            logon_time: self.logon_time,
            last_updated: self.last_updated,
            details: if atis {
                RawClientDetails::Atis(controller)
            } else {
                RawClientDetails::Controller(controller)
            },
        }
    }
}

/// Decode the client arrays of a v3 feed document.
pub fn parse_feed(body: &[u8]) -> Result<Vec<RawClient>, FetchError> {
    let feed: FeedResponse =
        serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))?;

    let mut clients = Vec::with_capacity(feed.pilots.len() + feed.controllers.len() + feed.atis.len());
    clients.extend(feed.pilots.into_iter().map(RawClient::from));
    clients.extend(feed.controllers.into_iter().map(|c| c.into_raw(false)));
    clients.extend(feed.atis.into_iter().map(|c| c.into_raw(true)));
    Ok(clients)
}

/// Fetches the live feed over HTTP and merges in local reference data.
pub struct HttpSnapshotSource {
    client: reqwest::Client,
    feed_url: String,
    reference_dir: PathBuf,
    reference: OnceCell<Arc<ReferenceData>>,
}

impl std::fmt::Debug for HttpSnapshotSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSnapshotSource")
            .field("feed_url", &self.feed_url)
            .field("reference_dir", &self.reference_dir)
            .finish_non_exhaustive()
    }
}

impl HttpSnapshotSource {
    pub fn new(
        feed_url: impl Into<String>,
        reference_dir: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("vatsim-map/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            feed_url: feed_url.into(),
            reference_dir: reference_dir.into(),
            reference: OnceCell::new(),
        })
    }

    /// Reference data, loaded on first use. A failed load is retried on the
    /// next fetch.
    async fn reference(&self) -> Result<Arc<ReferenceData>, FetchError> {
        self.reference
            .get_or_try_init(|| async {
                let dir = self.reference_dir.clone();
                let loaded = tokio::task::spawn_blocking(move || {
                    ReferenceData::load_from_directory(&dir).map_err(|e| e.to_string())
                })
                .await
                .map_err(|e| FetchError::ReferenceData(e.to_string()))?
                .map_err(FetchError::ReferenceData)?;
                Ok::<_, FetchError>(Arc::new(loaded))
            })
            .await
            .map(Arc::clone)
    }

    async fn fetch_clients(&self) -> Result<Vec<RawClient>, FetchError> {
        let response = self
            .client
            .get(&self.feed_url)
            .send()
            .await
            .map_err(|e| FetchError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Unavailable(format!("HTTP error: {}", response.status())));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::Unavailable(e.to_string()))?;
        debug!("Fetched {} bytes from {}", body.len(), self.feed_url);

        parse_feed(&body)
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    async fn fetch(&self) -> Result<NetworkSnapshot, FetchError> {
        let reference = self.reference().await?;
        let clients = self.fetch_clients().await?;

        Ok(NetworkSnapshot {
            airlines: reference.airlines.clone(),
            boundaries: reference.boundaries.clone(),
            firs: reference.firs.clone(),
            airports: reference.airports.clone(),
            clients,
            fetched_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_FEED: &str = r#"{
        "general": { "version": 3, "update_timestamp": "2025-03-01T12:00:00Z" },
        "pilots": [{
            "cid": 1234567,
            "name": "Jane Doe",
            "callsign": "DLH456",
            "server": "GERMANY",
            "pilot_rating": 1,
            "latitude": 50.03,
            "longitude": 8.57,
            "altitude": 3500,
            "groundspeed": 180,
            "transponder": "1000",
            "heading": 250,
            "qnh_i_hg": 29.92,
            "qnh_mb": 1013,
            "flight_plan": {
                "flight_rules": "I",
                "aircraft": "A320/M-SDE3FGHIJ1RWY/LB1",
                "aircraft_faa": "H/A320/L",
                "aircraft_short": "A320",
                "departure": "EDDF",
                "arrival": "EGLL",
                "alternate": "",
                "cruise_tas": "450",
                "altitude": "36000",
                "deptime": "1200",
                "route": "ANEKI Y163 NATOR",
                "remarks": "/v/",
                "revision_id": 1
            },
            "logon_time": "2025-03-01T10:00:00Z",
            "last_updated": "2025-03-01T11:59:45Z"
        }],
        "controllers": [{
            "cid": 7654321,
            "name": "John Roe",
            "callsign": "EDGG_CTR",
            "frequency": "136.955",
            "facility": 6,
            "rating": 5,
            "server": "GERMANY",
            "visual_range": 300,
            "text_atis": null,
            "last_updated": "2025-03-01T11:59:50Z",
            "logon_time": "2025-03-01T09:00:00Z"
        }],
        "atis": [{
            "cid": 7654322,
            "name": "Max Mustermann",
            "callsign": "EDDF_ATIS",
            "frequency": "118.025",
            "facility": 4,
            "rating": 3,
            "server": "GERMANY",
            "visual_range": 50,
            "atis_code": "K",
            "text_atis": ["FRANKFURT INFORMATION K"],
            "last_updated": "2025-03-01T11:59:50Z",
            "logon_time": "2025-03-01T09:30:00Z"
        }],
        "servers": [],
        "prefiles": []
    }"#;

    #[test]
    fn test_parse_feed() {
        let clients = parse_feed(SAMPLE_FEED.as_bytes()).unwrap();

        assert_eq!(clients.len(), 3);
        let RawClientDetails::Pilot(pilot) = &clients[0].details else {
            panic!("expected pilot");
        };
        assert_eq!(clients[0].callsign, "DLH456");
        assert_eq!(pilot.ground_speed, 180);
        let plan = pilot.flight_plan.as_ref().unwrap();
        assert_eq!(plan.aircraft, "A320");
        assert_eq!(plan.departure, "EDDF");
    }

    #[test]
    fn test_parse_feed_controller_kinds() {
        let clients = parse_feed(SAMPLE_FEED.as_bytes()).unwrap();

        match &clients[1].details {
            RawClientDetails::Controller(controller) => {
                assert_eq!(controller.facility, 6);
                assert!(controller.text_atis.is_empty());
            }
            other => panic!("expected controller, got {other:?}"),
        }
        match &clients[2].details {
            RawClientDetails::Atis(atis) => assert_eq!(atis.atis_code.as_deref(), Some("K")),
            other => panic!("expected ATIS, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_feed_without_flight_plan() {
        let body = r#"{ "pilots": [{
            "cid": 1, "callsign": "N12345", "latitude": 40.6, "longitude": -73.8,
            "flight_plan": null,
            "logon_time": "2025-03-01T10:00:00Z", "last_updated": "2025-03-01T10:00:00Z"
        }] }"#;
        let clients = parse_feed(body.as_bytes()).unwrap();

        let RawClientDetails::Pilot(pilot) = &clients[0].details else {
            panic!("expected pilot");
        };
        assert!(pilot.flight_plan.is_none());
    }

    #[test]
    fn test_malformed_feed_is_decode_error() {
        assert!(matches!(parse_feed(b"<html>maintenance</html>"), Err(FetchError::Decode(_))));
    }

    #[tokio::test]
    async fn test_unreachable_feed_is_unavailable() {
        let source = HttpSnapshotSource::new(
            "http://127.0.0.1:9/vatsim-data.json",
            "/nonexistent/vatsim-map-test",
            Duration::from_secs(2),
        )
        .unwrap();

        assert!(matches!(source.fetch().await, Err(FetchError::Unavailable(_))));
    }
}
