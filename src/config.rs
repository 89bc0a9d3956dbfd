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

//! Application configuration management.
//!
//! Persistent configuration is stored in TOML format through confy. Missing
//! fields fall back to their defaults, so older files keep loading after new
//! settings are added.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::info;
use serde::{Deserialize, Serialize};
use vatsim_core::RefresherConfig;

const APP_NAME: &str = "vatsim-map";
const CONFIG_NAME: &str = "config";

/// Live data feed of the VATSIM network
pub const DEFAULT_FEED_URL: &str = "https://data.vatsim.net/v3/vatsim-data.json";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// URL of the live network data feed
    #[serde(default = "default_feed_url")]
    pub feed_url: String,

    /// Directory holding airports.csv, airlines.csv, firs.csv and
    /// boundaries.json
    #[serde(default = "default_reference_data_dir")]
    pub reference_data_dir: PathBuf,

    /// Seconds between refresh cycles
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Default radius for nearest-pilot searches, in nautical miles
    #[serde(default = "default_search_radius_nm")]
    pub search_radius_nm: f64,

    /// Default number of pilots returned by nearest-pilot searches
    #[serde(default = "default_search_count")]
    pub search_count: usize,

    /// Buffered cycle events per subscriber
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_feed_url() -> String {
    DEFAULT_FEED_URL.to_string()
}

fn default_reference_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from(".data"))
        .join(APP_NAME)
}

fn default_poll_interval_secs() -> u64 {
    15
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_search_radius_nm() -> f64 {
    50.0
}

fn default_search_count() -> usize {
    10
}

fn default_event_channel_capacity() -> usize {
    64
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            feed_url: default_feed_url(),
            reference_data_dir: default_reference_data_dir(),
            poll_interval_secs: default_poll_interval_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            search_radius_nm: default_search_radius_nm(),
            search_count: default_search_count(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self, confy::ConfyError> {
        let config: AppConfig = confy::load(APP_NAME, CONFIG_NAME)?;
        Ok(config.upgraded())
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self, confy::ConfyError> {
        let config: AppConfig = confy::load_path(path)?;
        Ok(config.upgraded())
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Refresh cadence and event buffering for the scheduler
    #[must_use]
    pub fn refresher_config(&self) -> RefresherConfig {
        RefresherConfig {
            interval: Duration::from_secs(self.poll_interval_secs.max(1)),
            event_channel_capacity: self.event_channel_capacity,
        }
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    // Version 0 files predate the versioning field
    fn upgraded(mut self) -> Self {
        if self.config_version < default_config_version() {
            info!(
                "Upgrading configuration from version {} to {}",
                self.config_version,
                default_config_version()
            );
            self.config_version = default_config_version();
        }
        self
    }
}
