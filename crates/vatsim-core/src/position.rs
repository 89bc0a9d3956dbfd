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

//! Geographic positions and great-circle distance.

use serde::{Deserialize, Serialize};

/// Mean earth radius in nautical miles.
pub const EARTH_RADIUS_NM: f64 = 3440.065;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

impl Position {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Whether the position lies inside latitude [-90, 90] and longitude
    /// [-180, 180]. NaN coordinates are never canonical.
    #[must_use]
    pub fn is_canonical(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }

    /// Great-circle distance to another position in nautical miles.
    #[must_use]
    pub fn distance_nm(&self, other: &Position) -> f64 {
        haversine_distance_nm(self.latitude, self.longitude, other.latitude, other.longitude)
    }

    /// Cartesian coordinates on the unit sphere.
    pub(crate) fn to_unit_vector(self) -> [f64; 3] {
        let lat = self.latitude.to_radians();
        let lon = self.longitude.to_radians();
        [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
    }
}

/// Shift a longitude by ±360° into [-180, 180] when it overshoots the
/// antimeridian by less than one revolution.
#[must_use]
pub fn normalize_longitude(longitude: f64) -> f64 {
    if longitude > 180.0 {
        longitude - 360.0
    } else if longitude < -180.0 {
        longitude + 360.0
    } else {
        longitude
    }
}

/// Calculate distance in nautical miles between two lat/lon points using the
/// Haversine formula.
#[must_use]
pub fn haversine_distance_nm(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_NM * c
}

/// Convert a chord length on the unit sphere to a surface distance in
/// nautical miles.
pub(crate) fn chord_to_nm(chord: f64) -> f64 {
    2.0 * (chord / 2.0).clamp(0.0, 1.0).asin() * EARTH_RADIUS_NM
}

/// Convert a surface distance in nautical miles to the matching chord length
/// on the unit sphere. Distances beyond half the circumference map to the
/// sphere's diameter.
pub(crate) fn nm_to_chord(distance_nm: f64) -> f64 {
    let angle = distance_nm / EARTH_RADIUS_NM;
    if angle >= std::f64::consts::PI {
        2.0
    } else {
        2.0 * (angle / 2.0).sin()
    }
}
