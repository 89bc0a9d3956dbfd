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

use geo::{BoundingRect, Coord, LineString, MultiPolygon, Polygon, Rect};

use crate::lookup::normalize_key;
use crate::raw::RawBoundary;
use crate::reconcile::{assign, Reconcile};

/// Geometry of a flight information region.
///
/// Coordinates are `x = longitude`, `y = latitude`. Boundaries crossing the
/// antimeridian carry longitudes beyond ±180 on one side.
#[derive(Debug, Clone, PartialEq)]
pub struct FirBoundary {
    pub id: String,
    pub oceanic: bool,
    pub extension: bool,
    pub geometry: MultiPolygon<f64>,
    /// Bounding box of `geometry`, `None` when it has no points.
    pub bounds: Option<Rect<f64>>,
}

impl FirBoundary {
    /// Whether the bounding box reaches past the antimeridian.
    #[must_use]
    pub fn crosses_antimeridian(&self) -> bool {
        self.bounds
            .is_some_and(|rect| rect.min().x < -180.0 || rect.max().x > 180.0)
    }
}

fn ring(points: &[[f64; 2]]) -> LineString<f64> {
    points
        .iter()
        .map(|&[x, y]| Coord { x, y })
        .collect::<Vec<_>>()
        .into()
}

fn to_multi_polygon(polygons: &[Vec<Vec<[f64; 2]>>]) -> MultiPolygon<f64> {
    polygons
        .iter()
        .filter_map(|rings| {
            let (exterior, holes) = rings.split_first()?;
            Some(Polygon::new(ring(exterior), holes.iter().map(|h| ring(h)).collect()))
        })
        .collect::<Vec<_>>()
        .into()
}

impl Reconcile<RawBoundary> for FirBoundary {
    type Key = String;
    const FAMILY: &'static str = "boundary";

    fn key(raw: &RawBoundary) -> String {
        normalize_key(&raw.id)
    }

    fn create(raw: &RawBoundary) -> Self {
        Self {
            id: normalize_key(&raw.id),
            oceanic: false,
            extension: false,
            geometry: MultiPolygon::new(Vec::new()),
            bounds: None,
        }
    }

    fn populate(&mut self, raw: &RawBoundary) -> bool {
        let mut changed = assign(&mut self.oceanic, raw.oceanic);
        changed |= assign(&mut self.extension, raw.extension);

        let geometry = to_multi_polygon(&raw.polygons);
        if geometry != self.geometry {
            self.bounds = geometry.bounding_rect();
            self.geometry = geometry;
            changed = true;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min_lon: f64, min_lat: f64, size: f64) -> Vec<Vec<[f64; 2]>> {
        vec![vec![
            [min_lon, min_lat],
            [min_lon + size, min_lat],
            [min_lon + size, min_lat + size],
            [min_lon, min_lat + size],
            [min_lon, min_lat],
        ]]
    }

    #[test]
    fn test_populate_builds_geometry_and_bounds() {
        let raw = RawBoundary {
            id: "eddf".to_string(),
            oceanic: false,
            extension: false,
            polygons: vec![square(8.0, 49.0, 2.0), square(12.0, 49.0, 1.0)],
        };
        let mut boundary = FirBoundary::create(&raw);
        boundary.populate(&raw);

        assert_eq!(boundary.id, "EDDF");
        assert_eq!(boundary.geometry.0.len(), 2);
        let bounds = boundary.bounds.unwrap();
        assert!((bounds.min().x - 8.0).abs() < 1e-9);
        assert!((bounds.max().x - 13.0).abs() < 1e-9);
        assert!(!boundary.crosses_antimeridian());
    }

    #[test]
    fn test_populate_reports_geometry_changes() {
        let mut raw = RawBoundary {
            id: "EDGG".to_string(),
            oceanic: false,
            extension: false,
            polygons: vec![square(5.0, 49.0, 5.0)],
        };
        let mut boundary = FirBoundary::create(&raw);

        assert!(boundary.populate(&raw));
        assert!(!boundary.populate(&raw));

        raw.polygons = vec![square(5.0, 49.0, 6.0)];
        assert!(boundary.populate(&raw));
        assert!((boundary.bounds.unwrap().max().x - 11.0).abs() < 1e-9);

        raw.oceanic = true;
        assert!(boundary.populate(&raw));
        assert!(!boundary.populate(&raw));
    }

    #[test]
    fn test_antimeridian_detection() {
        let raw = RawBoundary {
            id: "NZZO".to_string(),
            oceanic: true,
            extension: false,
            polygons: vec![square(170.0, -40.0, 20.0)],
        };
        let mut boundary = FirBoundary::create(&raw);
        boundary.populate(&raw);

        assert!(boundary.crosses_antimeridian());
    }

    #[test]
    fn test_empty_polygon_has_no_bounds() {
        let raw = RawBoundary {
            id: "XXXX".to_string(),
            oceanic: false,
            extension: false,
            polygons: vec![Vec::new()],
        };
        let mut boundary = FirBoundary::create(&raw);
        boundary.populate(&raw);

        assert!(boundary.geometry.0.is_empty());
        assert!(boundary.bounds.is_none());
    }
}
