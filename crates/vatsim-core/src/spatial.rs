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

//! Geographic nearest-neighbor index.
//!
//! Positions are projected onto the unit sphere and stored in a static 3-D
//! k-d tree. Straight-line (chord) distance between unit vectors grows
//! monotonically with great-circle distance, so ranking by chord ranks by
//! surface distance, and points on either side of the antimeridian are
//! neighbors in this space without any special casing.
//!
//! The tree is rebuilt wholesale every cycle and never edited in place.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::debug;

use crate::position::{chord_to_nm, nm_to_chord, normalize_longitude, Position};
use crate::store::Handle;

/// Points per leaf before a node is split.
const LEAF_SIZE: usize = 8;

/// Slack on the maximum chord so points lying exactly on the search radius
/// survive floating point rounding.
const CHORD_EPSILON: f64 = 1e-12;

type Vector = [f64; 3];

#[derive(Debug)]
struct IndexedPoint<T> {
    handle: Handle<T>,
    vector: Vector,
}

#[derive(Debug, Clone, Copy)]
enum NodeKind {
    Leaf { start: usize, end: usize },
    Branch { left: usize, right: usize },
}

#[derive(Debug, Clone, Copy)]
struct Node {
    min: Vector,
    max: Vector,
    kind: NodeKind,
}

impl Node {
    /// Lower bound on the chord distance from `query` to any point below
    /// this node.
    fn distance_to(&self, query: &Vector) -> f64 {
        let mut sum = 0.0;
        for axis in 0..3 {
            let delta = if query[axis] < self.min[axis] {
                self.min[axis] - query[axis]
            } else if query[axis] > self.max[axis] {
                query[axis] - self.max[axis]
            } else {
                0.0
            };
            sum += delta * delta;
        }
        sum.sqrt()
    }
}

/// Static k-d tree over entity positions.
#[derive(Debug)]
pub struct SpatialIndex<T> {
    points: Vec<IndexedPoint<T>>,
    nodes: Vec<Node>,
}

impl<T> Default for SpatialIndex<T> {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            nodes: Vec::new(),
        }
    }
}

impl<T> SpatialIndex<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole index with `points`.
    ///
    /// Positions outside the canonical coordinate range are left out and
    /// returned so the caller can report them.
    pub fn rebuild(&mut self, points: impl IntoIterator<Item = (Handle<T>, Position)>) -> Vec<Handle<T>> {
        let mut excluded = Vec::new();

        self.points.clear();
        self.nodes.clear();

        for (handle, position) in points {
            if position.is_canonical() {
                self.points.push(IndexedPoint {
                    handle,
                    vector: position.to_unit_vector(),
                });
            } else {
                excluded.push(handle);
            }
        }

        if !self.points.is_empty() {
            self.build(0, self.points.len());
        }

        debug!(
            "Spatial index rebuilt with {} points in {} nodes ({} excluded)",
            self.points.len(),
            self.nodes.len(),
            excluded.len()
        );

        excluded
    }

    /// Build the subtree over `points[start..end]`, returning its node index.
    fn build(&mut self, start: usize, end: usize) -> usize {
        let (min, max) = bounds(&self.points[start..end]);
        let id = self.nodes.len();
        self.nodes.push(Node {
            min,
            max,
            kind: NodeKind::Leaf { start, end },
        });

        if end - start <= LEAF_SIZE {
            return id;
        }

        let axis = widest_axis(&min, &max);
        let mid = (end - start) / 2;
        self.points[start..end].select_nth_unstable_by(mid, |a, b| a.vector[axis].total_cmp(&b.vector[axis]));

        let left = self.build(start, start + mid);
        let right = self.build(start + mid, end);
        self.nodes[id].kind = NodeKind::Branch { left, right };
        id
    }

    /// Number of indexed points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Entities within `max_distance_nm` of `position`, nearest first, at
    /// most `max_count` of them, each paired with its distance in nautical
    /// miles.
    ///
    /// The query longitude is shifted by ±360° when it overshoots the
    /// antimeridian. Invalid queries (latitude out of range, NaN, negative
    /// distance, zero count) yield nothing. Results are computed lazily;
    /// every call starts a fresh traversal.
    #[must_use]
    pub fn nearest(&self, position: Position, max_distance_nm: f64, max_count: usize) -> Nearest<'_, T> {
        let query = Position::new(position.latitude, normalize_longitude(position.longitude));

        let mut nearest = Nearest {
            index: self,
            query: query.to_unit_vector(),
            max_chord: 0.0,
            remaining: 0,
            heap: BinaryHeap::new(),
        };

        if !query.is_canonical() || max_distance_nm.is_nan() || max_distance_nm < 0.0 || max_count == 0 || self.nodes.is_empty() {
            return nearest;
        }

        nearest.max_chord = nm_to_chord(max_distance_nm) + CHORD_EPSILON;
        nearest.remaining = max_count;
        nearest.push_node(0);
        nearest
    }
}

fn bounds<T>(points: &[IndexedPoint<T>]) -> (Vector, Vector) {
    let mut min = [f64::INFINITY; 3];
    let mut max = [f64::NEG_INFINITY; 3];
    for point in points {
        for axis in 0..3 {
            min[axis] = min[axis].min(point.vector[axis]);
            max[axis] = max[axis].max(point.vector[axis]);
        }
    }
    (min, max)
}

fn widest_axis(min: &Vector, max: &Vector) -> usize {
    (0..3)
        .max_by(|&a, &b| (max[a] - min[a]).total_cmp(&(max[b] - min[b])))
        .unwrap_or(0)
}

fn chord(a: &Vector, b: &Vector) -> f64 {
    ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2) + (a[2] - b[2]).powi(2)).sqrt()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    Node(usize),
    Point(usize),
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    distance: f64,
    target: Target,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    // Reversed so the max-heap pops the closest candidate first. On equal
    // distance points pop before nodes.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| match (self.target, other.target) {
                (Target::Point(_), Target::Node(_)) => Ordering::Greater,
                (Target::Node(_), Target::Point(_)) => Ordering::Less,
                _ => Ordering::Equal,
            })
    }
}

/// Lazy best-first traversal returned by [`SpatialIndex::nearest`].
#[derive(Debug)]
pub struct Nearest<'a, T> {
    index: &'a SpatialIndex<T>,
    query: Vector,
    max_chord: f64,
    remaining: usize,
    heap: BinaryHeap<Candidate>,
}

impl<T> Nearest<'_, T> {
    fn push_node(&mut self, id: usize) {
        let distance = self.index.nodes[id].distance_to(&self.query);
        if distance <= self.max_chord {
            self.heap.push(Candidate {
                distance,
                target: Target::Node(id),
            });
        }
    }

    fn push_point(&mut self, id: usize) {
        let distance = chord(&self.query, &self.index.points[id].vector);
        if distance <= self.max_chord {
            self.heap.push(Candidate {
                distance,
                target: Target::Point(id),
            });
        }
    }
}

impl<T> Iterator for Nearest<'_, T> {
    type Item = (Handle<T>, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        while let Some(candidate) = self.heap.pop() {
            match candidate.target {
                Target::Point(id) => {
                    self.remaining -= 1;
                    if self.remaining == 0 {
                        self.heap.clear();
                    }
                    return Some((self.index.points[id].handle, chord_to_nm(candidate.distance)));
                }
                Target::Node(id) => match self.index.nodes[id].kind {
                    NodeKind::Leaf { start, end } => {
                        for point in start..end {
                            self.push_point(point);
                        }
                    }
                    NodeKind::Branch { left, right } => {
                        self.push_node(left);
                        self.push_node(right);
                    }
                },
            }
        }

        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Arena;

    struct Blip;

    /// Deterministic pseudo-random positions spread over the globe.
    fn scatter(count: usize) -> Vec<Position> {
        let mut state: u64 = 0x2545_F491_4F6C_DD1D;
        let mut next = move || {
            state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1_442_695_040_888_963_407);
            #[allow(clippy::cast_precision_loss, reason = "test data only needs coarse randomness")]
            let unit = (state >> 11) as f64 / (1u64 << 53) as f64;
            unit
        };
        (0..count)
            .map(|_| Position::new(next() * 180.0 - 90.0, next() * 360.0 - 180.0))
            .collect()
    }

    fn build(positions: &[Position]) -> (SpatialIndex<Blip>, Vec<(Handle<Blip>, Position)>) {
        let mut arena = Arena::new();
        let entries: Vec<_> = positions.iter().map(|&p| (arena.insert(Blip), p)).collect();
        let mut index = SpatialIndex::new();
        index.rebuild(entries.iter().copied());
        (index, entries)
    }

    #[test]
    fn test_matches_brute_force() {
        let positions = scatter(500);
        let (index, entries) = build(&positions);
        let query = Position::new(47.5, 8.5);

        let found: Vec<f64> = index.nearest(query, 1500.0, 25).map(|(_, d)| d).collect();

        let mut expected: Vec<f64> = entries
            .iter()
            .map(|(_, p)| query.distance_nm(p))
            .filter(|d| *d <= 1500.0)
            .collect();
        expected.sort_by(f64::total_cmp);
        expected.truncate(25);

        assert_eq!(found.len(), expected.len());
        for (a, b) in found.iter().zip(&expected) {
            assert!((a - b).abs() < 1e-6, "{a} != {b}");
        }
    }

    #[test]
    fn test_results_within_radius_and_ordered() {
        let positions = scatter(300);
        let (index, entries) = build(&positions);
        let query = Position::new(-20.0, 140.0);

        let results: Vec<_> = index.nearest(query, 2000.0, 10).collect();
        assert!(results.len() <= 10);

        for window in results.windows(2) {
            assert!(window[0].1 <= window[1].1);
        }
        for (handle, distance) in &results {
            let (_, position) = entries.iter().find(|(h, _)| h == handle).unwrap();
            let truth = query.distance_nm(position);
            assert!(truth <= 2000.0 + 1e-6);
            assert!((truth - distance).abs() < 1e-6);
        }
    }

    #[test]
    fn test_antimeridian_query_matches_normalized() {
        let positions = vec![
            Position::new(10.0, 179.8),
            Position::new(10.0, -179.8),
            Position::new(10.5, -175.0),
            Position::new(9.0, 170.0),
        ];
        let (index, entries) = build(&positions);

        let overshoot: Vec<_> = index.nearest(Position::new(10.0, 185.0), 700.0, 10).collect();
        let normalized: Vec<_> = index.nearest(Position::new(10.0, -175.0), 700.0, 10).collect();

        assert_eq!(overshoot, normalized);
        assert_eq!(overshoot[0].0, entries[2].0);
        // Both sides of the seam are found
        assert!(overshoot.iter().any(|(h, _)| *h == entries[0].0));
        assert!(overshoot.iter().any(|(h, _)| *h == entries[1].0));
    }

    #[test]
    fn test_out_of_bounds_points_are_excluded() {
        let mut arena = Arena::new();
        let good = arena.insert(Blip);
        let bad = arena.insert(Blip);

        let mut index = SpatialIndex::new();
        let excluded = index.rebuild(vec![(good, Position::new(0.0, 0.0)), (bad, Position::new(95.0, 0.0))]);

        assert_eq!(excluded, vec![bad]);
        assert_eq!(index.len(), 1);
        let results: Vec<_> = index.nearest(Position::new(0.0, 0.0), 10_000.0, 10).collect();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, good);
    }

    #[test]
    fn test_invalid_queries_are_empty() {
        let (index, _) = build(&scatter(50));

        assert_eq!(index.nearest(Position::new(91.0, 0.0), 100.0, 5).count(), 0);
        assert_eq!(index.nearest(Position::new(0.0, 0.0), -1.0, 5).count(), 0);
        assert_eq!(index.nearest(Position::new(0.0, 0.0), 100_000.0, 0).count(), 0);
        assert_eq!(index.nearest(Position::new(f64::NAN, 0.0), 100.0, 5).count(), 0);
    }

    #[test]
    fn test_empty_index() {
        let index: SpatialIndex<Blip> = SpatialIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.nearest(Position::new(0.0, 0.0), 100_000.0, 5).count(), 0);
    }

    #[test]
    fn test_query_is_restartable() {
        let (index, _) = build(&scatter(200));
        let query = Position::new(35.0, -100.0);

        let first: Vec<_> = index.nearest(query, 3000.0, 15).collect();
        let second: Vec<_> = index.nearest(query, 3000.0, 15).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_rebuild_replaces_contents() {
        let mut arena = Arena::new();
        let old = arena.insert(Blip);
        let new = arena.insert(Blip);

        let mut index = SpatialIndex::new();
        index.rebuild(vec![(old, Position::new(1.0, 1.0))]);
        index.rebuild(vec![(new, Position::new(2.0, 2.0))]);

        let results: Vec<_> = index.nearest(Position::new(1.0, 1.0), 500.0, 5).map(|(h, _)| h).collect();
        assert_eq!(results, vec![new]);
    }
}
