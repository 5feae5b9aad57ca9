/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides a KD-tree over unit vectors for nearest-neighbour and angular radius queries.
//
// Created on: 12 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::direction::Direction;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

// Chord length corresponding to an angular distance on the unit sphere:
// two unit vectors at angle `a` are `2 sin(a / 2)` apart in 3-space. Chord
// and angle are monotonically related, so nearest-by-chord is
// nearest-by-angle and angular radius queries reduce to chord radius
// queries.
#[inline(always)]
fn chord_from_angle(angle: f64) -> f64 {
    2.0 * (0.5 * angle.clamp(0.0, std::f64::consts::PI)).sin()
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct IndexedPoint {
    coords: [f64; 3],
    id: usize,
}

impl IndexedPoint {
    fn from_direction(d: &Direction, id: usize) -> Self {
        Self {
            coords: [d.x(), d.y(), d.z()],
            id,
        }
    }

    #[inline(always)]
    fn distance(&self, other: &[f64; 3]) -> f64 {
        let dx = self.coords[0] - other[0];
        let dy = self.coords[1] - other[1];
        let dz = self.coords[2] - other[2];
        (dx * dx + dy * dy + dz * dz).sqrt()
    }
}

/// A node in the KD-tree.
#[derive(Debug)]
struct Node {
    point: IndexedPoint,
    left: Option<usize>,
    right: Option<usize>,
}

#[derive(Debug, PartialEq)]
struct Neighbour {
    distance: f64,
    id: usize,
}

impl Eq for Neighbour {}

impl PartialOrd for Neighbour {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        // Reverse order for max-heap
        other.distance.partial_cmp(&self.distance)
    }
}

impl Ord for Neighbour {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other).unwrap_or(Ordering::Equal)
    }
}

/// A KD-tree over directions (unit vectors), stored as a flat node vector.
///
/// Queries are phrased in angular terms; internally all comparisons use the
/// Euclidean chord metric, which orders points identically.
#[derive(Debug)]
pub struct KdTree3 {
    nodes: Vec<Node>,
}

impl KdTree3 {
    /// Constructs a new KD-tree from a slice of directions. Node ids are the
    /// indices into the input slice.
    pub fn new(directions: &[Direction]) -> Self {
        let mut points: Vec<IndexedPoint> = directions
            .iter()
            .enumerate()
            .map(|(i, d)| IndexedPoint::from_direction(d, i))
            .collect();

        let mut tree = KdTree3 { nodes: Vec::new() };
        tree.build_tree(&mut points, 0);
        tree
    }

    /// Recursively builds the KD-tree and stores nodes in a flat vector.
    fn build_tree(&mut self, points: &mut [IndexedPoint], depth: usize) -> Option<usize> {
        if points.is_empty() {
            return None;
        }

        let axis = depth % 3;

        points.sort_by(|a, b| {
            a.coords[axis]
                .partial_cmp(&b.coords[axis])
                .unwrap_or(Ordering::Equal)
        });

        let mid = points.len() / 2;
        let median_point = points[mid];

        let node_index = self.nodes.len();
        self.nodes.push(Node {
            point: median_point,
            left: None,
            right: None,
        });

        self.nodes[node_index].left = self.build_tree(&mut points[..mid], depth + 1);
        self.nodes[node_index].right = self.build_tree(&mut points[mid + 1..], depth + 1);

        Some(node_index)
    }

    /// Returns the id and angular distance of the sample closest to `target`.
    ///
    /// Returns `None` for an empty tree.
    pub fn nearest(&self, target: &Direction) -> Option<(usize, f64)> {
        self.k_nearest(target, 1).into_iter().next()
    }

    /// Returns up to `k` nearest samples to `target`, closest first, as
    /// `(id, angular_distance)` pairs.
    pub fn k_nearest(&self, target: &Direction, k: usize) -> Vec<(usize, f64)> {
        if self.nodes.is_empty() || k == 0 {
            return Vec::new();
        }

        let q = [target.x(), target.y(), target.z()];
        let mut heap = BinaryHeap::with_capacity(k);
        self.k_nearest_impl(0, &q, k, 0, &mut heap);

        let mut result: Vec<_> = heap.into_sorted_vec();
        result.reverse(); // closest first
        result
            .into_iter()
            .map(|n| {
                // chord -> angle
                let angle = 2.0 * (0.5 * n.distance).clamp(-1.0, 1.0).asin();
                (n.id, angle)
            })
            .collect()
    }

    /// Returns the ids of all samples within angular distance `radius` of
    /// `target`.
    pub fn within_angle(&self, target: &Direction, radius: f64) -> Vec<usize> {
        let mut result = Vec::new();
        if self.nodes.is_empty() || radius < 0.0 {
            return result;
        }
        let q = [target.x(), target.y(), target.z()];
        self.radius_search_impl(0, &q, chord_from_angle(radius), 0, &mut result);
        result
    }

    fn radius_search_impl(
        &self,
        node_index: usize,
        target: &[f64; 3],
        chord_radius: f64,
        depth: usize,
        result: &mut Vec<usize>,
    ) {
        let node = &self.nodes[node_index];
        let dist = node.point.distance(target);

        if dist <= chord_radius {
            result.push(node.point.id);
        }

        let axis = depth % 3;
        let diff = target[axis] - node.point.coords[axis];

        if diff.abs() <= chord_radius {
            if let Some(left) = node.left {
                self.radius_search_impl(left, target, chord_radius, depth + 1, result);
            }
            if let Some(right) = node.right {
                self.radius_search_impl(right, target, chord_radius, depth + 1, result);
            }
        } else if diff < 0.0 {
            if let Some(left) = node.left {
                self.radius_search_impl(left, target, chord_radius, depth + 1, result);
            }
        } else if let Some(right) = node.right {
            self.radius_search_impl(right, target, chord_radius, depth + 1, result);
        }
    }

    fn k_nearest_impl(
        &self,
        node_index: usize,
        target: &[f64; 3],
        k: usize,
        depth: usize,
        heap: &mut BinaryHeap<Neighbour>,
    ) {
        let node = &self.nodes[node_index];
        let dist = node.point.distance(target);

        if heap.len() < k {
            heap.push(Neighbour {
                distance: dist,
                id: node.point.id,
            });
        } else if dist < heap.peek().unwrap().distance {
            heap.pop();
            heap.push(Neighbour {
                distance: dist,
                id: node.point.id,
            });
        }

        let axis = depth % 3;
        let diff = target[axis] - node.point.coords[axis];

        let (near_idx, far_idx) = match diff < 0.0 {
            true => (node.left, node.right),
            false => (node.right, node.left),
        };

        if let Some(near) = near_idx {
            self.k_nearest_impl(near, target, k, depth + 1, heap);
        }

        if let Some(far) = far_idx {
            if heap.len() < k || diff.abs() <= heap.peek().unwrap().distance {
                self.k_nearest_impl(far, target, k, depth + 1, heap);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::generate_random_directions;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn brute_force_nearest(dirs: &[Direction], target: &Direction) -> (usize, f64) {
        let mut best = (0, f64::INFINITY);
        for (i, d) in dirs.iter().enumerate() {
            let a = d.angle_to(target);
            if a < best.1 {
                best = (i, a);
            }
        }
        best
    }

    fn brute_force_within(dirs: &[Direction], target: &Direction, radius: f64) -> Vec<usize> {
        let mut ids: Vec<usize> = dirs
            .iter()
            .enumerate()
            .filter(|(_, d)| d.angle_to(target) <= radius + 1e-12)
            .map(|(i, _)| i)
            .collect();
        ids.sort_unstable();
        ids
    }

    #[test]
    fn nearest_matches_bruteforce() {
        let dirs = generate_random_directions(400, Some(42));
        let tree = KdTree3::new(&dirs);
        let queries = generate_random_directions(50, Some(43));

        for q in &queries {
            let (kd_id, kd_angle) = tree.nearest(q).unwrap();
            let (bf_id, bf_angle) = brute_force_nearest(&dirs, q);
            // Ties are possible in principle; compare distances, not ids.
            assert!((kd_angle - bf_angle).abs() < 1e-10, "{} vs {}", kd_id, bf_id);
        }
    }

    #[test]
    fn k_nearest_is_sorted_and_matches_bruteforce() {
        let dirs = generate_random_directions(300, Some(123));
        let tree = KdTree3::new(&dirs);
        let queries = generate_random_directions(20, Some(124));

        for q in &queries {
            let got = tree.k_nearest(q, 4);
            assert_eq!(got.len(), 4);
            for pair in got.windows(2) {
                assert!(pair[0].1 <= pair[1].1 + 1e-14);
            }

            let mut all: Vec<f64> = dirs.iter().map(|d| d.angle_to(q)).collect();
            all.sort_by(|a, b| a.partial_cmp(b).unwrap());
            for (i, (_, angle)) in got.iter().enumerate() {
                assert!((angle - all[i]).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn within_angle_matches_bruteforce() {
        let dirs = generate_random_directions(250, Some(999));
        let tree = KdTree3::new(&dirs);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..25 {
            let q = dirs[rng.random_range(0..dirs.len())];
            let r = rng.random_range(0.0..0.6);

            let mut kd_ids = tree.within_angle(&q, r);
            kd_ids.sort_unstable();
            let bf_ids = brute_force_within(&dirs, &q, r);
            assert_eq!(kd_ids, bf_ids);
        }
    }

    #[test]
    fn exact_sample_query_returns_zero_distance() {
        let dirs = generate_random_directions(50, Some(5));
        let tree = KdTree3::new(&dirs);
        let (id, angle) = tree.nearest(&dirs[17]).unwrap();
        assert_eq!(id, 17);
        assert!(angle < 1e-10);
    }

    #[test]
    fn empty_tree_returns_empty() {
        let tree = KdTree3::new(&[]);
        assert!(tree.nearest(&Direction::z_axis()).is_none());
        assert!(tree.within_angle(&Direction::z_axis(), 1.0).is_empty());
    }

    #[test]
    fn negative_radius_returns_empty() {
        let dirs = generate_random_directions(10, Some(44));
        let tree = KdTree3::new(&dirs);
        assert!(tree.within_angle(&dirs[0], -0.1).is_empty());
    }
}
