/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the deduplicated spherical point set with neighbour index and grid generators.
//
// Created on: 12 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::direction::Direction;
use crate::kdtree::KdTree3;
use sphertex_utils::{median, ANGULAR_DEDUP_TOLERANCE};
use std::f64::consts::{PI, TAU};

/// An unstructured set of unique directions on the unit sphere with a
/// nearest-neighbour index and a measured local resolution.
///
/// Duplicate input directions (within [`ANGULAR_DEDUP_TOLERANCE`]) are
/// removed on construction, keeping the first occurrence. `kept_indices`
/// maps each stored direction back to its position in the original input so
/// that callers can subset parallel value arrays consistently.
#[derive(Debug)]
pub struct SphereGrid {
    directions: Vec<Direction>,
    kept_indices: Vec<usize>,
    tree: KdTree3,
    resolution: f64,
}

impl SphereGrid {
    /// Builds a grid from scattered directions, deduplicating as described
    /// above.
    pub fn new(input: &[Direction]) -> Self {
        let (directions, kept_indices) = dedup_directions(input);
        let tree = KdTree3::new(&directions);
        let resolution = measure_resolution(&directions, &tree);
        Self {
            directions,
            kept_indices,
            tree,
            resolution,
        }
    }

    /// Builds an equispaced grid covering the whole sphere at roughly the
    /// requested angular resolution (radians).
    ///
    /// Points are laid out on polar rings, with the per-ring count scaled by
    /// `sin(theta)` and a half-step azimuthal offset between successive
    /// rings to avoid meridian alignment.
    pub fn equispaced(resolution: f64) -> Self {
        assert!(
            resolution > 0.0 && resolution < PI,
            "resolution must lie in (0, pi), got {}",
            resolution
        );

        let n_rings = ((PI / resolution).round() as usize).max(2) + 1;
        let dtheta = PI / (n_rings - 1) as f64;

        let mut dirs = Vec::new();
        for i in 0..n_rings {
            let theta = i as f64 * dtheta;
            let n_ring = ((TAU * theta.sin() / resolution).round() as usize).max(1);
            let offset = 0.5 * TAU / n_ring as f64 * (i % 2) as f64;
            for j in 0..n_ring {
                let rho = offset + j as f64 * TAU / n_ring as f64;
                dirs.push(Direction::from_polar(theta, rho));
            }
        }

        Self::new(&dirs)
    }

    #[inline(always)]
    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    /// Indices of the kept (first-occurrence) input directions.
    #[inline(always)]
    pub fn kept_indices(&self) -> &[usize] {
        &self.kept_indices
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.directions.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }

    /// Median nearest-neighbour angular distance of the stored directions.
    #[inline(always)]
    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Nearest stored direction to `target` as `(index, angular_distance)`.
    pub fn nearest(&self, target: &Direction) -> Option<(usize, f64)> {
        self.tree.nearest(target)
    }

    /// The `k` angularly nearest stored directions, closest first.
    pub fn k_nearest(&self, target: &Direction, k: usize) -> Vec<(usize, f64)> {
        self.tree.k_nearest(target, k)
    }

    /// All stored directions within angular distance `radius` of `target`.
    pub fn within_angle(&self, target: &Direction, radius: f64) -> Vec<usize> {
        self.tree.within_angle(target, radius)
    }
}

fn dedup_directions(input: &[Direction]) -> (Vec<Direction>, Vec<usize>) {
    let mut kept: Vec<Direction> = Vec::with_capacity(input.len());
    let mut kept_indices: Vec<usize> = Vec::with_capacity(input.len());

    // Bucket candidates by quantized z to avoid the full quadratic scan.
    let tol = ANGULAR_DEDUP_TOLERANCE;
    let mut buckets: std::collections::HashMap<i64, Vec<usize>> = std::collections::HashMap::new();
    let band = |z: f64| (z / (2.0 * tol)).floor() as i64;

    for (i, d) in input.iter().enumerate() {
        let b = band(d.z());
        let duplicate = (b - 1..=b + 1).any(|key| {
            buckets
                .get(&key)
                .map(|ids| ids.iter().any(|&j| kept[j].angle_to(d) < tol))
                .unwrap_or(false)
        });
        if !duplicate {
            buckets.entry(b).or_default().push(kept.len());
            kept.push(*d);
            kept_indices.push(i);
        }
    }

    (kept, kept_indices)
}

fn measure_resolution(directions: &[Direction], tree: &KdTree3) -> f64 {
    if directions.len() < 2 {
        return PI;
    }

    let nn_angles: Vec<f64> = directions
        .iter()
        .map(|d| {
            tree.k_nearest(d, 2)
                .get(1)
                .map(|&(_, a)| a)
                .unwrap_or(PI)
        })
        .collect();

    median(&nn_angles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::generate_random_directions;

    #[test]
    fn dedup_keeps_first_occurrence() {
        let a = Direction::from_polar(0.5, 1.0);
        let b = Direction::from_polar(1.5, 2.0);
        let grid = SphereGrid::new(&[a, b, a, b, a]);
        assert_eq!(grid.len(), 2);
        assert_eq!(grid.kept_indices(), &[0, 1]);
    }

    #[test]
    fn equispaced_point_count_scales_with_resolution() {
        let coarse = SphereGrid::equispaced(10.0_f64.to_radians());
        let fine = SphereGrid::equispaced(5.0_f64.to_radians());
        assert!(fine.len() > 3 * coarse.len());
        // ~2 degree grid is on the order of 10k points
        let default = SphereGrid::equispaced(2.0_f64.to_radians());
        assert!(default.len() > 8_000 && default.len() < 14_000);
    }

    #[test]
    fn equispaced_covers_both_poles() {
        let grid = SphereGrid::equispaced(0.2);
        let north = grid.nearest(&Direction::z_axis()).unwrap();
        let south = grid.nearest(&Direction::new(0.0, 0.0, -1.0)).unwrap();
        assert!(north.1 < 1e-10);
        assert!(south.1 < 1e-10);
    }

    #[test]
    fn resolution_tracks_grid_spacing() {
        let res = 8.0_f64.to_radians();
        let grid = SphereGrid::equispaced(res);
        assert!(grid.resolution() > 0.5 * res && grid.resolution() < 2.0 * res);
    }

    #[test]
    fn nearest_queries_delegate_to_tree() {
        let dirs = generate_random_directions(100, Some(3));
        let grid = SphereGrid::new(&dirs);
        let (idx, angle) = grid.nearest(&dirs[42]).unwrap();
        assert!(angle < 1e-10);
        assert!(grid.directions()[idx].angle_to(&dirs[42]) < 1e-7);
    }
}
