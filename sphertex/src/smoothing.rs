/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements groupwise orientation smoothing with pluggable tangent-space filters.
//
// Created on: 12 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Orientation smoothing
//!
//! Smooths a gridded orientation map one group (grain, else phase) at a
//! time. Each group is lifted into the tangent space of a group reference
//! orientation -- after snapping every measurement to the symmetric variant
//! closest to that reference -- filtered there as a plain vector grid, and
//! mapped back. Data never crosses a group boundary: each group is
//! processed on its own bounding-box grid filled only with its own cells.
//!
//! Groups that are too small to support a neighbourhood filter are left
//! untouched (with a log notice): fewer than five cells, a bounding box
//! thinner than two cells in either direction, or no defined orientation
//! at all.

use crate::orientation::{CrystalSymmetry, Grid, OrientationMap};
use nalgebra::{UnitQuaternion, Vector3};
use sphertex_utils::median;
use std::collections::HashMap;

/// Minimum group size a neighbourhood filter can act on.
const MIN_GROUP_CELLS: usize = 5;

/// A tangent-space rotation-vector grid: the working representation all
/// filters operate on. `None` cells are undefined and must stay undefined.
pub type TangentGrid = Grid<Option<[f64; 3]>>;

/// Strategy interface for smoothing one group's tangent-space grid.
pub trait OrientationFilter {
    fn smooth(&self, tangent: &TangentGrid) -> TangentGrid;
}

/// Windowed average of the tangent vectors around each cell, with the
/// window weights renormalized over the defined cells.
#[derive(Debug, Clone, Copy)]
pub struct MeanFilter {
    /// Window radius in cells; the window is `(2 radius + 1)^2`.
    pub radius: usize,
}

impl Default for MeanFilter {
    fn default() -> Self {
        Self { radius: 1 }
    }
}

impl OrientationFilter for MeanFilter {
    fn smooth(&self, tangent: &TangentGrid) -> TangentGrid {
        let mut out = Grid::new(tangent.rows(), tangent.cols(), None);
        for r in 0..tangent.rows() {
            for c in 0..tangent.cols() {
                if tangent.get(r, c).is_none() {
                    continue;
                }
                let mut acc = [0.0; 3];
                let mut total = 0.0;
                for_window(tangent, r, c, self.radius, |v| {
                    acc[0] += v[0];
                    acc[1] += v[1];
                    acc[2] += v[2];
                    total += 1.0;
                });
                *out.get_mut(r, c) =
                    Some([acc[0] / total, acc[1] / total, acc[2] / total]);
            }
        }
        out
    }
}

/// Componentwise median of the tangent vectors around each cell; robust to
/// isolated outlier measurements.
#[derive(Debug, Clone, Copy)]
pub struct MedianFilter {
    pub radius: usize,
}

impl Default for MedianFilter {
    fn default() -> Self {
        Self { radius: 1 }
    }
}

impl OrientationFilter for MedianFilter {
    fn smooth(&self, tangent: &TangentGrid) -> TangentGrid {
        let mut out = Grid::new(tangent.rows(), tangent.cols(), None);
        for r in 0..tangent.rows() {
            for c in 0..tangent.cols() {
                if tangent.get(r, c).is_none() {
                    continue;
                }
                let mut xs = Vec::new();
                let mut ys = Vec::new();
                let mut zs = Vec::new();
                for_window(tangent, r, c, self.radius, |v| {
                    xs.push(v[0]);
                    ys.push(v[1]);
                    zs.push(v[2]);
                });
                *out.get_mut(r, c) = Some([median(&xs), median(&ys), median(&zs)]);
            }
        }
        out
    }
}

/// Iterative relaxation toward the local windowed mean: each pass moves a
/// cell a fraction `alpha` of the way toward the average of its
/// neighbourhood, approximating a smoothing spline on the grid.
#[derive(Debug, Clone, Copy)]
pub struct SplineFilter {
    /// Relaxation factor in `(0, 1]`.
    pub alpha: f64,

    /// Number of relaxation passes.
    pub iterations: usize,
}

impl Default for SplineFilter {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            iterations: 5,
        }
    }
}

impl OrientationFilter for SplineFilter {
    fn smooth(&self, tangent: &TangentGrid) -> TangentGrid {
        let mean = MeanFilter { radius: 1 };
        let mut current = tangent.clone();
        for _ in 0..self.iterations {
            let averaged = mean.smooth(&current);
            let mut next = Grid::new(current.rows(), current.cols(), None);
            for r in 0..current.rows() {
                for c in 0..current.cols() {
                    if let (Some(v), Some(m)) = (current.get(r, c), averaged.get(r, c)) {
                        *next.get_mut(r, c) = Some([
                            v[0] + self.alpha * (m[0] - v[0]),
                            v[1] + self.alpha * (m[1] - v[1]),
                            v[2] + self.alpha * (m[2] - v[2]),
                        ]);
                    }
                }
            }
            current = next;
        }
        current
    }
}

fn for_window(
    tangent: &TangentGrid,
    row: usize,
    col: usize,
    radius: usize,
    mut visit: impl FnMut(&[f64; 3]),
) {
    let r0 = row.saturating_sub(radius);
    let r1 = (row + radius).min(tangent.rows() - 1);
    let c0 = col.saturating_sub(radius);
    let c1 = (col + radius).min(tangent.cols() - 1);
    for r in r0..=r1 {
        for c in c0..=c1 {
            if let Some(v) = tangent.get(r, c) {
                visit(v);
            }
        }
    }
}

struct GroupExtent {
    indices: Vec<usize>,
    row_min: usize,
    row_max: usize,
    col_min: usize,
    col_max: usize,
}

/// Smooths the orientations of a map group by group, returning a copy with
/// the smoothed rotations written back only at the originally defined
/// cells. Unlabeled cells (group label not positive) are skipped.
pub fn smooth_orientations(
    map: &OrientationMap,
    symmetry: &CrystalSymmetry,
    filter: &dyn OrientationFilter,
) -> OrientationMap {
    let labels = map.group_labels();
    let cols = map.cols();

    let mut groups: HashMap<i64, GroupExtent> = HashMap::new();
    for (i, &label) in labels.iter().enumerate() {
        if label <= 0 {
            continue;
        }
        let (r, c) = (i / cols, i % cols);
        let entry = groups.entry(label).or_insert(GroupExtent {
            indices: Vec::new(),
            row_min: r,
            row_max: r,
            col_min: c,
            col_max: c,
        });
        entry.indices.push(i);
        entry.row_min = entry.row_min.min(r);
        entry.row_max = entry.row_max.max(r);
        entry.col_min = entry.col_min.min(c);
        entry.col_max = entry.col_max.max(c);
    }

    // Largest groups first.
    let mut ordered: Vec<(i64, GroupExtent)> = groups.into_iter().collect();
    ordered.sort_by(|a, b| b.1.indices.len().cmp(&a.1.indices.len()).then(a.0.cmp(&b.0)));

    let mut result = map.clone();
    for (label, extent) in ordered {
        if extent.indices.len() < MIN_GROUP_CELLS {
            log::info!(
                "skipping group {}: only {} cells",
                label,
                extent.indices.len()
            );
            continue;
        }
        let height = extent.row_max - extent.row_min + 1;
        let width = extent.col_max - extent.col_min + 1;
        if height < 2 || width < 2 {
            log::info!(
                "skipping group {}: bounding box {}x{} too thin",
                label,
                height,
                width
            );
            continue;
        }

        let reference = match extent
            .indices
            .iter()
            .find_map(|&i| map.rotations()[i])
        {
            Some(q) => q,
            None => {
                log::info!("skipping group {}: no defined orientation", label);
                continue;
            }
        };

        // Lift the group into the tangent space of the reference, snapping
        // each measurement to its closest symmetric variant first.
        let mut tangent: TangentGrid = Grid::new(height, width, None);
        let reference_inv = reference.inverse();
        for &i in &extent.indices {
            if let Some(q) = map.rotations()[i] {
                let snapped = symmetry.project_to_reference(&q, &reference);
                let v = (reference_inv * snapped).scaled_axis();
                let (r, c) = (i / cols - extent.row_min, i % cols - extent.col_min);
                *tangent.get_mut(r, c) = Some([v.x, v.y, v.z]);
            }
        }

        let smoothed = filter.smooth(&tangent);

        for &i in &extent.indices {
            if map.rotations()[i].is_none() {
                continue;
            }
            let (r, c) = (i / cols - extent.row_min, i % cols - extent.col_min);
            if let Some(v) = smoothed.get(r, c) {
                let q = reference
                    * UnitQuaternion::from_scaled_axis(Vector3::new(v[0], v[1], v[2]));
                result.rotations_mut()[i] = Some(q);
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Unit, Vector3};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn quat(x: f64, y: f64, z: f64, angle: f64) -> UnitQuaternion<f64> {
        UnitQuaternion::from_axis_angle(&Unit::new_normalize(Vector3::new(x, y, z)), angle)
    }

    fn noisy_map(
        rows: usize,
        cols: usize,
        base: UnitQuaternion<f64>,
        noise: f64,
        seed: u64,
    ) -> OrientationMap {
        let mut rng = StdRng::seed_from_u64(seed);
        let rotations = (0..rows * cols)
            .map(|_| {
                let axis = Vector3::new(
                    rng.random_range(-1.0..1.0),
                    rng.random_range(-1.0..1.0),
                    rng.random_range(-1.0..1.0),
                );
                let angle: f64 = rng.random_range(0.0..noise);
                Some(base * UnitQuaternion::from_axis_angle(&Unit::new_normalize(axis), angle))
            })
            .collect();
        OrientationMap::new(rows, cols, rotations)
    }

    fn mean_deviation(map: &OrientationMap, base: &UnitQuaternion<f64>) -> f64 {
        let angles: Vec<f64> = map
            .rotations()
            .iter()
            .flatten()
            .map(|q| q.angle_to(base))
            .collect();
        angles.iter().sum::<f64>() / angles.len() as f64
    }

    #[test]
    fn mean_filter_reduces_noise() {
        let base = quat(1.0, 2.0, 0.5, 0.7);
        let map = noisy_map(12, 12, base, 0.05, 42);
        let sym = CrystalSymmetry::triclinic();

        let before = mean_deviation(&map, &base);
        let smoothed = smooth_orientations(&map, &sym, &MeanFilter::default());
        let after = mean_deviation(&smoothed, &base);
        assert!(after < 0.5 * before, "before {} after {}", before, after);
    }

    #[test]
    fn median_filter_rejects_outlier() {
        let base = quat(0.0, 0.0, 1.0, 0.4);
        let mut rotations = vec![Some(base); 25];
        rotations[12] = Some(quat(1.0, 0.0, 0.0, 1.2)); // wild centre cell
        let map = OrientationMap::new(5, 5, rotations);
        let sym = CrystalSymmetry::triclinic();

        let smoothed = smooth_orientations(&map, &sym, &MedianFilter::default());
        let centre = smoothed.rotations()[12].unwrap();
        assert!(centre.angle_to(&base) < 1e-10);
    }

    #[test]
    fn spline_filter_reduces_noise_and_keeps_cells_defined() {
        let base = quat(0.3, -1.0, 0.4, 0.9);
        let map = noisy_map(10, 10, base, 0.04, 7);
        let sym = CrystalSymmetry::triclinic();

        let smoothed = smooth_orientations(&map, &sym, &SplineFilter::default());
        assert!(smoothed.rotations().iter().all(|q| q.is_some()));
        assert!(mean_deviation(&smoothed, &base) < mean_deviation(&map, &base));
    }

    #[test]
    fn groups_are_never_mixed() {
        // Left half group 1 near identity, right half group 2 far away.
        let a = UnitQuaternion::identity();
        let b = quat(0.0, 0.0, 1.0, 1.5);
        let (rows, cols) = (6, 8);
        let mut rotations = Vec::new();
        let mut grains = Vec::new();
        for _r in 0..rows {
            for c in 0..cols {
                match c < cols / 2 {
                    true => {
                        rotations.push(Some(a));
                        grains.push(1);
                    }
                    false => {
                        rotations.push(Some(b));
                        grains.push(2);
                    }
                }
            }
        }
        let map = OrientationMap::new(rows, cols, rotations).with_grain_id(grains);
        let sym = CrystalSymmetry::triclinic();

        let smoothed = smooth_orientations(&map, &sym, &MeanFilter::default());
        for (i, q) in smoothed.rotations().iter().enumerate() {
            let q = q.unwrap();
            match i % cols < cols / 2 {
                true => assert!(q.angle_to(&a) < 1e-10),
                false => assert!(q.angle_to(&b) < 1e-10),
            }
        }
    }

    #[test]
    fn tiny_and_unlabeled_groups_are_left_untouched() {
        let base = quat(1.0, 0.0, 0.0, 0.5);
        let odd = quat(0.0, 1.0, 0.0, 0.9);
        // 3 cells in group 1 (too small), 1 unlabeled cell.
        let rotations = vec![Some(base), Some(odd), Some(base), Some(odd)];
        let map = OrientationMap::new(2, 2, rotations.clone()).with_grain_id(vec![1, 1, 1, 0]);
        let sym = CrystalSymmetry::triclinic();

        let smoothed = smooth_orientations(&map, &sym, &MeanFilter::default());
        for (before, after) in rotations.iter().zip(smoothed.rotations().iter()) {
            assert!(after.unwrap().angle_to(&before.unwrap()) < 1e-14);
        }
    }

    #[test]
    fn undefined_cells_stay_undefined() {
        let base = quat(0.0, 1.0, 1.0, 0.3);
        let mut map = noisy_map(6, 6, base, 0.02, 11);
        map.rotations_mut()[8] = None;
        map.rotations_mut()[27] = None;
        let sym = CrystalSymmetry::triclinic();

        let smoothed = smooth_orientations(&map, &sym, &MeanFilter::default());
        assert!(smoothed.rotations()[8].is_none());
        assert!(smoothed.rotations()[27].is_none());
        assert_eq!(
            smoothed.rotations().iter().filter(|q| q.is_none()).count(),
            2
        );
    }

    #[test]
    fn symmetry_snapping_handles_equivalent_variants() {
        // Same physical orientation stored as different cubic variants;
        // without snapping the tangent-space average would be meaningless.
        let sym = CrystalSymmetry::cubic();
        let base = quat(0.4, 0.2, 1.0, 0.3);
        let variants = sym.rotations();

        let rotations: Vec<_> = (0..36)
            .map(|i| Some(base * variants[i % variants.len()]))
            .collect();
        let map = OrientationMap::new(6, 6, rotations);

        let smoothed = smooth_orientations(&map, &sym, &MeanFilter::default());
        for q in smoothed.rotations().iter().flatten() {
            assert!(sym.disorientation_angle(q, &base) < 1e-8);
        }
    }
}
