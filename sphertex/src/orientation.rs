/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines crystal symmetry groups, 2-D grids, and gridded orientation maps.
//
// Created on: 12 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Orientations
//!
//! Crystal orientations are unit quaternions mapping the crystal frame to
//! the specimen frame. A [`CrystalSymmetry`] is the finite set of rotations
//! leaving the crystal indistinguishable; orientations that differ by a
//! symmetry element on the crystal side describe the same physical state.
//!
//! An [`OrientationMap`] is a row-major gridded measurement set: one
//! optional orientation per cell (the `None` cell is the
//! undefined-measurement sentinel) plus typed optional attribute columns
//! and a free-form `extra` map for anything else.

use nalgebra::{Unit, UnitQuaternion, Vector3};
use std::collections::HashMap;
use std::f64::consts::PI;

/// A finite group of crystal symmetry rotations.
#[derive(Debug, Clone)]
pub struct CrystalSymmetry {
    rotations: Vec<UnitQuaternion<f64>>,
}

impl CrystalSymmetry {
    /// Triclinic symmetry: the identity only.
    pub fn triclinic() -> Self {
        Self {
            rotations: vec![UnitQuaternion::identity()],
        }
    }

    /// Orthorhombic symmetry (point group 222): identity plus two-fold
    /// rotations about each coordinate axis.
    pub fn orthorhombic() -> Self {
        let mut rotations = vec![UnitQuaternion::identity()];
        for axis in [Vector3::x_axis(), Vector3::y_axis(), Vector3::z_axis()] {
            rotations.push(UnitQuaternion::from_axis_angle(&axis, PI));
        }
        Self { rotations }
    }

    /// Cubic rotational symmetry (point group 432), 24 elements.
    pub fn cubic() -> Self {
        let mut rotations = vec![UnitQuaternion::identity()];

        // Four-fold axes through the face centres.
        for axis in [Vector3::x_axis(), Vector3::y_axis(), Vector3::z_axis()] {
            for quarter_turns in 1..4 {
                rotations.push(UnitQuaternion::from_axis_angle(
                    &axis,
                    quarter_turns as f64 * PI / 2.0,
                ));
            }
        }

        // Three-fold axes through the body diagonals.
        for (x, y) in [(1.0, 1.0), (1.0, -1.0), (-1.0, 1.0), (-1.0, -1.0)] {
            let axis = Unit::new_normalize(Vector3::new(x, y, 1.0));
            for thirds in [1.0, 2.0] {
                rotations.push(UnitQuaternion::from_axis_angle(
                    &axis,
                    thirds * 2.0 * PI / 3.0,
                ));
            }
        }

        // Two-fold axes through the edge midpoints.
        for v in [
            Vector3::new(1.0, 1.0, 0.0),
            Vector3::new(1.0, -1.0, 0.0),
            Vector3::new(1.0, 0.0, 1.0),
            Vector3::new(1.0, 0.0, -1.0),
            Vector3::new(0.0, 1.0, 1.0),
            Vector3::new(0.0, 1.0, -1.0),
        ] {
            rotations.push(UnitQuaternion::from_axis_angle(&Unit::new_normalize(v), PI));
        }

        Self { rotations }
    }

    #[inline(always)]
    pub fn rotations(&self) -> &[UnitQuaternion<f64>] {
        &self.rotations
    }

    #[inline(always)]
    pub fn order(&self) -> usize {
        self.rotations.len()
    }

    /// Returns the symmetric variant of `q` closest to `reference`.
    pub fn project_to_reference(
        &self,
        q: &UnitQuaternion<f64>,
        reference: &UnitQuaternion<f64>,
    ) -> UnitQuaternion<f64> {
        let mut best = *q;
        let mut best_angle = f64::INFINITY;
        for s in &self.rotations {
            let candidate = q * s;
            let angle = candidate.angle_to(reference);
            if angle < best_angle {
                best_angle = angle;
                best = candidate;
            }
        }
        best
    }

    /// The smallest rotation angle between any symmetric variants of the
    /// two orientations.
    pub fn disorientation_angle(
        &self,
        a: &UnitQuaternion<f64>,
        b: &UnitQuaternion<f64>,
    ) -> f64 {
        self.rotations
            .iter()
            .map(|s| (a * s).angle_to(b))
            .fold(f64::INFINITY, f64::min)
    }
}

/// Row-major 2-D storage.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn new(rows: usize, cols: usize, fill: T) -> Self {
        Self {
            rows,
            cols,
            data: vec![fill; rows * cols],
        }
    }

    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Self {
        assert_eq!(data.len(), rows * cols, "grid data must fill rows x cols");
        Self { rows, cols, data }
    }

    #[inline(always)]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline(always)]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline(always)]
    pub fn get(&self, row: usize, col: usize) -> &T {
        &self.data[row * self.cols + col]
    }

    #[inline(always)]
    pub fn get_mut(&mut self, row: usize, col: usize) -> &mut T {
        &mut self.data[row * self.cols + col]
    }

    #[inline(always)]
    pub fn data(&self) -> &[T] {
        &self.data
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }
}

/// A 2-D grid of optional orientations; `None` marks an undefined cell.
pub type OrientationGrid = Grid<Option<UnitQuaternion<f64>>>;

/// A gridded orientation measurement set (rows x cols, row major).
///
/// The common attributes carry their own typed columns; anything else goes
/// through the free-form `extra` map keyed by name. All columns span the
/// full grid.
#[derive(Debug, Clone)]
pub struct OrientationMap {
    rows: usize,
    cols: usize,
    rotations: Vec<Option<UnitQuaternion<f64>>>,
    phase: Option<Vec<i64>>,
    grain_id: Option<Vec<i64>>,
    x: Option<Vec<f64>>,
    y: Option<Vec<f64>>,
    weights: Option<Vec<f64>>,
    extra: HashMap<String, Vec<f64>>,
}

impl OrientationMap {
    pub fn new(rows: usize, cols: usize, rotations: Vec<Option<UnitQuaternion<f64>>>) -> Self {
        assert_eq!(
            rotations.len(),
            rows * cols,
            "one (optional) rotation per grid cell required"
        );
        Self {
            rows,
            cols,
            rotations,
            phase: None,
            grain_id: None,
            x: None,
            y: None,
            weights: None,
            extra: HashMap::new(),
        }
    }

    pub fn with_phase(mut self, phase: Vec<i64>) -> Self {
        assert_eq!(phase.len(), self.len());
        self.phase = Some(phase);
        self
    }

    pub fn with_grain_id(mut self, grain_id: Vec<i64>) -> Self {
        assert_eq!(grain_id.len(), self.len());
        self.grain_id = Some(grain_id);
        self
    }

    pub fn with_positions(mut self, x: Vec<f64>, y: Vec<f64>) -> Self {
        assert_eq!(x.len(), self.len());
        assert_eq!(y.len(), self.len());
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn with_weights(mut self, weights: Vec<f64>) -> Self {
        assert_eq!(weights.len(), self.len());
        self.weights = Some(weights);
        self
    }

    pub fn with_extra(mut self, name: impl Into<String>, column: Vec<f64>) -> Self {
        assert_eq!(column.len(), self.len());
        self.extra.insert(name.into(), column);
        self
    }

    #[inline(always)]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[inline(always)]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline(always)]
    pub fn rotations(&self) -> &[Option<UnitQuaternion<f64>>] {
        &self.rotations
    }

    pub fn rotations_mut(&mut self) -> &mut [Option<UnitQuaternion<f64>>] {
        &mut self.rotations
    }

    #[inline(always)]
    pub fn phase(&self) -> Option<&[i64]> {
        self.phase.as_deref()
    }

    #[inline(always)]
    pub fn grain_id(&self) -> Option<&[i64]> {
        self.grain_id.as_deref()
    }

    #[inline(always)]
    pub fn x(&self) -> Option<&[f64]> {
        self.x.as_deref()
    }

    #[inline(always)]
    pub fn y(&self) -> Option<&[f64]> {
        self.y.as_deref()
    }

    #[inline(always)]
    pub fn weights(&self) -> Option<&[f64]> {
        self.weights.as_deref()
    }

    pub fn extra(&self, name: &str) -> Option<&[f64]> {
        self.extra.get(name).map(|v| v.as_slice())
    }

    /// The smoothing group label per cell: grain id when present, phase
    /// otherwise, a single common group failing both. Labels that are not
    /// positive mark unlabeled cells.
    pub fn group_labels(&self) -> Vec<i64> {
        match (&self.grain_id, &self.phase) {
            (Some(g), _) => g.clone(),
            (None, Some(p)) => p.clone(),
            (None, None) => vec![1; self.len()],
        }
    }

    #[inline(always)]
    fn cell(&self, row: usize, col: usize) -> Option<UnitQuaternion<f64>> {
        self.rotations[row * self.cols + col]
    }

    /// Orientation gradient along the column (x) direction: the
    /// rotation-vector difference between each cell and its right-hand
    /// neighbour. Undefined at the last column and wherever either cell is
    /// undefined.
    pub fn gradient_x(&self) -> Grid<Option<[f64; 3]>> {
        self.gradient(0, 1)
    }

    /// Orientation gradient along the row (y) direction, defined
    /// symmetrically to [`gradient_x`](Self::gradient_x) with the
    /// downward neighbour.
    pub fn gradient_y(&self) -> Grid<Option<[f64; 3]>> {
        self.gradient(1, 0)
    }

    fn gradient(&self, dr: usize, dc: usize) -> Grid<Option<[f64; 3]>> {
        let mut out = Grid::new(self.rows, self.cols, None);
        for r in 0..self.rows {
            for c in 0..self.cols {
                if r + dr >= self.rows || c + dc >= self.cols {
                    continue;
                }
                if let (Some(a), Some(b)) = (self.cell(r, c), self.cell(r + dr, c + dc)) {
                    let v = (a.inverse() * b).scaled_axis();
                    *out.get_mut(r, c) = Some([v.x, v.y, v.z]);
                }
            }
        }
        out
    }
}
