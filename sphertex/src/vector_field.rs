/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements vector-valued spherical functions sharing a scalar function's triangulation.
//
// Created on: 12 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::direction::Direction;
use crate::interp_config::InterpolationSettings;
use crate::triangulated::TriangulatedFn;
use crate::triangulation::SphericalTriangulation;
use std::sync::Arc;

/// A vector-valued function on the sphere, stored as one `[f64; 3]` per
/// vertex of a shared triangulation.
///
/// Built by composition rather than inheritance: a field produced alongside
/// scalar results (polarization vectors next to a velocity surface, say)
/// holds a clone of the same `Arc` so that the triangulation is computed
/// once and shared by all of them.
#[derive(Debug, Clone)]
pub struct SphericalVectorField {
    triangulation: Arc<SphericalTriangulation>,
    values: Vec<[f64; 3]>,
}

impl SphericalVectorField {
    /// Attaches per-vertex vectors to an existing shared triangulation.
    pub fn from_shared(
        triangulation: Arc<SphericalTriangulation>,
        values: Vec<[f64; 3]>,
    ) -> Self {
        assert_eq!(
            triangulation.vertices().len(),
            values.len(),
            "one vector per triangulation vertex required"
        );
        Self {
            triangulation,
            values,
        }
    }

    #[inline(always)]
    pub fn triangulation(&self) -> &Arc<SphericalTriangulation> {
        &self.triangulation
    }

    #[inline(always)]
    pub fn values(&self) -> &[[f64; 3]] {
        &self.values
    }

    /// Extracts one Cartesian component as a scalar function over the same
    /// (shared) triangulation.
    pub fn component(&self, axis: usize) -> TriangulatedFn {
        assert!(axis < 3, "component axis must be 0, 1, or 2");
        TriangulatedFn::from_shared(
            Arc::clone(&self.triangulation),
            self.values.iter().map(|v| v[axis]).collect(),
        )
    }

    /// Evaluates the field componentwise at the given directions. Undefined
    /// results are NaN in every component.
    pub fn evaluate(
        &self,
        targets: &[Direction],
        settings: &InterpolationSettings,
    ) -> Vec<[f64; 3]> {
        let x = self.component(0).evaluate(targets, settings);
        let y = self.component(1).evaluate(targets, settings);
        let z = self.component(2).evaluate(targets, settings);

        (0..targets.len()).map(|i| [x[i], y[i], z[i]]).collect()
    }
}
