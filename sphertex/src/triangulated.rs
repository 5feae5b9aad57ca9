/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements scalar spherical functions sampled on a triangulation with local evaluation.
//
// Created on: 12 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Triangulated spherical functions
//!
//! A [`TriangulatedFn`] pairs a shared [`SphericalTriangulation`] with one
//! scalar value per vertex and evaluates anywhere on the sphere by local
//! interpolation. Per-query failures (no containing triangle, query too far
//! from the data) are reported as `f64::NAN` in the output, never as
//! errors.

use crate::direction::Direction;
use crate::errors::TriangulationError;
use crate::interp_config::{InterpolationMethod, InterpolationSettings};
use crate::triangulation::SphericalTriangulation;
use rayon::prelude::*;
use sphertex_utils::{
    DeLaValleePoussinKernel, InverseAngularKernel, SphericalKernel, DEFAULT_GRID_RESOLUTION,
};
use std::f64::consts::FRAC_PI_2;
use std::sync::Arc;

// Neighbourhood size for the kernel-weighted methods.
const KERNEL_NEIGHBOURS: usize = 4;

// Multiples of the local resolution bounding, respectively, how far a
// `Nearest` query may reach and how far any query may sit from the data
// when `cut_outside` is set.
const NEAREST_REACH: f64 = 2.0;
const CUT_OUTSIDE_REACH: f64 = 4.0;

/// A scalar function on the sphere represented by samples at the vertices
/// of a triangulation.
#[derive(Debug, Clone)]
pub struct TriangulatedFn {
    triangulation: Arc<SphericalTriangulation>,
    values: Vec<f64>,
}

impl TriangulatedFn {
    /// Triangulates the sample directions and attaches the values.
    ///
    /// Duplicate directions are removed keeping the first occurrence, and
    /// the value array is subset to match.
    pub fn from_samples(
        directions: &[Direction],
        values: &[f64],
    ) -> Result<Self, TriangulationError> {
        assert_eq!(
            directions.len(),
            values.len(),
            "one value per sample direction required"
        );
        let triangulation = Arc::new(SphericalTriangulation::new(directions)?);
        let values = triangulation
            .kept_indices()
            .iter()
            .map(|&i| values[i])
            .collect();
        Ok(Self {
            triangulation,
            values,
        })
    }

    /// Attaches per-vertex values to an existing shared triangulation.
    pub fn from_shared(triangulation: Arc<SphericalTriangulation>, values: Vec<f64>) -> Self {
        assert_eq!(
            triangulation.vertices().len(),
            values.len(),
            "one value per triangulation vertex required"
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
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Evaluates the function at the given directions. The output order
    /// matches the input order; undefined results are NaN.
    pub fn evaluate(
        &self,
        targets: &[Direction],
        settings: &InterpolationSettings,
    ) -> Vec<f64> {
        // The configured half-width is relative to the default grid
        // resolution; the effective kernel width follows the sampling
        // density of this particular function.
        let scale = self.triangulation.resolution() / DEFAULT_GRID_RESOLUTION;
        let half_width = (settings.kernel_half_width * scale).min(FRAC_PI_2);
        let spline_kernel = DeLaValleePoussinKernel::from_half_width(half_width);
        let inverse_kernel = InverseAngularKernel::default();

        targets
            .par_iter()
            .map(|target| self.evaluate_one(target, settings, &spline_kernel, &inverse_kernel))
            .collect()
    }

    fn evaluate_one(
        &self,
        target: &Direction,
        settings: &InterpolationSettings,
        spline_kernel: &DeLaValleePoussinKernel,
        inverse_kernel: &InverseAngularKernel,
    ) -> f64 {
        let resolution = self.triangulation.resolution();
        let nearest = match self.triangulation.grid().nearest(target) {
            Some(n) => n,
            None => return f64::NAN,
        };

        if settings.cut_outside && nearest.1 > CUT_OUTSIDE_REACH * resolution {
            return f64::NAN;
        }

        match settings.method {
            InterpolationMethod::Nearest => {
                match nearest.1 <= NEAREST_REACH * resolution {
                    true => self.values[nearest.0],
                    false => f64::NAN,
                }
            }
            InterpolationMethod::Linear => match self.triangulation.locate(target) {
                Some((t, bary)) => {
                    // Planar barycentric weights: exact at the planar
                    // projection of the query, off by the chord-to-arc
                    // factor at the spherical query itself.
                    let [i, j, k] = self.triangulation.triangles()[t];
                    bary[0] * self.values[i] + bary[1] * self.values[j] + bary[2] * self.values[k]
                }
                None => f64::NAN,
            },
            InterpolationMethod::Spline => self.weighted_average(target, spline_kernel),
            InterpolationMethod::InverseDistance => self.weighted_average(target, inverse_kernel),
        }
    }

    /// Kernel-weighted average over the four nearest samples, with the
    /// weights renormalized to sum to one.
    ///
    /// Weights are formed in the log domain and shifted by the largest
    /// before exponentiating, so a narrow kernel far from every sample
    /// still yields a defined average instead of underflowing.
    fn weighted_average(&self, target: &Direction, kernel: &dyn SphericalKernel) -> f64 {
        let neighbours = self
            .triangulation
            .grid()
            .k_nearest(target, KERNEL_NEIGHBOURS);
        if neighbours.is_empty() {
            return f64::NAN;
        }

        let logs: Vec<f64> = neighbours
            .iter()
            .map(|&(_, angle)| kernel.ln_eval(angle.cos()))
            .collect();
        let peak = logs.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        if !peak.is_finite() {
            return f64::NAN;
        }

        let mut total = 0.0;
        let mut acc = 0.0;
        for (&(id, _), log_w) in neighbours.iter().zip(logs.iter()) {
            let w = (log_w - peak).exp();
            total += w;
            acc += w * self.values[id];
        }
        // The peak weight is one, so the normalization cannot degenerate.
        acc / total
    }
}
