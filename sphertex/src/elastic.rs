/////////////////////////////////////////////////////////////////////////////////////////////
//
// Computes seismic wave velocities and polarizations from elastic stiffness tensors.
//
// Created on: 12 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Elastic wave velocities
//!
//! For a stiffness tensor `C` (Voigt 6x6, GPa) and a propagation direction
//! `n`, the Christoffel matrix `T_ik = C_ijkl n_j n_l` is symmetric
//! positive definite for any physically meaningful tensor; its
//! eigenvalues `lambda` give the phase velocities `v = sqrt(lambda / rho)`
//! of the three wave modes and its eigenvectors their polarizations. With
//! `C` in GPa and the density `rho` in g/cm^3, the speeds come out in km/s.
//!
//! Velocities are evaluated over many directions in parallel; the surface
//! helpers additionally wrap the results as triangulated functions sharing
//! a single triangulation of the evaluation grid.

use crate::direction::Direction;
use crate::errors::TriangulationError;
use crate::grid::SphereGrid;
use crate::triangulated::TriangulatedFn;
use crate::triangulation::SphericalTriangulation;
use crate::vector_field::SphericalVectorField;
use faer::{Mat, Side};
use rayon::prelude::*;
use sphertex_utils::{argsort, DEFAULT_GRID_RESOLUTION};
use std::sync::Arc;

// Voigt contraction of a symmetric index pair.
#[inline(always)]
fn voigt(i: usize, j: usize) -> usize {
    match (i, j) {
        (0, 0) => 0,
        (1, 1) => 1,
        (2, 2) => 2,
        (1, 2) | (2, 1) => 3,
        (0, 2) | (2, 0) => 4,
        _ => 5,
    }
}

/// An elastic stiffness tensor in Voigt notation (6x6, GPa), optionally
/// carrying the material density (g/cm^3).
#[derive(Debug, Clone)]
pub struct StiffnessTensor {
    voigt: Mat<f64>,
    density: Option<f64>,
}

impl StiffnessTensor {
    /// Wraps a 6x6 Voigt matrix. The matrix is stored as given; callers are
    /// expected to supply a symmetric one.
    pub fn from_voigt(voigt: Mat<f64>) -> Self {
        assert_eq!(voigt.nrows(), 6, "Voigt matrix must be 6x6");
        assert_eq!(voigt.ncols(), 6, "Voigt matrix must be 6x6");
        Self {
            voigt,
            density: None,
        }
    }

    /// Builds a cubic tensor from its three independent constants.
    pub fn cubic(c11: f64, c12: f64, c44: f64) -> Self {
        let voigt = Mat::from_fn(6, 6, |i, j| match (i, j) {
            (0, 0) | (1, 1) | (2, 2) => c11,
            (3, 3) | (4, 4) | (5, 5) => c44,
            (0, 1) | (0, 2) | (1, 0) | (1, 2) | (2, 0) | (2, 1) => c12,
            _ => 0.0,
        });
        Self::from_voigt(voigt)
    }

    /// Builds an isotropic tensor from the Lame parameters.
    pub fn isotropic(lambda: f64, mu: f64) -> Self {
        Self::cubic(lambda + 2.0 * mu, lambda, mu)
    }

    /// Attaches the material density (g/cm^3).
    pub fn with_density(mut self, density: f64) -> Self {
        assert!(density > 0.0, "density must be positive, got {}", density);
        self.density = Some(density);
        self
    }

    #[inline(always)]
    pub fn voigt(&self) -> &Mat<f64> {
        &self.voigt
    }

    #[inline(always)]
    pub fn density(&self) -> Option<f64> {
        self.density
    }

    /// The Christoffel matrix `T_ik = C_ijkl n_j n_l` for a propagation
    /// direction.
    pub fn christoffel(&self, direction: &Direction) -> Mat<f64> {
        let n = [direction.x(), direction.y(), direction.z()];
        Mat::from_fn(3, 3, |i, k| {
            let mut t = 0.0;
            for j in 0..3 {
                for l in 0..3 {
                    t += self.voigt[(voigt(i, j), voigt(k, l))] * n[j] * n[l];
                }
            }
            t
        })
    }
}

/// Phase velocities and polarizations of the three wave modes over a set of
/// propagation directions.
///
/// Velocities are in km/s and sorted per direction so that
/// `vp >= vs1 >= vs2`. Polarizations are undirected axes, canonicalized to
/// their non-negative-`z` antipodal representative. Directions where the
/// eigendecomposition fails carry NaN velocities.
#[derive(Debug, Clone)]
pub struct WaveVelocities {
    pub directions: Vec<Direction>,
    pub vp: Vec<f64>,
    pub vs1: Vec<f64>,
    pub vs2: Vec<f64>,
    pub pp: Vec<Direction>,
    pub ps1: Vec<Direction>,
    pub ps2: Vec<Direction>,
}

/// The three velocity surfaces and polarization fields wrapped over one
/// shared triangulation of the evaluation grid.
#[derive(Debug, Clone)]
pub struct VelocitySurfaces {
    pub vp: TriangulatedFn,
    pub vs1: TriangulatedFn,
    pub vs2: TriangulatedFn,
    pub pp: SphericalVectorField,
    pub ps1: SphericalVectorField,
    pub ps2: SphericalVectorField,
}

fn resolve_density(tensor: &StiffnessTensor, density: Option<f64>) -> f64 {
    match density.or(tensor.density()) {
        Some(rho) => rho,
        None => {
            log::warn!("no density given; defaulting to 1.0 g/cm^3, velocities are scaled");
            1.0
        }
    }
}

/// Computes the wave velocities of `tensor` along the given directions.
///
/// The density is taken from the `density` argument first, then from the
/// tensor, and finally defaults to `1.0` with a warning.
pub fn wave_velocities(
    tensor: &StiffnessTensor,
    directions: &[Direction],
    density: Option<f64>,
) -> WaveVelocities {
    let rho = resolve_density(tensor, density);

    let per_direction: Vec<([f64; 3], [Direction; 3])> = directions
        .par_iter()
        .map(|d| solve_direction(tensor, d, rho))
        .collect();

    let n = directions.len();
    let mut out = WaveVelocities {
        directions: directions.to_vec(),
        vp: Vec::with_capacity(n),
        vs1: Vec::with_capacity(n),
        vs2: Vec::with_capacity(n),
        pp: Vec::with_capacity(n),
        ps1: Vec::with_capacity(n),
        ps2: Vec::with_capacity(n),
    };
    for (speeds, polarizations) in per_direction {
        out.vp.push(speeds[0]);
        out.vs1.push(speeds[1]);
        out.vs2.push(speeds[2]);
        out.pp.push(polarizations[0]);
        out.ps1.push(polarizations[1]);
        out.ps2.push(polarizations[2]);
    }
    out
}

fn solve_direction(
    tensor: &StiffnessTensor,
    direction: &Direction,
    rho: f64,
) -> ([f64; 3], [Direction; 3]) {
    let t = tensor.christoffel(direction);

    let evd = match t.as_ref().self_adjoint_eigen(Side::Lower) {
        Ok(evd) => evd,
        Err(_) => {
            log::warn!("Christoffel eigendecomposition failed; marking direction undefined");
            return ([f64::NAN; 3], [*direction; 3]);
        }
    };

    let s = evd.S().column_vector();
    let u = evd.U();
    let eigenvalues = [s[0], s[1], s[2]];

    // Fastest mode first: vp >= vs1 >= vs2.
    let mut order = argsort(&eigenvalues);
    order.reverse();

    let mut speeds = [0.0; 3];
    let mut polarizations = [*direction; 3];
    for (mode, &col) in order.iter().enumerate() {
        speeds[mode] = (eigenvalues[col].max(0.0) / rho).sqrt();
        polarizations[mode] =
            Direction::new(u[(0, col)], u[(1, col)], u[(2, col)]).canonical_antipodal();
    }
    (speeds, polarizations)
}

/// Computes the velocity surfaces of `tensor` over an equispaced grid and
/// wraps them as triangulated functions.
///
/// `resolution` defaults to [`DEFAULT_GRID_RESOLUTION`] (about 10,000
/// directions). All six outputs share one triangulation.
pub fn velocity_surfaces(
    tensor: &StiffnessTensor,
    density: Option<f64>,
    resolution: Option<f64>,
) -> Result<VelocitySurfaces, TriangulationError> {
    let grid = SphereGrid::equispaced(resolution.unwrap_or(DEFAULT_GRID_RESOLUTION));
    let triangulation = Arc::new(SphericalTriangulation::new(grid.directions())?);

    let velocities = wave_velocities(tensor, triangulation.vertices(), density);

    let scalar = |values: &[f64]| {
        TriangulatedFn::from_shared(Arc::clone(&triangulation), values.to_vec())
    };
    let field = |axes: &[Direction]| {
        SphericalVectorField::from_shared(
            Arc::clone(&triangulation),
            axes.iter().map(|d| [d.x(), d.y(), d.z()]).collect(),
        )
    };

    Ok(VelocitySurfaces {
        vp: scalar(&velocities.vp),
        vs1: scalar(&velocities.vs1),
        vs2: scalar(&velocities.vs2),
        pp: field(&velocities.pp),
        ps1: field(&velocities.ps1),
        ps2: field(&velocities.ps2),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::generate_random_directions;

    // Lame parameters of a stiff isotropic solid, GPa.
    const LAMBDA: f64 = 60.0;
    const MU: f64 = 30.0;

    #[test]
    fn isotropic_velocities_match_closed_form() {
        let rho = 3.0;
        let tensor = StiffnessTensor::isotropic(LAMBDA, MU).with_density(rho);
        let dirs = generate_random_directions(40, Some(55));
        let result = wave_velocities(&tensor, &dirs, None);

        let vp_expected = ((LAMBDA + 2.0 * MU) / rho).sqrt();
        let vs_expected = (MU / rho).sqrt();
        for i in 0..dirs.len() {
            assert!((result.vp[i] - vp_expected).abs() < 1e-9);
            assert!((result.vs1[i] - vs_expected).abs() < 1e-9);
            assert!((result.vs2[i] - vs_expected).abs() < 1e-9);
        }
    }

    #[test]
    fn p_polarization_is_longitudinal_for_isotropic_media() {
        let tensor = StiffnessTensor::isotropic(LAMBDA, MU).with_density(2.5);
        let dirs = generate_random_directions(30, Some(56));
        let result = wave_velocities(&tensor, &dirs, None);

        for (d, p) in dirs.iter().zip(result.pp.iter()) {
            let aligned = d.dot(p).abs();
            assert!(aligned > 1.0 - 1e-9, "pp not parallel to n: {}", aligned);
            // Canonical antipodal representative.
            assert!(p.z() >= 0.0);
        }
    }

    #[test]
    fn modes_are_sorted_fast_to_slow() {
        // Olivine-like cubic approximation, GPa.
        let tensor = StiffnessTensor::cubic(320.0, 70.0, 77.0).with_density(3.3);
        let dirs = generate_random_directions(100, Some(57));
        let result = wave_velocities(&tensor, &dirs, None);

        for i in 0..dirs.len() {
            assert!(result.vp[i] >= result.vs1[i]);
            assert!(result.vs1[i] >= result.vs2[i]);
            assert!(result.vs2[i] > 0.0);
        }
    }

    #[test]
    fn density_fallback_chain() {
        let with = StiffnessTensor::cubic(100.0, 50.0, 40.0).with_density(4.0);
        let without = StiffnessTensor::cubic(100.0, 50.0, 40.0);
        let dirs = generate_random_directions(10, Some(58));

        // Argument overrides the tensor density.
        let a = wave_velocities(&with, &dirs, Some(1.0));
        // Missing everywhere falls back to 1.0.
        let b = wave_velocities(&without, &dirs, None);
        for i in 0..dirs.len() {
            assert!((a.vp[i] - b.vp[i]).abs() < 1e-12);
        }

        // Tensor density applies when no argument is given.
        let c = wave_velocities(&with, &dirs, None);
        for i in 0..dirs.len() {
            assert!((c.vp[i] - b.vp[i] / 2.0).abs() < 1e-9);
        }
    }

    #[test]
    fn christoffel_is_symmetric() {
        let tensor = StiffnessTensor::cubic(250.0, 90.0, 60.0);
        for d in generate_random_directions(20, Some(59)) {
            let t = tensor.christoffel(&d);
            for i in 0..3 {
                for j in 0..3 {
                    assert!((t[(i, j)] - t[(j, i)]).abs() < 1e-10);
                }
            }
        }
    }

    #[test]
    fn surfaces_share_one_triangulation() {
        let tensor = StiffnessTensor::cubic(200.0, 80.0, 50.0).with_density(3.0);
        // Coarse grid keeps the test quick.
        let surfaces =
            velocity_surfaces(&tensor, None, Some(15.0_f64.to_radians())).unwrap();

        assert!(Arc::ptr_eq(
            surfaces.vp.triangulation(),
            surfaces.vs2.triangulation()
        ));
        assert!(Arc::ptr_eq(
            surfaces.vp.triangulation(),
            surfaces.pp.triangulation()
        ));

        // The interpolated vp surface reproduces the direct computation at
        // grid vertices.
        let verts = surfaces.vp.triangulation().vertices().to_vec();
        let direct = wave_velocities(&tensor, &verts, None);
        let settings = crate::interp_config::InterpolationSettings::builder(
            crate::interp_config::InterpolationMethod::Nearest,
        )
        .build();
        let interp = surfaces.vp.evaluate(&verts[..25], &settings);
        for i in 0..25 {
            assert!((interp[i] - direct.vp[i]).abs() < 1e-12);
        }
    }
}
