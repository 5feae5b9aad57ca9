/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the spherical harmonic function engine: synthesis, differentiation, projection.
//
// Created on: 12 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Spherical harmonic functions
//!
//! A [`SphericalHarmonicFn`] stores a truncated harmonic expansion
//!
//! `f(theta, rho) = sum_{m=0..M} sum_{k=-m..m} c(m, k) Y(m, k)(theta, rho)`
//!
//! with complex coefficients in a fixed degree/order layout and bandwidth
//! `M` implied by the coefficient count `(M + 1)^2`.
//!
//! The basis is normalized so that `Y(0, 0) = 1` and
//! `(1 / 4 pi) * integral |Y(m, k)|^2 = 1` (Condon-Shortley phase). With
//! this convention the `(0, 0)` coefficient is the mean of the function
//! over the sphere, and a function is real exactly when
//! `c(m, -k) = (-1)^k conj(c(m, k))`.
//!
//! Associated Legendre factors are computed by stable three-term
//! recurrences; polar derivatives apply the exact order recurrence
//!
//! `d/dtheta P(m, k) = 1/2 * (sqrt((m-k)(m+k+1)) P(m, k+1)
//!                          - sqrt((m+k)(m-k+1)) P(m, k-1))`
//!
//! at synthesis time, which is pole-safe and exact to machine precision.

use crate::direction::Direction;
use crate::errors::HarmonicsError;
use num_complex::Complex64;
use rayon::prelude::*;
use std::f64::consts::PI;
use std::ops::{Add, Mul};

/// The spherical coordinate a derivative is taken with respect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    /// Polar angle `theta`, measured from the `+z` axis.
    Polar,
    /// Azimuth `rho`.
    Azimuth,
}

/// Flat coefficient index for degree `m` and order `k` (`-m <= k <= m`).
#[inline(always)]
pub(crate) fn coeff_index(m: usize, k: i64) -> usize {
    m * m + (k + m as i64) as usize
}

/// Flat index into the triangular Legendre table for degree `m`, order
/// `k >= 0`.
#[inline(always)]
fn tri_index(m: usize, k: usize) -> usize {
    m * (m + 1) / 2 + k
}

fn tri_len(bandwidth: usize) -> usize {
    (bandwidth + 1) * (bandwidth + 2) / 2
}

/// Fills `out` with the normalized associated Legendre values `P(m, k)` at
/// `cos(theta)`, for `m = 0..=bandwidth` and `k = 0..=m`.
///
/// Normalization: `P(0, 0) = 1`; Condon-Shortley phase on the diagonal.
/// Negative orders follow from `P(m, -k) = (-1)^k P(m, k)`.
fn legendre_table(cos_t: f64, sin_t: f64, bandwidth: usize, out: &mut [f64]) {
    debug_assert!(out.len() >= tri_len(bandwidth));

    out[0] = 1.0;
    for m in 1..=bandwidth {
        let mf = m as f64;
        let diag_prev = out[tri_index(m - 1, m - 1)];

        // Diagonal and first subdiagonal terms seed the degree recurrence.
        out[tri_index(m, m)] = -((2.0 * mf + 1.0) / (2.0 * mf)).sqrt() * sin_t * diag_prev;
        out[tri_index(m, m - 1)] = (2.0 * mf + 1.0).sqrt() * cos_t * diag_prev;

        if m >= 2 {
            for k in 0..=(m - 2) {
                let kf = k as f64;
                let alpha =
                    (((2.0 * mf - 1.0) * (2.0 * mf + 1.0)) / ((mf - kf) * (mf + kf))).sqrt();
                let beta = (((2.0 * mf + 1.0) * (mf + kf - 1.0) * (mf - kf - 1.0))
                    / ((mf - kf) * (mf + kf) * (2.0 * mf - 3.0)))
                    .sqrt();
                out[tri_index(m, k)] =
                    alpha * cos_t * out[tri_index(m - 1, k)] - beta * out[tri_index(m - 2, k)];
            }
        }
    }
}

/// Applies the exact theta-derivative order recurrence to a Legendre table,
/// producing the table of `d/dtheta P(m, k)` values. Composable: applying it
/// twice yields second derivatives.
fn legendre_derivative_table(table: &[f64], bandwidth: usize, out: &mut [f64]) {
    debug_assert!(out.len() >= tri_len(bandwidth));

    for m in 0..=bandwidth {
        let mf = m as f64;
        for k in 0..=m {
            let kf = k as f64;
            let up = match k + 1 <= m {
                true => table[tri_index(m, k + 1)],
                false => 0.0,
            };
            // P(m, -1) = -P(m, 1) by the Condon-Shortley sign rule.
            let down = match k {
                0 => match m >= 1 {
                    true => -table[tri_index(m, 1)],
                    false => 0.0,
                },
                _ => table[tri_index(m, k - 1)],
            };
            let b = ((mf - kf) * (mf + kf + 1.0)).sqrt();
            let a = ((mf + kf) * (mf - kf + 1.0)).sqrt();
            out[tri_index(m, k)] = 0.5 * (b * up - a * down);
        }
    }
}

/// Synthesizes the expansion at one point given its (possibly
/// differentiated) Legendre table and azimuth.
fn synthesize_point(
    coefficients: &[Complex64],
    bandwidth: usize,
    table: &[f64],
    rho: f64,
) -> Complex64 {
    let mm = bandwidth as i64;
    let mut acc = Complex64::new(0.0, 0.0);

    for k in -mm..=mm {
        let ka = k.unsigned_abs() as usize;
        // (-1)^|k| for negative orders (Condon-Shortley extension).
        let sign = match k < 0 && ka % 2 == 1 {
            true => -1.0,
            false => 1.0,
        };

        let mut s = Complex64::new(0.0, 0.0);
        for m in ka..=bandwidth {
            s += coefficients[coeff_index(m, k)] * (sign * table[tri_index(m, ka)]);
        }

        acc += s * Complex64::from_polar(1.0, k as f64 * rho);
    }

    acc
}

// Cache the per-point Legendre tables only while they stay within a modest
// memory budget; beyond it the plan recomputes them during execution.
const PLAN_TABLE_CACHE_BUDGET: usize = 4_000_000;

/// A precomputed synthesis plan for a fixed `(bandwidth, point count)` pair.
///
/// The plan extracts per-point angle data once and, when the memory budget
/// allows, caches the associated Legendre tables so that repeated
/// executions with different coefficient vectors (the function itself and
/// its derivative functions, say) avoid recomputing them. The plan's
/// buffers are a scoped resource: they are released when the plan is
/// dropped, on every exit path.
///
/// A plan must not be shared across concurrent executions with different
/// inputs; build one plan per batch.
pub struct SynthesisPlan {
    bandwidth: usize,
    cos_theta: Vec<f64>,
    sin_theta: Vec<f64>,
    rho: Vec<f64>,
    cached_tables: Option<Vec<f64>>,
}

impl SynthesisPlan {
    /// Prepares a plan for evaluating bandwidth-`bandwidth` expansions at
    /// the given directions.
    pub fn new(bandwidth: usize, directions: &[Direction]) -> Self {
        let n = directions.len();
        let mut cos_theta = Vec::with_capacity(n);
        let mut sin_theta = Vec::with_capacity(n);
        let mut rho = Vec::with_capacity(n);

        for d in directions {
            let theta = d.polar_angle();
            cos_theta.push(theta.cos());
            sin_theta.push(theta.sin());
            rho.push(d.azimuth());
        }

        let stride = tri_len(bandwidth);
        let cached_tables = match n * stride <= PLAN_TABLE_CACHE_BUDGET {
            true => {
                let mut tables = vec![0.0; n * stride];
                tables
                    .par_chunks_mut(stride)
                    .zip(cos_theta.par_iter().zip(sin_theta.par_iter()))
                    .for_each(|(chunk, (&ct, &st))| {
                        legendre_table(ct, st, bandwidth, chunk);
                    });
                Some(tables)
            }
            false => None,
        };

        Self {
            bandwidth,
            cos_theta,
            sin_theta,
            rho,
            cached_tables,
        }
    }

    #[inline(always)]
    pub fn bandwidth(&self) -> usize {
        self.bandwidth
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.rho.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.rho.is_empty()
    }

    /// Runs the synthesis for the given function, which must carry the
    /// plan's bandwidth.
    pub fn execute(&self, f: &SphericalHarmonicFn) -> Result<Vec<Complex64>, HarmonicsError> {
        if f.bandwidth() != self.bandwidth {
            return Err(HarmonicsError::InvalidBandwidth {
                coefficient_count: f.coefficients().len(),
            });
        }

        let stride = tri_len(self.bandwidth);
        let order = f.polar_order as usize;

        let values: Vec<Complex64> = (0..self.len())
            .into_par_iter()
            .map(|i| {
                let mut scratch = vec![0.0; stride];
                let mut table = match &self.cached_tables {
                    Some(tables) => tables[i * stride..(i + 1) * stride].to_vec(),
                    None => {
                        legendre_table(
                            self.cos_theta[i],
                            self.sin_theta[i],
                            self.bandwidth,
                            &mut scratch,
                        );
                        scratch.clone()
                    }
                };

                // Apply the order recurrence once per polar derivative.
                for _ in 0..order {
                    legendre_derivative_table(&table, self.bandwidth, &mut scratch);
                    std::mem::swap(&mut table, &mut scratch);
                }

                synthesize_point(f.coefficients(), self.bandwidth, &table, self.rho[i])
            })
            .collect();

        Ok(values)
    }
}

/// A function on the sphere stored as a truncated spherical harmonic
/// expansion.
///
/// Instances are immutable value objects: every transform (derivative,
/// arithmetic, projection) produces a new instance.
#[derive(Debug, Clone, PartialEq)]
pub struct SphericalHarmonicFn {
    coefficients: Vec<Complex64>,
    bandwidth: usize,
    // Number of exact polar-derivative applications baked into the basis.
    // Zero for every function built through the public constructors.
    polar_order: u8,
}

impl SphericalHarmonicFn {
    /// Wraps a coefficient sequence whose length must be a perfect square
    /// `(M + 1)^2`.
    pub fn from_coefficients(coefficients: Vec<Complex64>) -> Result<Self, HarmonicsError> {
        let n = coefficients.len();
        let m = (n as f64).sqrt().round() as usize;
        if m == 0 || m * m != n {
            return Err(HarmonicsError::InvalidBandwidth {
                coefficient_count: n,
            });
        }
        Ok(Self {
            coefficients,
            bandwidth: m - 1,
            polar_order: 0,
        })
    }

    /// The constant function with the given value.
    pub fn constant(value: f64) -> Self {
        Self {
            coefficients: vec![Complex64::new(value, 0.0)],
            bandwidth: 0,
            polar_order: 0,
        }
    }

    #[inline(always)]
    pub fn bandwidth(&self) -> usize {
        self.bandwidth
    }

    #[inline(always)]
    pub fn coefficients(&self) -> &[Complex64] {
        &self.coefficients
    }

    /// The coefficient of degree `m`, order `k`; zero outside the stored
    /// bandwidth.
    pub fn coefficient(&self, m: usize, k: i64) -> Complex64 {
        match m <= self.bandwidth && k.unsigned_abs() as usize <= m {
            true => self.coefficients[coeff_index(m, k)],
            false => Complex64::new(0.0, 0.0),
        }
    }

    /// Mean value of the function over the sphere: the `(0, 0)` coefficient.
    pub fn mean(&self) -> f64 {
        self.coefficients[0].re
    }

    /// L2 norm with respect to the normalized surface measure.
    pub fn l2_norm(&self) -> f64 {
        self.coefficients
            .iter()
            .map(|c| c.norm_sqr())
            .sum::<f64>()
            .sqrt()
    }

    /// Evaluates the function at the given directions by fast synthesis,
    /// returning the real part by convention. The output order matches the
    /// input order.
    pub fn evaluate(&self, directions: &[Direction]) -> Vec<f64> {
        let plan = SynthesisPlan::new(self.bandwidth, directions);
        // Bandwidths match by construction.
        let values = plan.execute(self).expect("plan bandwidth matches");
        values.into_iter().map(|v| v.re).collect()
    }

    pub(crate) fn evaluate_complex(&self, directions: &[Direction]) -> Vec<Complex64> {
        let plan = SynthesisPlan::new(self.bandwidth, directions);
        plan.execute(self).expect("plan bandwidth matches")
    }

    /// Differentiates analytically with respect to a spherical coordinate.
    ///
    /// - `Azimuth`: the coefficient `(m, k)` is multiplied by `i * k` -- a
    ///   pure phase rotation, exact.
    /// - `Polar`: the coefficients are kept and the exact three-term order
    ///   recurrence is applied to the Legendre factors at synthesis time,
    ///   so evaluation of the derivative is exact everywhere (including the
    ///   poles of the Legendre factors themselves; only the tangent-frame
    ///   interpretation of the result is pole-singular).
    ///
    /// Second derivatives are compositions of two first-derivative steps.
    pub fn derivative(&self, component: Component) -> Self {
        match component {
            Component::Azimuth => {
                let mut coefficients = self.coefficients.clone();
                for m in 0..=self.bandwidth {
                    for k in -(m as i64)..=(m as i64) {
                        coefficients[coeff_index(m, k)] *= Complex64::new(0.0, k as f64);
                    }
                }
                Self {
                    coefficients,
                    bandwidth: self.bandwidth,
                    polar_order: self.polar_order,
                }
            }
            Component::Polar => Self {
                coefficients: self.coefficients.clone(),
                bandwidth: self.bandwidth,
                polar_order: self.polar_order + 1,
            },
        }
    }

    /// Projects an arbitrary point-evaluable function onto the harmonic
    /// basis of the given bandwidth by numerical quadrature
    /// (Gauss-Legendre nodes in `cos(theta)` crossed with uniform azimuths).
    ///
    /// Exact for band-limited inputs of degree at most `bandwidth`; the
    /// least-squares truncation otherwise.
    pub fn project<F>(f: F, bandwidth: usize) -> Self
    where
        F: Fn(&Direction) -> f64 + Sync,
    {
        let coefficients =
            project_on_quadrature(bandwidth, &|d| Complex64::new(f(d), 0.0), 1);
        Self {
            coefficients,
            bandwidth,
            polar_order: 0,
        }
    }

    /// Elementwise product of two expansions, computed exactly by
    /// evaluating both factors on a quadrature grid of bandwidth
    /// `M1 + M2` and re-projecting.
    pub fn multiply(&self, other: &Self) -> Self {
        assert!(
            self.polar_order == 0 && other.polar_order == 0,
            "products of derivative expansions are not supported"
        );

        let bandwidth = self.bandwidth + other.bandwidth;
        let (directions, weights) = quadrature_grid(bandwidth, 1);

        let a = self.evaluate_complex(&directions);
        let b = other.evaluate_complex(&directions);
        let products: Vec<Complex64> = a.iter().zip(b.iter()).map(|(x, y)| x * y).collect();

        let coefficients = analyze_samples(bandwidth, &directions, &weights, &products);
        Self {
            coefficients,
            bandwidth,
            polar_order: 0,
        }
    }

    /// Returns a copy extended with zero coefficients up to `bandwidth`.
    pub fn pad_to_bandwidth(&self, bandwidth: usize) -> Self {
        assert!(bandwidth >= self.bandwidth);
        let mut coefficients = vec![Complex64::new(0.0, 0.0); (bandwidth + 1) * (bandwidth + 1)];
        for m in 0..=self.bandwidth {
            for k in -(m as i64)..=(m as i64) {
                coefficients[coeff_index(m, k)] = self.coefficients[coeff_index(m, k)];
            }
        }
        Self {
            coefficients,
            bandwidth,
            polar_order: self.polar_order,
        }
    }
}

impl Add for &SphericalHarmonicFn {
    type Output = SphericalHarmonicFn;

    fn add(self, rhs: Self) -> SphericalHarmonicFn {
        assert!(
            self.polar_order == rhs.polar_order,
            "cannot add expansions with different derivative orders"
        );

        let bandwidth = self.bandwidth.max(rhs.bandwidth);
        let a = self.pad_to_bandwidth(bandwidth);
        let b = rhs.pad_to_bandwidth(bandwidth);

        let coefficients = a
            .coefficients
            .iter()
            .zip(b.coefficients.iter())
            .map(|(x, y)| x + y)
            .collect();

        SphericalHarmonicFn {
            coefficients,
            bandwidth,
            polar_order: self.polar_order,
        }
    }
}

impl Mul<f64> for &SphericalHarmonicFn {
    type Output = SphericalHarmonicFn;

    fn mul(self, scalar: f64) -> SphericalHarmonicFn {
        SphericalHarmonicFn {
            coefficients: self.coefficients.iter().map(|&c| c * scalar).collect(),
            bandwidth: self.bandwidth,
            polar_order: self.polar_order,
        }
    }
}

/// Builds the quadrature grid for analysis at the given bandwidth:
/// Gauss-Legendre polar nodes crossed with uniform azimuths. `oversample`
/// multiplies both node counts for non-band-limited integrands.
fn quadrature_grid(bandwidth: usize, oversample: usize) -> (Vec<Direction>, Vec<f64>) {
    let n_theta = (bandwidth + 1) * oversample.max(1);
    let n_rho = (2 * bandwidth + 1) * oversample.max(1);

    let (nodes, gl_weights) = sphertex_utils::gauss_legendre(n_theta);
    let d_rho = 2.0 * PI / n_rho as f64;

    let mut directions = Vec::with_capacity(n_theta * n_rho);
    let mut weights = Vec::with_capacity(n_theta * n_rho);

    for (j, &t) in nodes.iter().enumerate() {
        let theta = t.clamp(-1.0, 1.0).acos();
        // Combined weight for the normalized measure (1 / 4 pi) dt drho.
        let w = gl_weights[j] * d_rho / (4.0 * PI);
        for p in 0..n_rho {
            let rho = p as f64 * d_rho;
            directions.push(Direction::from_polar(theta, rho));
            weights.push(w);
        }
    }

    (directions, weights)
}

/// Computes harmonic coefficients from weighted samples on an analysis grid.
fn analyze_samples(
    bandwidth: usize,
    directions: &[Direction],
    weights: &[f64],
    samples: &[Complex64],
) -> Vec<Complex64> {
    let stride = tri_len(bandwidth);
    let n_coeffs = (bandwidth + 1) * (bandwidth + 1);

    directions
        .par_iter()
        .enumerate()
        .map(|(i, d)| {
            let theta = d.polar_angle();
            let rho = d.azimuth();
            let mut table = vec![0.0; stride];
            legendre_table(theta.cos(), theta.sin(), bandwidth, &mut table);

            let weighted = samples[i] * weights[i];
            let mut contribution = vec![Complex64::new(0.0, 0.0); n_coeffs];
            for m in 0..=bandwidth {
                for k in -(m as i64)..=(m as i64) {
                    let ka = k.unsigned_abs() as usize;
                    let sign = match k < 0 && ka % 2 == 1 {
                        true => -1.0,
                        false => 1.0,
                    };
                    // conj(Y(m, k)) = P(m, k) e^{-i k rho}
                    let basis = Complex64::from_polar(1.0, -(k as f64) * rho)
                        * (sign * table[tri_index(m, ka)]);
                    contribution[coeff_index(m, k)] = weighted * basis;
                }
            }
            contribution
        })
        .reduce(
            || vec![Complex64::new(0.0, 0.0); n_coeffs],
            |mut acc, item| {
                for (a, b) in acc.iter_mut().zip(item.iter()) {
                    *a += b;
                }
                acc
            },
        )
}

pub(crate) fn project_on_quadrature(
    bandwidth: usize,
    f: &(dyn Fn(&Direction) -> Complex64 + Sync),
    oversample: usize,
) -> Vec<Complex64> {
    let (directions, weights) = quadrature_grid(bandwidth, oversample);
    let samples: Vec<Complex64> = directions.par_iter().map(f).collect();
    analyze_samples(bandwidth, &directions, &weights, &samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::generate_random_directions;

    fn shf_from(m_max: usize, f: impl Fn(usize, i64) -> Complex64) -> SphericalHarmonicFn {
        let mut coeffs = vec![Complex64::new(0.0, 0.0); (m_max + 1) * (m_max + 1)];
        for m in 0..=m_max {
            for k in -(m as i64)..=(m as i64) {
                coeffs[coeff_index(m, k)] = f(m, k);
            }
        }
        SphericalHarmonicFn::from_coefficients(coeffs).unwrap()
    }

    #[test]
    fn rejects_non_square_coefficient_count() {
        for n in [2usize, 3, 5, 8, 15] {
            let err = SphericalHarmonicFn::from_coefficients(vec![Complex64::new(1.0, 0.0); n])
                .unwrap_err();
            assert_eq!(
                err,
                HarmonicsError::InvalidBandwidth {
                    coefficient_count: n
                }
            );
        }
    }

    #[test]
    fn accepts_square_counts_and_reports_bandwidth() {
        for (n, m) in [(1usize, 0usize), (4, 1), (9, 2), (25, 4), (121, 10)] {
            let f = SphericalHarmonicFn::from_coefficients(vec![Complex64::new(0.0, 0.0); n])
                .unwrap();
            assert_eq!(f.bandwidth(), m);
        }
    }

    #[test]
    fn lone_zeroth_coefficient_evaluates_to_constant() {
        // Bandwidth 4 with everything zero except (m = 0, k = 0).
        let mut coeffs = vec![Complex64::new(0.0, 0.0); 25];
        coeffs[0] = Complex64::new(2.5, -0.7);
        let f = SphericalHarmonicFn::from_coefficients(coeffs).unwrap();

        let dirs = generate_random_directions(64, Some(21));
        for v in f.evaluate(&dirs) {
            assert!((v - 2.5).abs() < 1e-12);
        }
        assert!((f.mean() - 2.5).abs() < 1e-15);
    }

    #[test]
    fn projection_recovers_band_limited_function() {
        // f(x, y, z) = 1 + 3 z + x y is band-limited with degree 2.
        let f = |d: &Direction| 1.0 + 3.0 * d.z() + d.x() * d.y();
        let shf = SphericalHarmonicFn::project(f, 4);

        let dirs = generate_random_directions(100, Some(33));
        let values = shf.evaluate(&dirs);
        for (d, v) in dirs.iter().zip(values.iter()) {
            assert!((v - f(d)).abs() < 1e-10, "mismatch {} vs {}", v, f(d));
        }
    }

    #[test]
    fn projection_error_tightens_with_bandwidth() {
        let f = |d: &Direction| (d.z()).exp();
        let dirs = generate_random_directions(50, Some(8));

        let mut previous = f64::INFINITY;
        for m in [2usize, 5, 10, 16] {
            let shf = SphericalHarmonicFn::project(f, m);
            let max_err = dirs
                .iter()
                .zip(shf.evaluate(&dirs).iter())
                .map(|(d, v)| (v - f(d)).abs())
                .fold(0.0, f64::max);
            assert!(max_err < previous, "m={} err={}", m, max_err);
            previous = max_err;
        }
        assert!(previous < 1e-8);
    }

    #[test]
    fn azimuth_derivative_of_zonal_function_is_zero() {
        // A zonal function has only k = 0 coefficients.
        let f = shf_from(6, |_, k| match k {
            0 => Complex64::new(1.3, 0.0),
            _ => Complex64::new(0.0, 0.0),
        });
        let df = f.derivative(Component::Azimuth);
        assert!(df.coefficients().iter().all(|c| c.norm() == 0.0));

        let dirs = generate_random_directions(30, Some(5));
        for v in df.evaluate(&dirs) {
            assert!(v.abs() < 1e-14);
        }
    }

    #[test]
    fn polar_derivative_matches_finite_differences() {
        let f = SphericalHarmonicFn::project(|d: &Direction| (d.z()).exp() + d.x() * d.y(), 12);
        let df = f.derivative(Component::Polar);

        let h = 1e-5;
        for &(theta, rho) in &[(0.8, 1.1), (1.4, 3.0), (2.3, 5.5)] {
            let plus = Direction::from_polar(theta + h, rho);
            let minus = Direction::from_polar(theta - h, rho);
            let fd = (f.evaluate(&[plus])[0] - f.evaluate(&[minus])[0]) / (2.0 * h);
            let analytic = df.evaluate(&[Direction::from_polar(theta, rho)])[0];
            assert!(
                (fd - analytic).abs() < 1e-6,
                "theta={} fd={} analytic={}",
                theta,
                fd,
                analytic
            );
        }
    }

    #[test]
    fn azimuth_derivative_matches_finite_differences() {
        let f = SphericalHarmonicFn::project(|d: &Direction| d.x() * d.z() + 0.5 * d.y(), 6);
        let df = f.derivative(Component::Azimuth);

        let h = 1e-5;
        for &(theta, rho) in &[(0.6, 0.3), (1.9, 2.2)] {
            let plus = Direction::from_polar(theta, rho + h);
            let minus = Direction::from_polar(theta, rho - h);
            let fd = (f.evaluate(&[plus])[0] - f.evaluate(&[minus])[0]) / (2.0 * h);
            let analytic = df.evaluate(&[Direction::from_polar(theta, rho)])[0];
            assert!((fd - analytic).abs() < 1e-7);
        }
    }

    #[test]
    fn mixed_second_derivatives_commute() {
        let f = SphericalHarmonicFn::project(|d: &Direction| d.x() * d.y() * d.z(), 8);
        let d_tr = f.derivative(Component::Polar).derivative(Component::Azimuth);
        let d_rt = f.derivative(Component::Azimuth).derivative(Component::Polar);

        let dirs = generate_random_directions(25, Some(77));
        let a = d_tr.evaluate(&dirs);
        let b = d_rt.evaluate(&dirs);
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-10);
        }
    }

    #[test]
    fn arithmetic_is_elementwise() {
        let f = SphericalHarmonicFn::project(|d: &Direction| d.z(), 2);
        let g = SphericalHarmonicFn::project(|d: &Direction| d.x(), 3);

        let sum = &f + &g;
        let scaled = &f * 2.0;
        assert_eq!(sum.bandwidth(), 3);

        let dirs = generate_random_directions(40, Some(2));
        let sv = sum.evaluate(&dirs);
        let cv = scaled.evaluate(&dirs);
        for (i, d) in dirs.iter().enumerate() {
            assert!((sv[i] - (d.z() + d.x())).abs() < 1e-10);
            assert!((cv[i] - 2.0 * d.z()).abs() < 1e-10);
        }
    }

    #[test]
    fn product_is_exact_for_band_limited_factors() {
        let f = SphericalHarmonicFn::project(|d: &Direction| 1.0 + d.z(), 1);
        let g = SphericalHarmonicFn::project(|d: &Direction| d.x(), 1);
        let fg = f.multiply(&g);
        assert_eq!(fg.bandwidth(), 2);

        let dirs = generate_random_directions(60, Some(91));
        let values = fg.evaluate(&dirs);
        for (d, v) in dirs.iter().zip(values.iter()) {
            assert!((v - (1.0 + d.z()) * d.x()).abs() < 1e-10);
        }
    }

    #[test]
    fn plan_is_reusable_across_matching_functions() {
        let f = SphericalHarmonicFn::project(|d: &Direction| d.z() * d.z(), 4);
        let g = SphericalHarmonicFn::project(|d: &Direction| d.x(), 4);

        let dirs = generate_random_directions(20, Some(13));
        let plan = SynthesisPlan::new(4, &dirs);

        let fv = plan.execute(&f).unwrap();
        let gv = plan.execute(&g).unwrap();
        for (i, d) in dirs.iter().enumerate() {
            assert!((fv[i].re - d.z() * d.z()).abs() < 1e-10);
            assert!((gv[i].re - d.x()).abs() < 1e-10);
        }
    }

    #[test]
    fn plan_rejects_mismatched_bandwidth() {
        let f = SphericalHarmonicFn::constant(1.0);
        let plan = SynthesisPlan::new(3, &generate_random_directions(5, Some(1)));
        assert!(plan.execute(&f).is_err());
    }

    #[test]
    fn real_function_coefficients_obey_conjugate_symmetry() {
        let shf = SphericalHarmonicFn::project(|d: &Direction| d.x() * d.y() + d.z(), 5);
        for m in 0..=5usize {
            for k in 1..=(m as i64) {
                let sign = match k % 2 == 0 {
                    true => 1.0,
                    false => -1.0,
                };
                let a = shf.coefficient(m, k);
                let b = shf.coefficient(m, -k);
                assert!((b - a.conj() * sign).norm() < 1e-12, "m={} k={}", m, k);
            }
        }
    }
}
