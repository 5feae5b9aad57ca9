/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements multi-seed local extremum search on spherical harmonic functions.
//
// Created on: 12 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Extremum search
//!
//! Runs a damped Newton-type descent from a set of seed directions
//! simultaneously, using the exact analytic gradient and Hessian of the
//! expansion in the local `(e_theta, e_rho)` tangent frame. The step is a
//! Levenberg-damped quadratic model step with Armijo backtracking, and the
//! descent direction alternates with a Polak-Ribiere conjugate correction
//! on odd iterations.
//!
//! Seeds too close to a pole are dropped up front: the tangent frame is
//! singular there. Exhausting the iteration budget is not an error; the
//! best points found so far are returned with `converged = false`.

use crate::direction::Direction;
use crate::harmonics::{Component, SphericalHarmonicFn, SynthesisPlan};
use sphertex_utils::POLE_EXCLUSION_ANGLE;
use std::f64::consts::PI;

/// Whether to search for minima or maxima.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtremumMode {
    Minimum,
    Maximum,
}

/// A convenience builder for constructing an [`ExtremumOptions`] instance.
///
/// The builder should be called via the [`ExtremumOptions::builder`] method.
///
/// See [`ExtremumOptions`] for details on each field.
#[derive(Debug, Clone, Copy)]
pub struct ExtremumOptionsBuilder {
    mode: ExtremumMode,
    lambda: f64,
    eps: f64,
    tau: f64,
    mu: f64,
    tau_ls: f64,
    kmax: usize,
    kmax_ls: usize,
    dedup_angle: f64,
}

impl ExtremumOptionsBuilder {
    fn new(mode: ExtremumMode) -> Self {
        Self {
            mode,
            lambda: 1e-2,
            eps: 1e-10,
            tau: 1e-5,
            mu: 1e-4,
            tau_ls: 0.5,
            kmax: 100,
            kmax_ls: 16,
            dedup_angle: 1e-4,
        }
    }

    /// Sets the Levenberg damping added to the model curvature.
    pub fn lambda(mut self, lambda: f64) -> Self {
        self.lambda = lambda;
        self
    }

    /// Sets the curvature floor protecting the step length division.
    pub fn eps(mut self, eps: f64) -> Self {
        self.eps = eps;
        self
    }

    /// Sets the gradient-norm convergence tolerance (radians^-1 units).
    pub fn tau(mut self, tau: f64) -> Self {
        self.tau = tau;
        self
    }

    /// Sets the Armijo sufficient-decrease constant.
    pub fn mu(mut self, mu: f64) -> Self {
        self.mu = mu;
        self
    }

    /// Sets the backtracking contraction factor.
    pub fn tau_ls(mut self, tau_ls: f64) -> Self {
        self.tau_ls = tau_ls;
        self
    }

    /// Sets the outer iteration budget.
    pub fn kmax(mut self, kmax: usize) -> Self {
        self.kmax = kmax;
        self
    }

    /// Sets the backtracking iteration budget.
    pub fn kmax_ls(mut self, kmax_ls: usize) -> Self {
        self.kmax_ls = kmax_ls;
        self
    }

    /// Sets the angular tolerance below which converged points coalesce.
    pub fn dedup_angle(mut self, dedup_angle: f64) -> Self {
        self.dedup_angle = dedup_angle;
        self
    }

    /// Builds and returns an instance of [`ExtremumOptions`] from the values
    /// defined in the builder.
    pub fn build(self) -> ExtremumOptions {
        ExtremumOptions {
            mode: self.mode,
            lambda: self.lambda,
            eps: self.eps,
            tau: self.tau,
            mu: self.mu,
            tau_ls: self.tau_ls,
            kmax: self.kmax,
            kmax_ls: self.kmax_ls,
            dedup_angle: self.dedup_angle,
        }
    }
}

/// Tuning constants for [`find_extremum`]. The defaults are a reasonable
/// starting point for expansions of moderate bandwidth; every constant is
/// adjustable through the builder.
#[derive(Debug, Clone, Copy)]
pub struct ExtremumOptions {
    /// Minimum or maximum search.
    pub mode: ExtremumMode,

    /// Levenberg damping added to the quadratic model curvature.
    pub lambda: f64,

    /// Floor applied to curvature denominators and conjugate ratios.
    pub eps: f64,

    /// Convergence tolerance on the tangent gradient norm.
    pub tau: f64,

    /// Armijo sufficient-decrease constant.
    pub mu: f64,

    /// Backtracking contraction factor in `(0, 1)`.
    pub tau_ls: f64,

    /// Outer iteration budget.
    pub kmax: usize,

    /// Backtracking (line search) iteration budget.
    pub kmax_ls: usize,

    /// Converged points closer than this angle are merged.
    pub dedup_angle: f64,
}

impl ExtremumOptions {
    /// Returns a new [`ExtremumOptionsBuilder`] for the given search mode.
    pub fn builder(mode: ExtremumMode) -> ExtremumOptionsBuilder {
        ExtremumOptionsBuilder::new(mode)
    }
}

impl Default for ExtremumOptions {
    fn default() -> Self {
        Self::builder(ExtremumMode::Minimum).build()
    }
}

/// The outcome of an extremum search.
#[derive(Debug, Clone)]
pub struct ExtremumResult {
    /// Distinct local extremum candidates, deduplicated.
    pub directions: Vec<Direction>,

    /// Function values at `directions` (of the original function, regardless
    /// of search mode).
    pub values: Vec<f64>,

    /// Whether every surviving point met the gradient tolerance within the
    /// iteration budget.
    pub converged: bool,

    /// Outer iterations consumed.
    pub iterations: usize,
}

// Arc-length cap on a single step; keeps the quadratic model honest.
const MAX_STEP: f64 = 0.5;

struct Derivatives {
    obj: SphericalHarmonicFn,
    d_t: SphericalHarmonicFn,
    d_r: SphericalHarmonicFn,
    d_tt: SphericalHarmonicFn,
    d_tr: SphericalHarmonicFn,
    d_rr: SphericalHarmonicFn,
}

impl Derivatives {
    fn new(f: &SphericalHarmonicFn, mode: ExtremumMode) -> Self {
        let sign = match mode {
            ExtremumMode::Minimum => 1.0,
            ExtremumMode::Maximum => -1.0,
        };
        let obj = f * sign;
        let d_t = obj.derivative(Component::Polar);
        let d_r = obj.derivative(Component::Azimuth);
        let d_tt = d_t.derivative(Component::Polar);
        let d_tr = d_t.derivative(Component::Azimuth);
        let d_rr = d_r.derivative(Component::Azimuth);
        Self {
            obj,
            d_t,
            d_r,
            d_tt,
            d_tr,
            d_rr,
        }
    }

    /// Evaluates objective, tangent gradient, and tangent Hessian at every
    /// point through one shared synthesis plan.
    fn evaluate(&self, points: &[Direction]) -> (Vec<f64>, Vec<[f64; 2]>, Vec<[f64; 3]>) {
        let plan = SynthesisPlan::new(self.obj.bandwidth(), points);
        let run = |f: &SphericalHarmonicFn| -> Vec<f64> {
            plan.execute(f)
                .expect("derivative bandwidths match")
                .into_iter()
                .map(|v| v.re)
                .collect()
        };

        let f0 = run(&self.obj);
        let ft = run(&self.d_t);
        let fr = run(&self.d_r);
        let ftt = run(&self.d_tt);
        let ftr = run(&self.d_tr);
        let frr = run(&self.d_rr);

        let mut grads = Vec::with_capacity(points.len());
        let mut hessians = Vec::with_capacity(points.len());
        for (i, p) in points.iter().enumerate() {
            let theta = p.polar_angle();
            let st = theta.sin().max(POLE_EXCLUSION_ANGLE.sin());
            let ct = theta.cos();

            // Riemannian gradient/Hessian components in the orthonormal
            // (e_theta, e_rho) frame, including the metric terms.
            let g = [ft[i], fr[i] / st];
            let h_tt = ftt[i];
            let h_tr = ftr[i] / st - (ct / (st * st)) * fr[i];
            let h_rr = frr[i] / (st * st) + (ct / st) * ft[i];

            grads.push(g);
            hessians.push([h_tt, h_tr, h_rr]);
        }

        (f0, grads, hessians)
    }

    fn objective_at(&self, point: &Direction) -> f64 {
        self.obj.evaluate(std::slice::from_ref(point))[0]
    }
}

fn away_from_poles(d: &Direction) -> Direction {
    let theta = d.polar_angle();
    let clamped = theta.clamp(POLE_EXCLUSION_ANGLE, PI - POLE_EXCLUSION_ANGLE);
    match clamped == theta {
        true => *d,
        false => Direction::from_polar(clamped, d.azimuth()),
    }
}

/// Searches for local extrema of `f`, descending from every seed direction
/// simultaneously.
///
/// Seeds within [`POLE_EXCLUSION_ANGLE`] of a pole are dropped. The
/// remaining points are iterated until the mean tangent gradient norm
/// falls below `options.tau` or the budget `options.kmax` is exhausted; the
/// latter is reported through `converged = false` on the result rather
/// than as an error. Points that coalesce within `options.dedup_angle` are
/// merged at the end of every iteration, shrinking the working set.
pub fn find_extremum(
    f: &SphericalHarmonicFn,
    seeds: &[Direction],
    options: &ExtremumOptions,
) -> ExtremumResult {
    let derivs = Derivatives::new(f, options.mode);

    let mut points: Vec<Direction> = seeds
        .iter()
        .filter(|d| {
            let theta = d.polar_angle();
            theta > POLE_EXCLUSION_ANGLE && theta < PI - POLE_EXCLUSION_ANGLE
        })
        .copied()
        .collect();

    if points.is_empty() {
        return ExtremumResult {
            directions: Vec::new(),
            values: Vec::new(),
            converged: true,
            iterations: 0,
        };
    }

    let mut prev_grad: Vec<[f64; 2]> = vec![[0.0; 2]; points.len()];
    let mut prev_dir: Vec<[f64; 2]> = vec![[0.0; 2]; points.len()];
    let mut converged = false;
    let mut iterations = 0;

    for k in 0..options.kmax {
        iterations = k + 1;
        let (f0, grads, hessians) = derivs.evaluate(&points);

        let mean_norm = grads
            .iter()
            .map(|g| (g[0] * g[0] + g[1] * g[1]).sqrt())
            .sum::<f64>()
            / points.len() as f64;
        if mean_norm < options.tau {
            converged = true;
            break;
        }

        for i in 0..points.len() {
            let g = grads[i];
            let gnorm2 = g[0] * g[0] + g[1] * g[1];
            if gnorm2.sqrt() < options.tau {
                continue;
            }

            // Steepest descent on even iterations; Polak-Ribiere conjugate
            // correction on odd ones.
            let mut d = [-g[0], -g[1]];
            if k % 2 == 1 {
                let pg = prev_grad[i];
                let betan = g[0] * (g[0] - pg[0]) + g[1] * (g[1] - pg[1]);
                let betad = (pg[0] * pg[0] + pg[1] * pg[1]).max(options.eps);
                let beta = (betan / betad).max(0.0);
                d[0] += beta * prev_dir[i][0];
                d[1] += beta * prev_dir[i][1];
            }

            let slope = g[0] * d[0] + g[1] * d[1];
            if slope >= 0.0 {
                // Conjugate correction overshot; fall back to the gradient.
                d = [-g[0], -g[1]];
            }
            let slope = g[0] * d[0] + g[1] * d[1];

            let h = hessians[i];
            let curvature = h[0] * d[0] * d[0] + 2.0 * h[1] * d[0] * d[1] + h[2] * d[1] * d[1];
            let dnorm2 = d[0] * d[0] + d[1] * d[1];
            let denom = (curvature + options.lambda * dnorm2).max(options.eps);
            let mut step = (-slope / denom).min(MAX_STEP / dnorm2.sqrt().max(options.eps));

            // Armijo backtracking along the great circle through d.
            let (e_theta, e_rho) = points[i].tangent_frame();
            let mut accepted = None;
            for _ in 0..options.kmax_ls {
                let v = [
                    step * (d[0] * e_theta[0] + d[1] * e_rho[0]),
                    step * (d[0] * e_theta[1] + d[1] * e_rho[1]),
                    step * (d[0] * e_theta[2] + d[1] * e_rho[2]),
                ];
                let trial = away_from_poles(&points[i].exp_map(v));
                let f_trial = derivs.objective_at(&trial);
                if f_trial <= f0[i] + options.mu * step * slope {
                    accepted = Some(trial);
                    break;
                }
                step *= options.tau_ls;
            }

            if let Some(trial) = accepted {
                points[i] = trial;
            }
            prev_grad[i] = g;
            prev_dir[i] = d;
        }

        // Merge points that have coalesced; the working set shrinks and
        // survivors keep their descent history.
        let mut keep: Vec<usize> = Vec::with_capacity(points.len());
        for i in 0..points.len() {
            let duplicate = keep
                .iter()
                .any(|&j| points[j].angle_to(&points[i]) < options.dedup_angle);
            if !duplicate {
                keep.push(i);
            }
        }
        if keep.len() < points.len() {
            points = keep.iter().map(|&i| points[i]).collect();
            prev_grad = keep.iter().map(|&i| prev_grad[i]).collect();
            prev_dir = keep.iter().map(|&i| prev_dir[i]).collect();
        }
    }

    // Points can still coalesce on the final step before termination.
    let mut directions: Vec<Direction> = Vec::new();
    for p in &points {
        let duplicate = directions
            .iter()
            .any(|q| q.angle_to(p) < options.dedup_angle);
        if !duplicate {
            directions.push(*p);
        }
    }

    let values = f.evaluate(&directions);
    ExtremumResult {
        directions,
        values,
        converged,
        iterations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::generate_random_directions;

    #[test]
    fn finds_maximum_of_zonal_bump() {
        // f = z has its maximum at the north pole region boundary; use a
        // tilted axis to keep the extremum away from the poles.
        let axis = Direction::new(1.0, 0.5, 0.3);
        let f = SphericalHarmonicFn::project(
            |d: &Direction| d.dot(&axis),
            2,
        );

        let seeds = generate_random_directions(24, Some(17));
        let options = ExtremumOptions::builder(ExtremumMode::Maximum).build();
        let result = find_extremum(&f, &seeds, &options);

        assert!(result.converged);
        assert!(!result.directions.is_empty());
        let best = result
            .values
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        assert!((best - 1.0).abs() < 1e-4);
        let best_idx = result
            .values
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
            .unwrap()
            .0;
        assert!(result.directions[best_idx].angle_to(&axis) < 1e-3);
    }

    #[test]
    fn finds_minimum_of_quadratic_in_z() {
        // f = (z - 0.2)^2 restricted to the sphere, band-limited degree 2;
        // the minimum set is the ring z = 0.2.
        let f = SphericalHarmonicFn::project(
            |d: &Direction| (d.z() - 0.2) * (d.z() - 0.2),
            4,
        );

        let seeds = generate_random_directions(16, Some(3));
        let options = ExtremumOptions::builder(ExtremumMode::Minimum)
            .tau(1e-7)
            .build();
        let result = find_extremum(&f, &seeds, &options);

        assert!(result.converged);
        for (d, v) in result.directions.iter().zip(result.values.iter()) {
            assert!(v.abs() < 1e-8, "value {} at z {}", v, d.z());
            assert!((d.z() - 0.2).abs() < 1e-4);
        }
    }

    #[test]
    fn pole_seeds_are_excluded() {
        let f = SphericalHarmonicFn::constant(1.0);
        let seeds = [Direction::z_axis(), Direction::new(0.0, 0.0, -1.0)];
        let result = find_extremum(&f, &seeds, &ExtremumOptions::default());
        assert!(result.directions.is_empty());
        assert!(result.converged);
    }

    #[test]
    fn exhausted_budget_is_flagged_not_fatal() {
        let axis = Direction::new(0.3, -0.8, 0.5);
        let f = SphericalHarmonicFn::project(|d: &Direction| d.dot(&axis), 1);
        let seeds = generate_random_directions(8, Some(5));
        let options = ExtremumOptions::builder(ExtremumMode::Maximum)
            .kmax(1)
            .tau(1e-12)
            .build();
        let result = find_extremum(&f, &seeds, &options);
        assert!(!result.converged);
        assert_eq!(result.iterations, 1);
        assert!(!result.directions.is_empty());
    }

    #[test]
    fn duplicate_seeds_collapse_early() {
        // Identical seeds merge into one working point after the first
        // iteration and the single survivor still reaches the optimum.
        let axis = Direction::new(0.5, 0.2, 0.8);
        let f = SphericalHarmonicFn::project(|d: &Direction| d.dot(&axis), 1);
        let seeds = vec![Direction::from_polar(1.2, 0.7); 6];
        let options = ExtremumOptions::builder(ExtremumMode::Maximum).build();
        let result = find_extremum(&f, &seeds, &options);
        assert!(result.converged);
        assert_eq!(result.directions.len(), 1);
        assert!((result.values[0] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn coincident_results_are_merged() {
        let axis = Direction::new(0.2, 0.9, 0.4);
        let f = SphericalHarmonicFn::project(|d: &Direction| d.dot(&axis), 1);
        // Seeds clustered near the optimum all converge to the same point.
        let seeds: Vec<Direction> = (0..10)
            .map(|i| {
                let t = i as f64 * 0.01;
                Direction::new(axis.x() + t, axis.y(), axis.z() - t)
            })
            .collect();
        let options = ExtremumOptions::builder(ExtremumMode::Maximum).build();
        let result = find_extremum(&f, &seeds, &options);
        assert!(result.converged);
        assert_eq!(result.directions.len(), 1);
    }
}
