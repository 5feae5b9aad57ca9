/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines the unit-vector direction primitive and its spherical-coordinate conversions.
//
// Created on: 12 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// An immutable unit vector on the sphere.
///
/// Parameterized equivalently by Cartesian components `(x, y, z)` or by the
/// spherical pair `(theta, rho)` with polar angle `theta` in `[0, pi]`
/// (measured from the `+z` axis) and azimuth `rho` in `[0, 2 pi)`.
///
/// Operations on arrays of directions broadcast elementwise over
/// `Vec<Direction>` / `&[Direction]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Direction {
    x: f64,
    y: f64,
    z: f64,
}

impl Direction {
    /// Creates a direction from Cartesian components, normalizing to unit
    /// length. The zero vector normalizes to the `+z` pole.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        let norm = (x * x + y * y + z * z).sqrt();
        match norm > 0.0 {
            true => Self {
                x: x / norm,
                y: y / norm,
                z: z / norm,
            },
            false => Self {
                x: 0.0,
                y: 0.0,
                z: 1.0,
            },
        }
    }

    /// Creates a direction from spherical coordinates (polar angle `theta`,
    /// azimuth `rho`).
    pub fn from_polar(theta: f64, rho: f64) -> Self {
        let (st, ct) = theta.sin_cos();
        let (sr, cr) = rho.sin_cos();
        Self {
            x: st * cr,
            y: st * sr,
            z: ct,
        }
    }

    pub fn x_axis() -> Self {
        Self { x: 1.0, y: 0.0, z: 0.0 }
    }

    pub fn y_axis() -> Self {
        Self { x: 0.0, y: 1.0, z: 0.0 }
    }

    pub fn z_axis() -> Self {
        Self { x: 0.0, y: 0.0, z: 1.0 }
    }

    #[inline(always)]
    pub fn x(&self) -> f64 {
        self.x
    }

    #[inline(always)]
    pub fn y(&self) -> f64 {
        self.y
    }

    #[inline(always)]
    pub fn z(&self) -> f64 {
        self.z
    }

    /// Polar angle `theta` in `[0, pi]`, measured from the `+z` axis.
    #[inline(always)]
    pub fn polar_angle(&self) -> f64 {
        self.z.clamp(-1.0, 1.0).acos()
    }

    /// Azimuth `rho` in `[0, 2 pi)`.
    #[inline(always)]
    pub fn azimuth(&self) -> f64 {
        let rho = self.y.atan2(self.x);
        match rho < 0.0 {
            true => rho + TAU,
            false => rho,
        }
    }

    #[inline(always)]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[inline(always)]
    pub fn cross(&self, other: &Self) -> [f64; 3] {
        [
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        ]
    }

    /// Angular (great-circle) distance to another direction, in radians.
    #[inline(always)]
    pub fn angle_to(&self, other: &Self) -> f64 {
        self.dot(other).clamp(-1.0, 1.0).acos()
    }

    /// Returns the antipode `-d`.
    #[inline(always)]
    pub fn antipode(&self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }

    /// Canonicalizes an undirected (axis-like) direction so that antipodal
    /// pairs map to a single representative with non-negative `z` (ties
    /// broken on `y`, then `x`).
    pub fn canonical_antipodal(&self) -> Self {
        if self.z > 0.0 {
            return *self;
        }
        if self.z < 0.0 {
            return self.antipode();
        }
        if self.y > 0.0 || (self.y == 0.0 && self.x >= 0.0) {
            return *self;
        }
        self.antipode()
    }

    /// Local tangent frame `(e_theta, e_rho)` at this direction.
    ///
    /// Undefined at the poles; callers must exclude pole-adjacent directions
    /// before requesting the frame.
    pub fn tangent_frame(&self) -> ([f64; 3], [f64; 3]) {
        let theta = self.polar_angle();
        let rho = self.azimuth();
        let (st, ct) = theta.sin_cos();
        let (sr, cr) = rho.sin_cos();
        let e_theta = [ct * cr, ct * sr, -st];
        let e_rho = [-sr, cr, 0.0];
        (e_theta, e_rho)
    }

    /// Moves this point along the sphere by the tangent vector `v` (given in
    /// ambient coordinates): the exponential map. The point travels along the
    /// great circle in the direction of `v` by arc length `|v|`.
    pub fn exp_map(&self, v: [f64; 3]) -> Self {
        let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
        if norm < 1e-16 {
            return *self;
        }
        let (s, c) = norm.sin_cos();
        Direction::new(
            c * self.x + s * v[0] / norm,
            c * self.y + s * v[1] / norm,
            c * self.z + s * v[2] / norm,
        )
    }
}

/// Generate a vector of directions drawn uniformly with respect to surface
/// area.
///
/// # Parameters
/// - `n`: Number of directions to generate.
/// - `seed`: Optional random seed.
///   - If `Some(seed)` is provided, the same sequence of directions will be
///     generated deterministically across runs and platforms (useful for
///     reproducible tests).
///   - If `None`, the generator is seeded from the operating system's
///     randomness source.
///
/// # Example
/// ```
/// use sphertex::generate_random_directions;
///
/// let dirs = generate_random_directions(100, Some(42));
/// assert_eq!(dirs.len(), 100);
/// ```
pub fn generate_random_directions(n: usize, seed: Option<u64>) -> Vec<Direction> {
    let mut rng = match seed.is_some() {
        true => StdRng::seed_from_u64(seed.unwrap()),
        false => StdRng::from_os_rng(),
    };

    (0..n)
        .map(|_| {
            // Area-uniform: z uniform in [-1, 1], azimuth uniform in [0, 2 pi).
            let z: f64 = rng.random_range(-1.0..1.0);
            let rho: f64 = rng.random_range(0.0..TAU);
            let st = (1.0 - z * z).sqrt();
            Direction::new(st * rho.cos(), st * rho.sin(), z)
        })
        .collect()
}

/// Converts `(theta, rho)` pairs into directions elementwise.
pub fn directions_from_polar(polar: &[(f64, f64)]) -> Vec<Direction> {
    polar
        .iter()
        .map(|&(theta, rho)| Direction::from_polar(theta, rho))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn polar_round_trip() {
        for &(theta, rho) in &[(0.3, 0.7), (1.2, 4.5), (2.9, 0.01), (1.5707, 3.1415)] {
            let d = Direction::from_polar(theta, rho);
            assert!((d.polar_angle() - theta).abs() < 1e-12);
            assert!((d.azimuth() - rho).abs() < 1e-12);
        }
    }

    #[test]
    fn new_normalizes_input() {
        let d = Direction::new(3.0, 0.0, 4.0);
        assert!((d.x() - 0.6).abs() < 1e-15);
        assert!((d.z() - 0.8).abs() < 1e-15);
    }

    #[test]
    fn angle_between_axes_is_right_angle() {
        let a = Direction::x_axis();
        let b = Direction::z_axis();
        assert!((a.angle_to(&b) - PI / 2.0).abs() < 1e-14);
    }

    #[test]
    fn canonical_antipodal_maps_pairs_together() {
        let dirs = generate_random_directions(50, Some(7));
        for d in dirs {
            let a = d.canonical_antipodal();
            let b = d.antipode().canonical_antipodal();
            assert!((a.x() - b.x()).abs() < 1e-14);
            assert!((a.y() - b.y()).abs() < 1e-14);
            assert!((a.z() - b.z()).abs() < 1e-14);
        }
    }

    #[test]
    fn exp_map_travels_requested_arc_length() {
        let d = Direction::from_polar(1.0, 0.5);
        let (e_theta, _) = d.tangent_frame();
        let step = 0.25;
        let moved = d.exp_map([e_theta[0] * step, e_theta[1] * step, e_theta[2] * step]);
        assert!((d.angle_to(&moved) - step).abs() < 1e-12);
    }

    #[test]
    fn exp_map_with_zero_vector_is_identity() {
        let d = Direction::from_polar(0.8, 2.2);
        let moved = d.exp_map([0.0, 0.0, 0.0]);
        assert!((d.angle_to(&moved)).abs() < 1e-14);
    }

    #[test]
    fn random_directions_are_unit_length() {
        for d in generate_random_directions(200, Some(11)) {
            let n = (d.x() * d.x() + d.y() * d.y() + d.z() * d.z()).sqrt();
            assert!((n - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn tangent_frame_is_orthonormal() {
        let d = Direction::from_polar(0.9, 5.1);
        let (et, er) = d.tangent_frame();
        let dot = et[0] * er[0] + et[1] * er[1] + et[2] * er[2];
        assert!(dot.abs() < 1e-14);
        let radial = et[0] * d.x() + et[1] * d.y() + et[2] * d.z();
        assert!(radial.abs() < 1e-14);
    }
}
