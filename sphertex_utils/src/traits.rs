/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares the trait implemented by radially symmetric kernels on the sphere.
//
// Created on: 12 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

/// A radially symmetric kernel on the unit sphere.
///
/// Spherical kernels depend only on the angular distance `delta` between two
/// directions. Implementations take `cos(delta)` directly since the dot
/// product of two unit vectors is cheaper to compute than the angle itself.
pub trait SphericalKernel {
    /// Evaluates the kernel given the cosine of the angular distance.
    fn eval(&self, cos_angle: f64) -> f64;

    /// Natural logarithm of the kernel value. Implementations whose direct
    /// value underflows at large angular distances override this with an
    /// exact log-domain formula.
    fn ln_eval(&self, cos_angle: f64) -> f64 {
        self.eval(cos_angle).ln()
    }
}
