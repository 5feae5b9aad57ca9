/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the concrete spherical kernel functions used for scattered interpolation.
//
// Created on: 12 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::constants::INVERSE_DISTANCE_CLAMP;
use crate::traits::SphericalKernel;
use serde::{Deserialize, Serialize};

/// De la Vallee Poussin kernel with `psi(delta) = ((1 + cos delta) / 2)^kappa`.
///
/// A smooth, bell-shaped bump on the sphere. The exponent `kappa` controls
/// the concentration: larger values give a narrower kernel. The half-width
/// constructor picks `kappa` so that the kernel has decayed to one half at
/// the requested angular distance.
#[derive(Clone, Debug, Copy, Serialize, Deserialize)]
pub struct DeLaValleePoussinKernel {
    pub kappa: f64,
}

impl DeLaValleePoussinKernel {
    #[inline(always)]
    pub fn new(kappa: f64) -> Self {
        assert!(kappa > 0.0, "kappa must be positive, got {}", kappa);
        Self { kappa }
    }

    /// Constructs the kernel from a half-width angle (radians): the angular
    /// distance at which the kernel value drops to `0.5`.
    #[inline(always)]
    pub fn from_half_width(half_width: f64) -> Self {
        assert!(
            half_width > 0.0 && half_width < std::f64::consts::PI,
            "half width must lie in (0, pi), got {}",
            half_width
        );
        let kappa = (0.5f64).ln() / ((1.0 + half_width.cos()) / 2.0).ln();
        Self { kappa }
    }
}

impl SphericalKernel for DeLaValleePoussinKernel {
    #[inline(always)]
    fn eval(&self, cos_angle: f64) -> f64 {
        let t = cos_angle.clamp(-1.0, 1.0);
        ((1.0 + t) / 2.0).powf(self.kappa)
    }

    #[inline(always)]
    fn ln_eval(&self, cos_angle: f64) -> f64 {
        let t = cos_angle.clamp(-1.0, 1.0);
        self.kappa * ((1.0 + t) / 2.0).ln()
    }
}

/// Inverse angular distance weight with `psi(delta) = 1 / max(delta, clamp)`.
///
/// The clamp keeps the weight finite when a query coincides with a stored
/// sample; the coincident sample then dominates the normalized weight row.
#[derive(Clone, Debug, Copy, Serialize, Deserialize)]
pub struct InverseAngularKernel {
    pub clamp: f64,
}

impl InverseAngularKernel {
    #[inline(always)]
    pub fn new(clamp: f64) -> Self {
        assert!(clamp > 0.0, "clamp must be positive, got {}", clamp);
        Self { clamp }
    }
}

impl Default for InverseAngularKernel {
    fn default() -> Self {
        Self {
            clamp: INVERSE_DISTANCE_CLAMP,
        }
    }
}

impl SphericalKernel for InverseAngularKernel {
    #[inline(always)]
    fn eval(&self, cos_angle: f64) -> f64 {
        let delta = cos_angle.clamp(-1.0, 1.0).acos();
        1.0 / delta.max(self.clamp)
    }
}
