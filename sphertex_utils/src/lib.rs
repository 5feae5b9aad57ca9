/////////////////////////////////////////////////////////////////////////////////////////////
//
// Re-exports kernel utilities, quadrature rules, and helper functions used across sphertex.
//
// Created on: 12 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Utilities for the [`sphertex`] crate
//!
//! Shared numerical building blocks: compactly-supported spherical kernels,
//! Gauss-Legendre quadrature nodes and weights, and small slice helpers.
mod constants;
mod kernels;
mod quadrature;
mod traits;
mod utils;

pub use {
    constants::{
        ANGULAR_DEDUP_TOLERANCE, DEFAULT_GRID_RESOLUTION, DEFAULT_KERNEL_HALF_WIDTH,
        INVERSE_DISTANCE_CLAMP, POLE_EXCLUSION_ANGLE,
    },
    kernels::{DeLaValleePoussinKernel, InverseAngularKernel},
    quadrature::gauss_legendre,
    traits::SphericalKernel,
    utils::{argmax, argmin, argsort, median},
};
