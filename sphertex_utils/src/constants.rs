/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines shared numerical constants for grids, kernels, and pole handling.
//
// Created on: 12 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

/// Angular tolerance (radians) below which two directions are treated as the
/// same sample point and deduplicated.
pub const ANGULAR_DEDUP_TOLERANCE: f64 = 1e-7;

/// Polar-angle margin (radians) inside which a direction counts as lying at a
/// pole. The tangent frame (e_theta, e_rho) is undefined there, so gradient
/// queries and extremum seeds within this margin are excluded.
pub const POLE_EXCLUSION_ANGLE: f64 = 1e-3;

/// Default angular resolution (radians) of the equispaced sphere grid,
/// roughly 2 degrees, which yields on the order of 10,000 grid points.
pub const DEFAULT_GRID_RESOLUTION: f64 = 2.0 * std::f64::consts::PI / 180.0;

/// Default half-width (radians) of the de la Vallee Poussin interpolation
/// kernel when the caller does not supply one, before scaling by the local
/// sample resolution.
pub const DEFAULT_KERNEL_HALF_WIDTH: f64 = 5.0 * std::f64::consts::PI / 180.0;

/// Lower clamp applied to angular distances in inverse-distance weighting to
/// avoid division blow-up when a query coincides with a sample.
pub const INVERSE_DISTANCE_CLAMP: f64 = 1e-8;
