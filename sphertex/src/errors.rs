/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines the error types surfaced by the harmonic engine and triangulation construction.
//
// Created on: 12 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use std::error::Error;
use std::fmt;

/// Errors raised when constructing or differentiating a spherical harmonic
/// function.
///
/// Per-point undefined results during evaluation are carried through as NaN
/// sentinels in the output arrays instead; only setup-time problems surface
/// through this type.
#[derive(Debug, Clone, PartialEq)]
pub enum HarmonicsError {
    /// The coefficient sequence length is not a perfect square `(M + 1)^2`,
    /// so no bandwidth `M` is consistent with it.
    InvalidBandwidth { coefficient_count: usize },
}

impl fmt::Display for HarmonicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarmonicsError::InvalidBandwidth { coefficient_count } => {
                write!(
                    f,
                    "coefficient count {} is not a perfect square (M + 1)^2",
                    coefficient_count
                )
            }
        }
    }
}

impl Error for HarmonicsError {}

/// Errors raised when building a spherical triangulation from scattered
/// directions.
#[derive(Debug, Clone, PartialEq)]
pub enum TriangulationError {
    /// Fewer than four non-degenerate (non-coplanar) directions were given,
    /// so the sphere cannot be triangulated meaningfully.
    InsufficientSamples { required: usize, got: usize },
}

impl fmt::Display for TriangulationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriangulationError::InsufficientSamples { required, got } => {
                write!(
                    f,
                    "triangulating the sphere requires at least {} non-degenerate directions, got {}",
                    required, got
                )
            }
        }
    }
}

impl Error for TriangulationError {}
