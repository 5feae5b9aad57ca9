/////////////////////////////////////////////////////////////////////////////////////////////
//
// Exposes the public API and high-level documentation for spherical texture analysis.
//
// Created on: 12 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Spherical texture analysis.
//!
//! Numerical building blocks for quantitative texture analysis of
//! polycrystalline materials: functions on the sphere represented either
//! spectrally (truncated spherical harmonic expansions) or locally
//! (scattered samples over a spherical Delaunay triangulation), plus the
//! orientation-map and elasticity machinery built on top of them.
//!
//! # Features
//! - Spherical harmonic synthesis, exact analytic differentiation,
//!   quadrature projection, and multi-seed extremum search
//! - Scattered-data interpolation on the sphere through an incremental
//!   convex-hull Delaunay triangulation, with nearest, linear, spline, and
//!   inverse-distance evaluation
//! - Gridded crystal orientation maps with symmetry-aware, grain-local
//!   smoothing filters
//! - Seismic wave velocity and polarization surfaces from elastic
//!   stiffness tensors
//! - Built on [`faer`](https://docs.rs/faer/latest/faer/) for linear
//!   algebra and [`nalgebra`](https://docs.rs/nalgebra/latest/nalgebra/)
//!   for rotations
//!
//! # Examples
//!
//! ```
//! use sphertex::{
//!     generate_random_directions, Direction, SphericalHarmonicFn,
//!     InterpolationMethod, InterpolationSettings, TriangulatedFn,
//! };
//!
//! // Project a smooth function onto a bandwidth-8 harmonic expansion.
//! let f = SphericalHarmonicFn::project(|d: &Direction| d.z().exp(), 8);
//! assert!((f.mean() - f.evaluate(&[Direction::z_axis()])[0]).abs() < 2.0);
//!
//! // Sample it at scattered directions and rebuild a local interpolant.
//! let dirs = generate_random_directions(500, Some(42));
//! let values = f.evaluate(&dirs);
//! let local = TriangulatedFn::from_samples(&dirs, &values).unwrap();
//!
//! // The two representations agree closely away from the samples.
//! let settings = InterpolationSettings::builder(InterpolationMethod::Linear).build();
//! let probes = generate_random_directions(50, Some(43));
//! let spectral = f.evaluate(&probes);
//! let interpolated = local.evaluate(&probes, &settings);
//! for (a, b) in spectral.iter().zip(interpolated.iter()) {
//!     assert!((a - b).abs() < 0.05);
//! }
//! ```

pub mod interp_config;

mod direction;

mod errors;

mod grid;

mod kdtree;

mod harmonics;

mod extremum;

mod triangulation;

mod triangulated;

mod vector_field;

mod orientation;

mod smoothing;

mod elastic;

pub use {
    direction::{directions_from_polar, generate_random_directions, Direction},
    elastic::{
        velocity_surfaces, wave_velocities, StiffnessTensor, VelocitySurfaces, WaveVelocities,
    },
    errors::{HarmonicsError, TriangulationError},
    extremum::{
        find_extremum, ExtremumMode, ExtremumOptions, ExtremumOptionsBuilder, ExtremumResult,
    },
    grid::SphereGrid,
    harmonics::{Component, SphericalHarmonicFn, SynthesisPlan},
    interp_config::{InterpolationMethod, InterpolationSettings, InterpolationSettingsBuilder},
    kdtree::KdTree3,
    orientation::{CrystalSymmetry, Grid, OrientationGrid, OrientationMap},
    smoothing::{
        smooth_orientations, MeanFilter, MedianFilter, OrientationFilter, SplineFilter,
        TangentGrid,
    },
    triangulated::TriangulatedFn,
    triangulation::SphericalTriangulation,
    vector_field::SphericalVectorField,
};
