/////////////////////////////////////////////////////////////////////////////////////////////
//
// Specifies method and locality options for configuring triangulated interpolation.
//
// Created on: 12 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Specifies method and locality options for configuring triangulated interpolation.
use serde::{Deserialize, Serialize};
use sphertex_utils::DEFAULT_KERNEL_HALF_WIDTH;

/// The implemented evaluation methods for a triangulated spherical function.
///
/// The set is closed: adding a method is a breaking change by design, so
/// that exhaustive matches over the evaluation strategy stay exhaustive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterpolationMethod {
    /// Value of the nearest sample; NaN beyond twice the local resolution.
    Nearest,

    /// Barycentric interpolation within the containing triangle.
    Linear,

    /// Kernel-weighted average of the four nearest samples using the
    /// de la Vallee Poussin kernel. The default.
    Spline,

    /// Inverse-angular-distance weighting of the four nearest samples.
    InverseDistance,
}

/// A convenience builder for constructing an [`InterpolationSettings`]
/// instance.
///
/// The builder should be called via the [`InterpolationSettings::builder`]
/// method.
///
/// See [`InterpolationSettings`] for details on each field.
#[derive(Debug, Clone, Copy)]
pub struct InterpolationSettingsBuilder {
    method: InterpolationMethod,
    cut_outside: bool,
    kernel_half_width: f64,
}

impl InterpolationSettingsBuilder {
    fn new(method: InterpolationMethod) -> Self {
        Self {
            method,
            cut_outside: false,
            kernel_half_width: DEFAULT_KERNEL_HALF_WIDTH,
        }
    }

    /// Sets whether queries far from every sample are suppressed to NaN.
    pub fn cut_outside(mut self, cut_outside: bool) -> Self {
        self.cut_outside = cut_outside;
        self
    }

    /// Sets the spline kernel half-width (radians), interpreted at the
    /// default grid resolution and scaled by the local sample resolution
    /// at evaluation time. Only used by the `Spline` method.
    pub fn kernel_half_width(mut self, kernel_half_width: f64) -> Self {
        self.kernel_half_width = kernel_half_width;
        self
    }

    /// Builds and returns an instance of [`InterpolationSettings`] from the
    /// values defined in the builder.
    pub fn build(self) -> InterpolationSettings {
        InterpolationSettings {
            method: self.method,
            cut_outside: self.cut_outside,
            kernel_half_width: self.kernel_half_width,
        }
    }
}

/// Defines how a triangulated spherical function evaluates between its
/// samples.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InterpolationSettings {
    /// The evaluation method.
    pub method: InterpolationMethod,

    /// When set, queries farther than four times the median
    /// nearest-neighbour distance from the nearest sample evaluate to NaN
    /// instead of extrapolating.
    pub cut_outside: bool,

    /// Half-width (radians) of the de la Vallee Poussin spline kernel: the
    /// angle at which a sample's influence has dropped to one half. The
    /// value is interpreted at the default grid resolution; evaluation
    /// scales it by the function's local sample resolution so that the
    /// kernel tracks the sampling density.
    pub kernel_half_width: f64,
}

impl InterpolationSettings {
    /// Returns a new [`InterpolationSettingsBuilder`] for the given method.
    pub fn builder(method: InterpolationMethod) -> InterpolationSettingsBuilder {
        InterpolationSettingsBuilder::new(method)
    }
}

impl Default for InterpolationSettings {
    fn default() -> Self {
        Self::builder(InterpolationMethod::Spline).build()
    }
}
