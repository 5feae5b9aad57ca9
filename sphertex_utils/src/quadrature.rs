/////////////////////////////////////////////////////////////////////////////////////////////
//
// Computes Gauss-Legendre quadrature nodes and weights by Newton iteration.
//
// Created on: 12 Jun 2026     Author: Daniel Owen
//
// Copyright (c) 2026, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use std::f64::consts::PI;

/// Returns the `n`-point Gauss-Legendre quadrature rule on `[-1, 1]`.
///
/// Nodes are the roots of the Legendre polynomial `P_n`, found by Newton
/// iteration from the Chebyshev-like initial guess; weights follow from the
/// derivative at each root. The rule integrates polynomials of degree up to
/// `2n - 1` exactly.
///
/// # Returns
/// `(nodes, weights)` with nodes in ascending order.
pub fn gauss_legendre(n: usize) -> (Vec<f64>, Vec<f64>) {
    assert!(n >= 1, "quadrature order must be at least 1");

    let mut nodes = vec![0.0; n];
    let mut weights = vec![0.0; n];

    // Roots are symmetric about zero; solve for the non-negative half.
    let half = (n + 1) / 2;

    for i in 0..half {
        // Tricomi-style initial guess for the i-th root (descending order).
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        let mut dp = 0.0;

        for _ in 0..100 {
            // Evaluate P_n(x) and P_n'(x) by the three-term recurrence.
            let mut p0 = 1.0;
            let mut p1 = x;
            for m in 2..=n {
                let mf = m as f64;
                let p2 = ((2.0 * mf - 1.0) * x * p1 - (mf - 1.0) * p0) / mf;
                p0 = p1;
                p1 = p2;
            }
            dp = (n as f64) * (x * p1 - p0) / (x * x - 1.0);

            let dx = p1 / dp;
            x -= dx;
            if dx.abs() < 1e-15 {
                break;
            }
        }

        let w = 2.0 / ((1.0 - x * x) * dp * dp);
        nodes[i] = -x;
        nodes[n - 1 - i] = x;
        weights[i] = w;
        weights[n - 1 - i] = w;
    }

    (nodes, weights)
}
