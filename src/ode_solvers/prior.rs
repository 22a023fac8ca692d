// src/ode_solvers/prior.rs
//! Integrated Wiener Process Prior
//!
//! # Mathematical Framework
//!
//! The filtering solvers model the ODE solution and its first `q`
//! derivatives as a `q`-times-integrated Wiener process. Over a step of
//! size `h` the (q+1)-dimensional per-dimension block evolves linearly with
//! transition matrix `A` and process noise `Q`:
//! ```text
//! A[i][j] = h^(j−i) / (j−i)!                         for j ≥ i
//! Q[i][j] = h^(2q+1−i−j) / ((2q+1−i−j)·(q−i)!·(q−j)!)
//! ```
//!
//! For `q = 1` this is the familiar pair
//! ```text
//! A = [[1, h], [0, 1]],   Q = [[h³/3, h²/2], [h²/2, h]]
//! ```
//!
//! This is the Integrated-Ornstein–Uhlenbeck prior with zero mean-reversion
//! and unit diffusivity, the configuration the solvers use throughout.

use nalgebra::DMatrix;

fn factorial(n: usize) -> f64 {
    (1..=n).map(|k| k as f64).product()
}

/// Transition matrix and process noise of the q-times-integrated Wiener
/// process over one step of size `h`, for a single state dimension
pub fn iwp_transition(q: usize, h: f64) -> (DMatrix<f64>, DMatrix<f64>) {
    let s = q + 1;

    let a = DMatrix::from_fn(s, s, |i, j| {
        if j >= i {
            h.powi((j - i) as i32) / factorial(j - i)
        } else {
            0.0
        }
    });

    let qmat = DMatrix::from_fn(s, s, |i, j| {
        let p = 2 * q + 1 - i - j;
        h.powi(p as i32) / (p as f64 * factorial(q - i) * factorial(q - j))
    });

    (a, qmat)
}
