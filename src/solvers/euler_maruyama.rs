// src/solvers/euler_maruyama.rs
//! Euler-Maruyama Reference Integrators
//!
//! # Mathematical Framework
//!
//! For a general SDE:
//! ```text
//! dX_t = a(X_t, t) dt + b(X_t, t) dW_t
//! ```
//!
//! the Euler-Maruyama scheme provides the discretization:
//! ```text
//! X_{n+1} = X_n + a(X_n, t_n) Δt + b(X_n, t_n) ΔW_n
//! ```
//!
//! Unlike a plain Monte Carlo stepper, the integrators here never sample:
//! the noise is supplied by the caller, so a reference solution can be driven
//! by exactly the same randomness as the probabilistic solver it is compared
//! against. Pathwise (not just distributional) convergence studies depend on
//! this shared-noise coupling.
//!
//! # Two Increment Conventions
//!
//! - [`euler_maruyama_piecewise`]: rows of `increments` are raw Brownian
//!   increments `ΔW_n` over sub-intervals of length `h`.
//! - [`euler_maruyama_pathwise`]: rows are standardized white-noise values
//!   `z_n = ΔW_n / h`, applied as `X += h·(a + b·z_n)`.
//!
//! # Convergence Properties
//!
//! - **Strong order**: 0.5 in general, 1.0 for additive noise
//! - **Weak order**: 1.0

use crate::error::{validation::*, SdeError, SdeResult};
use crate::models::model::SDEModel;
use nalgebra::{DMatrix, DVector};

fn validate_noise<M: SDEModel>(
    model: &M,
    noise: &DMatrix<f64>,
    n: usize,
) -> SdeResult<()> {
    if noise.nrows() != n || noise.ncols() != model.noise_dim() {
        return Err(SdeError::DimensionMismatch {
            object: "noise increments".to_string(),
            expected: format!("{} x {}", n, model.noise_dim()),
            found: format!("{} x {}", noise.nrows(), noise.ncols()),
        });
    }
    Ok(())
}

/// Euler-Maruyama driven by raw Brownian increments
///
/// `increments` has one row per step (`n × noise_dim`). Integration starts
/// at time `t0`; the returned times are `t0, t0 + h, ..., t0 + n·h` and the
/// trajectory has the initial state prepended.
pub fn euler_maruyama_piecewise<M: SDEModel>(
    increments: &DMatrix<f64>,
    init: &DVector<f64>,
    model: &M,
    t0: f64,
    h: f64,
    n: usize,
) -> SdeResult<(Vec<f64>, Vec<DVector<f64>>)> {
    validate_positive("h", h)?;
    validate_steps("n", n)?;
    validate_noise(model, increments, n)?;

    let mut times = Vec::with_capacity(n + 1);
    let mut trajectory = Vec::with_capacity(n + 1);
    times.push(t0);
    trajectory.push(init.clone());

    let mut x = init.clone();
    for k in 0..n {
        let t = t0 + k as f64 * h;
        let dw = increments.row(k).transpose();
        x += model.drift(&x, t) * h + model.diffusion(&x, t) * dw;
        times.push(t0 + (k + 1) as f64 * h);
        trajectory.push(x.clone());
    }

    Ok((times, trajectory))
}

/// Euler-Maruyama driven by standardized white-noise values
///
/// Rows of `noise` are `ΔW_n / h`; each step applies
/// `X += h·(a(X, t) + b(X, t)·z_n)`.
pub fn euler_maruyama_pathwise<M: SDEModel>(
    noise: &DMatrix<f64>,
    init: &DVector<f64>,
    model: &M,
    t0: f64,
    h: f64,
    n: usize,
) -> SdeResult<(Vec<f64>, Vec<DVector<f64>>)> {
    validate_positive("h", h)?;
    validate_steps("n", n)?;
    validate_noise(model, noise, n)?;

    let mut times = Vec::with_capacity(n + 1);
    let mut trajectory = Vec::with_capacity(n + 1);
    times.push(t0);
    trajectory.push(init.clone());

    let mut x = init.clone();
    for k in 0..n {
        let t = t0 + k as f64 * h;
        let z = noise.row(k).transpose();
        x += (model.drift(&x, t) + model.diffusion(&x, t) * z) * h;
        times.push(t0 + (k + 1) as f64 * h);
        trajectory.push(x.clone());
    }

    Ok((times, trajectory))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::linear::LinearSde;
    use crate::models::ou_process::OuProcess;

    #[test]
    fn test_conventions_agree() {
        // piecewise with ΔW must equal pathwise with ΔW / h
        let model = LinearSde::integrated_bm();
        let init = DVector::from_row_slice(&[1.0, 1.0]);
        let h = 0.01;
        let n = 50;

        let dw = DMatrix::from_fn(n, 1, |i, _| ((i * 7919 + 13) % 11) as f64 * 0.01 - 0.05);
        let z = &dw / h;

        let (_, traj1) = euler_maruyama_piecewise(&dw, &init, &model, 0.0, h, n).unwrap();
        let (_, traj2) = euler_maruyama_pathwise(&z, &init, &model, 0.0, h, n).unwrap();

        for (a, b) in traj1.iter().zip(traj2.iter()) {
            assert!((a - b).norm() < 1e-12);
        }
    }

    #[test]
    fn test_zero_noise_reduces_to_euler() {
        let model = OuProcess::new(0.5, 0.1, 0.2, 1);
        let init = DVector::from_row_slice(&[2.0]);
        let n = 1000;
        let h = 1e-3;

        let zeros = DMatrix::zeros(n, 1);
        let (times, traj) = euler_maruyama_piecewise(&zeros, &init, &model, 0.0, h, n).unwrap();

        assert_eq!(times.len(), n + 1);
        assert_eq!(traj.len(), n + 1);
        assert!((times[n] - 1.0).abs() < 1e-12);

        // deterministic OU mean: μ + (x0 − μ)e^{−θt}
        let exact = 0.1 + (2.0 - 0.1) * (-0.5f64).exp();
        assert!((traj[n][0] - exact).abs() < 2e-3);
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let model = LinearSde::integrated_bm();
        let init = DVector::from_row_slice(&[1.0, 1.0]);
        let bad = DMatrix::zeros(10, 2); // noise_dim is 1
        assert!(euler_maruyama_piecewise(&bad, &init, &model, 0.0, 0.1, 10).is_err());
        let short = DMatrix::zeros(5, 1);
        assert!(euler_maruyama_pathwise(&short, &init, &model, 0.0, 0.1, 10).is_err());
    }
}
