// src/brownian.rs
//! Polynomial Approximation of Brownian Paths
//!
//! # Mathematical Framework
//!
//! Over one interval `[0, dt]` a Brownian path `W` is replaced by the
//! degree-2 polynomial
//! ```text
//! w̃(t) = a·u + b·√6·u·(u − 1),    u = t/dt
//! ```
//! with random coefficients
//! ```text
//! a ~ N(0, dt)      (matches the increment W(dt) exactly at the endpoint)
//! b ~ N(0, dt/2)    (matches the space-time integral ∫₀^dt W ds)
//! ```
//!
//! The polynomial satisfies `w̃(0) = 0`, `w̃(dt) = a`, and
//! `∫₀^dt w̃ ds = dt·(a/2 − b/√6)`, so `b` carries exactly the information
//! of the leading iterated integral of the path.
//!
//! # Variants
//!
//! - [`ParabolaApprox`]: samples `(a, b)` directly, two normal draws per
//!   driving dimension.
//! - [`ParabolaFineApprox`]: subdivides `dt` into `fine` micro-steps, samples
//!   the micro-increments, and *derives* `(a, b)` from them (endpoint sum and
//!   trapezoidal space-time integral). The raw increments are kept so a
//!   reference solver can be driven by exactly the same randomness.

use crate::error::{validation::validate_positive, SdeResult};
use crate::rng::SplitKey;
use nalgebra::{DMatrix, DVector};

const SQRT_6: f64 = 2.449489742783178;

/// One realization of the driving path over a single interval
///
/// `a` and `b` are the polynomial coefficients, one entry per driving
/// dimension. `increments` holds the raw micro-increments (`fine × dim`)
/// when the coefficients were derived from a sub-partition, `None` otherwise.
#[derive(Debug, Clone)]
pub struct BrownianCoeffs {
    pub a: DVector<f64>,
    pub b: DVector<f64>,
    pub increments: Option<DMatrix<f64>>,
}

/// Shared contract of the path approximation schemes
pub trait BrownianApprox {
    /// Dimension of the driving Brownian motion
    fn noise_dim(&self) -> usize;

    /// Whether sampled coefficients carry raw micro-increments
    fn has_increments(&self) -> bool {
        false
    }

    /// Draw one set of coefficients for an interval of length `dt`
    ///
    /// Reproducible bit-for-bit given the same key, and consumes exactly the
    /// advertised number of normal draws.
    fn sample(&self, key: &SplitKey, dt: f64) -> SdeResult<BrownianCoeffs>;

    /// Reconstruct the approximate path value at `t ∈ [0, dt]`
    fn eval(&self, t: f64, dt: f64, coeffs: &BrownianCoeffs) -> DVector<f64> {
        parabola_eval(t, dt, coeffs)
    }

    /// Time derivative of the approximate path at `t ∈ [0, dt]`
    fn derivative(&self, t: f64, dt: f64, coeffs: &BrownianCoeffs) -> DVector<f64> {
        parabola_derivative(t, dt, coeffs)
    }
}

/// `w̃(t) = a·u + b·√6·u·(u − 1)` with `u = t/dt`
pub fn parabola_eval(t: f64, dt: f64, coeffs: &BrownianCoeffs) -> DVector<f64> {
    assert!(dt > 0.0, "parabola evaluated with dt = {}", dt);
    let u = t / dt;
    &coeffs.a * u + &coeffs.b * (SQRT_6 * u * (u - 1.0))
}

/// `w̃'(t) = a/dt + b·√6·(2u − 1)/dt` with `u = t/dt`
pub fn parabola_derivative(t: f64, dt: f64, coeffs: &BrownianCoeffs) -> DVector<f64> {
    assert!(dt > 0.0, "parabola derivative evaluated with dt = {}", dt);
    let u = t / dt;
    &coeffs.a * (1.0 / dt) + &coeffs.b * (SQRT_6 * (2.0 * u - 1.0) / dt)
}

/// Direct coefficient sampling: two normal draws per driving dimension
#[derive(Debug, Clone, Copy)]
pub struct ParabolaApprox {
    dim: usize,
}

impl ParabolaApprox {
    pub fn new(dim: usize) -> Self {
        assert!(dim > 0, "driving dimension must be positive");
        ParabolaApprox { dim }
    }
}

impl BrownianApprox for ParabolaApprox {
    fn noise_dim(&self) -> usize {
        self.dim
    }

    fn sample(&self, key: &SplitKey, dt: f64) -> SdeResult<BrownianCoeffs> {
        validate_positive("dt", dt)?;
        let eps = key.normal_matrix(2, self.dim);
        let a = eps.row(0).transpose() * dt.sqrt();
        let b = eps.row(1).transpose() * (0.5 * dt).sqrt();
        Ok(BrownianCoeffs {
            a,
            b,
            increments: None,
        })
    }
}

/// Coefficients derived from a fine sub-partition of the interval
///
/// Samples `fine` micro-increments `ΔW_i ~ N(0, dt/fine)` per driving
/// dimension, then matches the parabola to the fine path:
/// ```text
/// a = Σᵢ ΔWᵢ                       (endpoint)
/// b = √6·(a/2 − (1/dt)·∫₀^dt W ds)  (trapezoidal integral of the fine path)
/// ```
/// The micro-increments are returned in [`BrownianCoeffs::increments`] so the
/// same randomness can drive a piecewise Euler–Maruyama reference.
#[derive(Debug, Clone, Copy)]
pub struct ParabolaFineApprox {
    dim: usize,
    fine: usize,
}

impl ParabolaFineApprox {
    pub fn new(dim: usize, fine: usize) -> Self {
        assert!(dim > 0, "driving dimension must be positive");
        assert!(fine > 0, "sub-partition size must be positive");
        ParabolaFineApprox { dim, fine }
    }

    pub fn fine(&self) -> usize {
        self.fine
    }
}

impl BrownianApprox for ParabolaFineApprox {
    fn noise_dim(&self) -> usize {
        self.dim
    }

    fn has_increments(&self) -> bool {
        true
    }

    fn sample(&self, key: &SplitKey, dt: f64) -> SdeResult<BrownianCoeffs> {
        validate_positive("dt", dt)?;
        let h = dt / self.fine as f64;
        let increments = key.normal_matrix(self.fine, self.dim) * h.sqrt();

        // trapezoidal ∫₀^dt W ds over the piecewise-linear fine path
        let mut int_w = DVector::zeros(self.dim);
        let mut w = DVector::zeros(self.dim);
        for i in 0..self.fine {
            let w_next = &w + increments.row(i).transpose();
            int_w += (&w + &w_next) * (0.5 * h);
            w = w_next;
        }
        let a = w;

        let b = (&a * 0.5 - &int_w * (1.0 / dt)) * SQRT_6;

        Ok(BrownianCoeffs {
            a,
            b,
            increments: Some(increments),
        })
    }
}
