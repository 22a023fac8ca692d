// src/models/gbm.rs
use super::model::SDEModel;
use nalgebra::{DMatrix, DVector};

/// Geometric Brownian motion with diagonal diffusion
///
/// ```text
/// dX_t = μ X_t dt + σ diag(X_t) dW_t
/// ```
pub struct Gbm {
    pub mu: f64,
    pub sigma: f64,
    pub dim: usize,
}

impl Gbm {
    pub fn new(mu: f64, sigma: f64, dim: usize) -> Self {
        Gbm { mu, sigma, dim }
    }
}

impl SDEModel for Gbm {
    fn dim(&self) -> usize {
        self.dim
    }

    fn noise_dim(&self) -> usize {
        self.dim
    }

    fn drift(&self, x: &DVector<f64>, _t: f64) -> DVector<f64> {
        x * self.mu
    }

    fn diffusion(&self, x: &DVector<f64>, _t: f64) -> DMatrix<f64> {
        DMatrix::from_diagonal(&(x * self.sigma))
    }
}
