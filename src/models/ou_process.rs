// src/models/ou_process.rs
use super::model::SDEModel;
use nalgebra::{DMatrix, DVector};

/// Ornstein–Uhlenbeck process, componentwise mean reversion, additive noise
///
/// ```text
/// dX_t = θ (μ − X_t) dt + σ dW_t
/// ```
pub struct OuProcess {
    pub theta: f64,
    pub mu: f64,
    pub sigma: f64,
    pub dim: usize,
}

impl OuProcess {
    pub fn new(theta: f64, mu: f64, sigma: f64, dim: usize) -> Self {
        OuProcess {
            theta,
            mu,
            sigma,
            dim,
        }
    }
}

impl SDEModel for OuProcess {
    fn dim(&self) -> usize {
        self.dim
    }

    fn noise_dim(&self) -> usize {
        self.dim
    }

    fn drift(&self, x: &DVector<f64>, _t: f64) -> DVector<f64> {
        x.map(|xi| self.theta * (self.mu - xi))
    }

    fn diffusion(&self, _x: &DVector<f64>, _t: f64) -> DMatrix<f64> {
        DMatrix::identity(self.dim, self.dim) * self.sigma
    }
}
