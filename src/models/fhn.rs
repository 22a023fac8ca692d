// src/models/fhn.rs
use super::model::SDEModel;
use nalgebra::{DMatrix, DVector};

/// Stochastic FitzHugh–Nagumo oscillator
///
/// ```text
/// dV = (V − V³ − U + s) / ε dt
/// dU = (γ V − U + α) dt + σ dW_t
/// ```
///
/// Two-dimensional state driven by a one-dimensional Brownian motion acting
/// on the recovery variable only. Additive noise.
pub struct FitzHughNagumo {
    pub eps: f64,
    pub gamma: f64,
    pub s: f64,
    pub alpha: f64,
    pub sigma: f64,
}

impl FitzHughNagumo {
    pub fn new(eps: f64, gamma: f64, s: f64, alpha: f64, sigma: f64) -> Self {
        FitzHughNagumo {
            eps,
            gamma,
            s,
            alpha,
            sigma,
        }
    }
}

impl Default for FitzHughNagumo {
    fn default() -> Self {
        FitzHughNagumo::new(1.0, 1.0, 1.0, 1.0, 1.0)
    }
}

impl SDEModel for FitzHughNagumo {
    fn dim(&self) -> usize {
        2
    }

    fn noise_dim(&self) -> usize {
        1
    }

    fn drift(&self, x: &DVector<f64>, _t: f64) -> DVector<f64> {
        let v = x[0];
        let u = x[1];
        DVector::from_row_slice(&[
            (v - v * v * v - u + self.s) / self.eps,
            self.gamma * v - u + self.alpha,
        ])
    }

    fn diffusion(&self, _x: &DVector<f64>, _t: f64) -> DMatrix<f64> {
        DMatrix::from_row_slice(2, 1, &[0.0, self.sigma])
    }
}
