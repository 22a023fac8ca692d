// src/models/model.rs
use nalgebra::{DMatrix, DVector};

pub trait SDEModel {
    /// State dimension
    fn dim(&self) -> usize;
    /// Dimension of the driving Brownian motion
    fn noise_dim(&self) -> usize;
    /// Drift coefficient `a(x, t)`, length `dim`
    fn drift(&self, x: &DVector<f64>, t: f64) -> DVector<f64>;
    /// Diffusion coefficient `b(x, t)`, shape `dim × noise_dim`
    fn diffusion(&self, x: &DVector<f64>, t: f64) -> DMatrix<f64>;
}
