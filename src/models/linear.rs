// src/models/linear.rs
use super::model::SDEModel;
use nalgebra::{DMatrix, DVector};

/// Linear SDE with additive noise
///
/// ```text
/// dX_t = M X_t dt + C dW_t
/// ```
///
/// With `M = [[0, 1], [0, 0]]`, `C = [[0], [1]]` this is the
/// integrated-Brownian-motion system used as the convergence test SDE.
/// The diffusion is state-independent, so Itô and Stratonovich drifts agree.
pub struct LinearSde {
    pub m: DMatrix<f64>,
    pub c: DMatrix<f64>,
}

impl LinearSde {
    pub fn new(m: DMatrix<f64>, c: DMatrix<f64>) -> Self {
        assert_eq!(m.nrows(), m.ncols());
        assert_eq!(m.nrows(), c.nrows());
        LinearSde { m, c }
    }

    /// The integrated-Brownian-motion test system
    pub fn integrated_bm() -> Self {
        LinearSde::new(
            DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 0.0, 0.0]),
            DMatrix::from_row_slice(2, 1, &[0.0, 1.0]),
        )
    }
}

impl SDEModel for LinearSde {
    fn dim(&self) -> usize {
        self.m.nrows()
    }

    fn noise_dim(&self) -> usize {
        self.c.ncols()
    }

    fn drift(&self, x: &DVector<f64>, _t: f64) -> DVector<f64> {
        &self.m * x
    }

    fn diffusion(&self, _x: &DVector<f64>, _t: f64) -> DMatrix<f64> {
        self.c.clone()
    }
}
