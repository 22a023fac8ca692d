// src/calculus.rs
//! Itô ↔ Stratonovich Drift Correction
//!
//! # Mathematical Framework
//!
//! An Itô SDE `dX = a dt + σ dW` and the Stratonovich SDE
//! `dX = a_s dt + σ ∘ dW` describe the same process when
//! ```text
//! a_s(x, t) = a(x, t) − ½ Σ_j (∂σ_{·,j}/∂x) σ_{·,j}(x, t)
//! ```
//! i.e. the drift is adjusted by the contraction of the diffusion's state
//! Jacobian with its own columns; the diffusion is unchanged. The correction
//! vanishes for state-independent (additive) noise.
//!
//! The stepping driver integrates the Stratonovich form (the polynomial path
//! substitution obeys the ordinary chain rule), so Itô-specified models are
//! converted up front with [`to_stratonovich`].

use crate::math_utils::numeric_jacobian;
use crate::models::model::SDEModel;
use nalgebra::{DMatrix, DVector};

/// An `SDEModel` with the Itô→Stratonovich drift correction applied
///
/// Pure wrapper: no state, no side effects. The diffusion Jacobian is
/// computed by central differences at each drift evaluation.
pub struct StratonovichCorrected<M: SDEModel> {
    inner: M,
}

/// Convert an Itô-calculus model to the equivalent Stratonovich form
pub fn to_stratonovich<M: SDEModel>(model: M) -> StratonovichCorrected<M> {
    StratonovichCorrected { inner: model }
}

impl<M: SDEModel> StratonovichCorrected<M> {
    /// `½ Σ_j (∂σ_{·,j}/∂x) σ_{·,j}`
    fn correction(&self, x: &DVector<f64>, t: f64) -> DVector<f64> {
        let sigma = self.inner.diffusion(x, t);
        let mut corr = DVector::zeros(self.inner.dim());
        for j in 0..self.inner.noise_dim() {
            let col_j = |y: &DVector<f64>| self.inner.diffusion(y, t).column(j).into_owned();
            let jac = numeric_jacobian(col_j, x);
            corr += jac * sigma.column(j) * 0.5;
        }
        corr
    }
}

impl<M: SDEModel> SDEModel for StratonovichCorrected<M> {
    fn dim(&self) -> usize {
        self.inner.dim()
    }

    fn noise_dim(&self) -> usize {
        self.inner.noise_dim()
    }

    fn drift(&self, x: &DVector<f64>, t: f64) -> DVector<f64> {
        self.inner.drift(x, t) - self.correction(x, t)
    }

    fn diffusion(&self, x: &DVector<f64>, t: f64) -> DMatrix<f64> {
        self.inner.diffusion(x, t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::gbm::Gbm;
    use crate::models::linear::LinearSde;
    use crate::models::ou_process::OuProcess;

    #[test]
    fn test_constant_diffusion_unchanged() {
        // additive noise: ∂σ/∂x = 0, correction is zero
        let model = LinearSde::integrated_bm();
        let corrected = to_stratonovich(LinearSde::integrated_bm());

        let x = DVector::from_row_slice(&[1.3, -0.7]);
        let drift_ito = model.drift(&x, 0.0);
        let drift_strat = corrected.drift(&x, 0.0);
        assert!((drift_ito - drift_strat).norm() < 1e-9);
        assert_eq!(model.diffusion(&x, 0.0), corrected.diffusion(&x, 0.0));
    }

    #[test]
    fn test_ou_unchanged() {
        let corrected = to_stratonovich(OuProcess::new(0.5, 0.1, 0.2, 3));
        let x = DVector::from_row_slice(&[1.0, 2.0, 3.0]);
        let expected = OuProcess::new(0.5, 0.1, 0.2, 3).drift(&x, 0.0);
        assert!((corrected.drift(&x, 0.0) - expected).norm() < 1e-9);
    }

    #[test]
    fn test_gbm_correction() {
        // σ = b·diag(x) ⇒ correction_i = ½ b² x_i
        let mu = 1.0;
        let sigma = 0.8;
        let corrected = to_stratonovich(Gbm::new(mu, sigma, 2));

        let x = DVector::from_row_slice(&[2.0, 0.5]);
        let drift = corrected.drift(&x, 0.0);
        let expected = &x * (mu - 0.5 * sigma * sigma);
        assert!(
            (drift - &expected).norm() < 1e-5,
            "Stratonovich GBM drift should be (μ − σ²/2)x"
        );
    }
}
