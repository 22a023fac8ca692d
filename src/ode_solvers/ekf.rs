// src/ode_solvers/ekf.rs
//! Extended Kalman Filtering as ODE Integration
//!
//! # Mathematical Framework
//!
//! The ODE solution is treated as the hidden state of a linear-Gaussian
//! state-space model: per dimension the state carries `[x, x', ...]` under a
//! q-times-integrated Wiener prior, observed without noise through the IVP
//! residual
//! ```text
//! g(z, t) = E₁z − f(E₀z, t)
//! ```
//! where `E₀`/`E₁` select the 0th/1st derivative coordinates. Each step is a
//! predict through the prior transition followed by an update against the
//! observation `y = 0`:
//! ```text
//! predict:  m ← A m,  P ← A P Aᵀ + Q
//! update:   S = H P Hᵀ,  K = P Hᵀ S⁻¹
//!           m ← m + K (f(E₀m, t) − E₁m),  P ← P − K S Kᵀ
//! ```
//!
//! # Linearization Variants
//!
//! - **EKF1**: `H = E₁ − J_f(E₀m)·E₀`, the full Jacobian of the residual at
//!   the predicted mean.
//! - **EKF0**: `H = E₁`, a zero-order linearization that treats the vector
//!   field as constant (the stop-gradient variant).
//!
//! # Square-Root Form
//!
//! Optionally the Cholesky factor of `P` is propagated instead of `P`
//! itself, via QR re-triangularization, guaranteeing positive
//! semi-definiteness under repeated composition. The external contract is
//! unchanged; only the internal representation differs.
//!
//! # Failure Semantics
//!
//! An innovation covariance that is not positive definite (or a singular
//! square-root factor) aborts the solve with a numerical-instability error
//! rather than silently corrupting the covariance.

use super::prior::iwp_transition;
use super::{OdeSolver, State, StateKind, VectorField};
use crate::error::{validation::*, SdeError, SdeResult};
use crate::math_utils::{cholesky, psd_factor, tria};
use crate::rng::SplitKey;
use nalgebra::{DMatrix, DVector};

/// How the IVP residual is linearized in the update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linearization {
    /// EKF0: zero-order, `H = E₁`
    ZeroOrder,
    /// EKF1: first-order, `H = E₁ − J_f·E₀`
    FirstOrder,
}

/// Kalman predict: propagate mean and covariance through the prior
pub fn predict(
    m: &DVector<f64>,
    p: &DMatrix<f64>,
    a: &DMatrix<f64>,
    q: &DMatrix<f64>,
) -> (DVector<f64>, DMatrix<f64>) {
    (a * m, a * p * a.transpose() + q)
}

/// Square-root predict: propagate the Cholesky factor of the covariance
pub fn predict_sqrt(
    m: &DVector<f64>,
    lp: &DMatrix<f64>,
    a: &DMatrix<f64>,
    lq: &DMatrix<f64>,
) -> (DVector<f64>, DMatrix<f64>) {
    let d = m.len();
    let mut stacked = DMatrix::zeros(d, 2 * d);
    stacked.slice_mut((0, 0), (d, d)).copy_from(&(a * lp));
    stacked.slice_mut((0, d), (d, d)).copy_from(lq);
    (a * m, tria(&stacked))
}

/// Kalman update against a noiseless observation with innovation `v`
///
/// Fails if the innovation covariance `S = H P Hᵀ` is not positive definite.
pub fn update(
    m: &DVector<f64>,
    p: &DMatrix<f64>,
    v: &DVector<f64>,
    h: &DMatrix<f64>,
    method: &str,
) -> SdeResult<(DVector<f64>, DMatrix<f64>)> {
    let s = h * p * h.transpose();
    let chol = cholesky(&s, method)?;
    let k = chol.solve(&(h * p)).transpose();

    let m_new = m + &k * v;
    let p_new = p - &k * s * k.transpose();
    // keep the covariance exactly symmetric under repeated composition
    let p_new = (&p_new + p_new.transpose()) * 0.5;
    Ok((m_new, p_new))
}

/// Square-root update via block QR re-triangularization
///
/// Builds `[[H·Lp, 0], [Lp, 0]]`, lower-triangularizes it, and reads off the
/// innovation factor, the gain and the updated covariance factor. Fails if
/// the innovation factor is singular.
pub fn update_sqrt(
    m: &DVector<f64>,
    lp: &DMatrix<f64>,
    v: &DVector<f64>,
    h: &DMatrix<f64>,
    method: &str,
) -> SdeResult<(DVector<f64>, DMatrix<f64>)> {
    let dx = m.len();
    let dy = h.nrows();

    let mut block = DMatrix::zeros(dy + dx, dx + dy);
    block.slice_mut((0, 0), (dy, dx)).copy_from(&(h * lp));
    block.slice_mut((dy, 0), (dx, dx)).copy_from(lp);
    let t = tria(&block);

    let s_factor = t.slice((0, 0), (dy, dy)).into_owned();
    let gain = t.slice((dy, 0), (dx, dy)).into_owned();
    let lp_new = t.slice((dy, dy), (dx, dx)).into_owned();

    let scale = s_factor.iter().fold(0.0f64, |acc, &x| acc.max(x.abs()));
    for i in 0..dy {
        if s_factor[(i, i)].abs() <= 1e-14 * scale.max(1.0) {
            return Err(SdeError::NumericalInstability {
                method: method.to_string(),
                reason: "innovation factor is singular".to_string(),
            });
        }
    }
    let w = s_factor
        .solve_lower_triangular(v)
        .ok_or_else(|| SdeError::NumericalInstability {
            method: method.to_string(),
            reason: "triangular solve against innovation factor failed".to_string(),
        })?;

    Ok((m + gain * w, lp_new))
}

/// Extended Kalman filter as a fixed-step ODE solver
///
/// Constructors cover the four standard variants:
///
/// | name     | derivatives | linearization | state kind       |
/// |----------|-------------|---------------|------------------|
/// | `ekf0`   | q = 1       | zero-order    | bare vector      |
/// | `ekf1`   | q = 1       | first-order   | bare vector      |
/// | `ekf0_2` | q = 2       | zero-order    | mean/covariance  |
/// | `ekf1_2` | q = 2       | first-order   | mean/covariance  |
///
/// `with_sqrt(true)` switches to square-root covariance propagation without
/// changing the external contract.
pub struct EkfSolver {
    name: &'static str,
    linearization: Linearization,
    order: usize,
    kind: StateKind,
    sqrt_form: bool,
}

impl EkfSolver {
    pub fn ekf0() -> Self {
        EkfSolver {
            name: "ekf0",
            linearization: Linearization::ZeroOrder,
            order: 1,
            kind: StateKind::Point,
            sqrt_form: false,
        }
    }

    pub fn ekf1() -> Self {
        EkfSolver {
            name: "ekf1",
            linearization: Linearization::FirstOrder,
            order: 1,
            kind: StateKind::Point,
            sqrt_form: false,
        }
    }

    pub fn ekf0_2() -> Self {
        EkfSolver {
            name: "ekf0_2",
            linearization: Linearization::ZeroOrder,
            order: 2,
            kind: StateKind::Gaussian,
            sqrt_form: false,
        }
    }

    pub fn ekf1_2() -> Self {
        EkfSolver {
            name: "ekf1_2",
            linearization: Linearization::FirstOrder,
            order: 2,
            kind: StateKind::Gaussian,
            sqrt_form: false,
        }
    }

    pub fn with_sqrt(mut self, sqrt_form: bool) -> Self {
        self.sqrt_form = sqrt_form;
        self
    }

    /// Extract mean and optional covariance, rejecting the wrong state kind
    fn unpack_init<'a>(
        &self,
        init: &'a State,
    ) -> SdeResult<(&'a DVector<f64>, Option<&'a DMatrix<f64>>)> {
        match (self.kind, init) {
            (StateKind::Point, State::Point(x)) => Ok((x, None)),
            (StateKind::Gaussian, State::Gaussian { mean, cov }) => Ok((mean, Some(cov))),
            _ => Err(SdeError::UnsupportedState {
                solver: self.name.to_string(),
                expected: self.kind.to_string(),
                found: init.kind().to_string(),
            }),
        }
    }

    /// Project the filter state back to the caller's state space
    fn output(&self, m: &DVector<f64>, p_or_lp: &DMatrix<f64>, e0: &DMatrix<f64>) -> State {
        let mean = e0 * m;
        match self.kind {
            StateKind::Point => State::Point(mean),
            StateKind::Gaussian => {
                let cov = if self.sqrt_form {
                    let l0 = e0 * p_or_lp;
                    &l0 * l0.transpose()
                } else {
                    e0 * p_or_lp * e0.transpose()
                };
                State::Gaussian { mean, cov }
            }
        }
    }
}

impl OdeSolver for EkfSolver {
    fn name(&self) -> &'static str {
        self.name
    }

    fn expects(&self) -> StateKind {
        self.kind
    }

    fn solve(
        &self,
        _key: Option<&SplitKey>,
        init: &State,
        vector_field: &dyn VectorField,
        h: f64,
        n: usize,
    ) -> SdeResult<Vec<State>> {
        validate_positive("h", h)?;
        validate_steps("n", n)?;
        let (x0, p0) = self.unpack_init(init)?;

        let d = x0.len();
        let s = self.order + 1;
        let full = d * s;

        // derivative-selection operators and the stacked prior
        let mut e0 = DMatrix::zeros(d, full);
        let mut e1 = DMatrix::zeros(d, full);
        for i in 0..d {
            e0[(i, i * s)] = 1.0;
            e1[(i, i * s + 1)] = 1.0;
        }
        let (a1, q1) = iwp_transition(self.order, h);
        let eye = DMatrix::identity(d, d);
        let a = eye.kronecker(&a1);
        let q = eye.kronecker(&q1);

        // exact initialization: state and first derivative known, higher
        // derivatives zero; incoming covariance injected in the 0th block
        let f0 = vector_field.eval(x0, 0.0);
        let mut m = DVector::zeros(full);
        for i in 0..d {
            m[i * s] = x0[i];
            m[i * s + 1] = f0[i];
        }
        let mut p = DMatrix::zeros(full, full);
        if let Some(p0) = p0 {
            for i in 0..d {
                for j in 0..d {
                    p[(i * s, j * s)] = p0[(i, j)];
                }
            }
        }

        let lq = if self.sqrt_form {
            psd_factor(&q)?
        } else {
            DMatrix::zeros(0, 0)
        };
        if self.sqrt_form {
            p = psd_factor(&p)?;
        }

        let mut trajectory = Vec::with_capacity(n + 1);
        trajectory.push(self.output(&m, &p, &e0));

        for k in 0..n {
            let t_next = (k + 1) as f64 * h;

            let (m_pred, p_pred) = if self.sqrt_form {
                predict_sqrt(&m, &p, &a, &lq)
            } else {
                predict(&m, &p, &a, &q)
            };

            let x_pred = &e0 * &m_pred;
            let f = vector_field.eval(&x_pred, t_next);
            let v = &f - &e1 * &m_pred;
            let h_obs = match self.linearization {
                Linearization::ZeroOrder => e1.clone(),
                Linearization::FirstOrder => &e1 - vector_field.jacobian(&x_pred, t_next) * &e0,
            };

            let (m_new, p_new) = if self.sqrt_form {
                update_sqrt(&m_pred, &p_pred, &v, &h_obs, self.name)?
            } else {
                update(&m_pred, &p_pred, &v, &h_obs, self.name)?
            };
            m = m_new;
            p = p_new;

            trajectory.push(self.output(&m, &p, &e0));
        }

        Ok(trajectory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ode_solvers::FnVectorField;

    fn exponential_field() -> FnVectorField<impl Fn(&DVector<f64>, f64) -> DVector<f64>> {
        FnVectorField(|x: &DVector<f64>, _t: f64| x.clone())
    }

    #[test]
    fn test_ekf1_linear_ode() {
        let init = State::Point(DVector::from_row_slice(&[1.0]));
        let traj = EkfSolver::ekf1()
            .solve(None, &init, &exponential_field(), 0.01, 100)
            .unwrap();

        assert_eq!(traj.len(), 101);
        let terminal = traj.last().unwrap().mean()[0];
        assert!(
            (terminal - std::f64::consts::E).abs() < 1e-3,
            "ekf1 terminal {} should approximate e",
            terminal
        );
    }

    #[test]
    fn test_ekf0_linear_ode() {
        let init = State::Point(DVector::from_row_slice(&[1.0]));
        let traj = EkfSolver::ekf0()
            .solve(None, &init, &exponential_field(), 0.01, 100)
            .unwrap();

        let terminal = traj.last().unwrap().mean()[0];
        assert!(
            (terminal - std::f64::consts::E).abs() < 5e-2,
            "ekf0 terminal {} should approximate e",
            terminal
        );
    }

    #[test]
    fn test_sqrt_and_plain_forms_agree() {
        // nonlinear 2-d field exercises both the Jacobian and the covariance
        let vf = FnVectorField(|x: &DVector<f64>, t: f64| {
            DVector::from_row_slice(&[x[1].sin() + t, x[0] * x[1] * 0.1 - x[0]])
        });
        let init = State::Gaussian {
            mean: DVector::from_row_slice(&[1.0, -0.5]),
            cov: DMatrix::from_row_slice(2, 2, &[0.01, 0.0, 0.0, 0.02]),
        };

        let plain = EkfSolver::ekf1_2().solve(None, &init, &vf, 0.05, 20).unwrap();
        let sqrt = EkfSolver::ekf1_2()
            .with_sqrt(true)
            .solve(None, &init, &vf, 0.05, 20)
            .unwrap();

        for (sp, ss) in plain.iter().zip(sqrt.iter()) {
            match (sp, ss) {
                (
                    State::Gaussian { mean: mp, cov: pp },
                    State::Gaussian { mean: ms, cov: ps },
                ) => {
                    assert!((mp - ms).norm() < 1e-8, "means diverged");
                    assert!((pp - ps).norm() < 1e-8, "covariances diverged");
                }
                _ => panic!("expected Gaussian states"),
            }
        }
    }

    #[test]
    fn test_gaussian_variant_returns_covariance() {
        let init = State::Gaussian {
            mean: DVector::from_row_slice(&[1.0]),
            cov: DMatrix::zeros(1, 1),
        };
        let traj = EkfSolver::ekf0_2()
            .solve(None, &init, &exponential_field(), 0.01, 50)
            .unwrap();

        match traj.last().unwrap() {
            State::Gaussian { mean, cov } => {
                assert!(mean[0] > 1.0);
                assert!(cov[(0, 0)] >= 0.0);
            }
            _ => panic!("expected Gaussian state"),
        }
    }

    #[test]
    fn test_state_kind_checked_at_setup() {
        let point = State::Point(DVector::from_row_slice(&[1.0]));
        let gaussian = State::Gaussian {
            mean: DVector::from_row_slice(&[1.0]),
            cov: DMatrix::zeros(1, 1),
        };

        assert!(EkfSolver::ekf0_2()
            .solve(None, &point, &exponential_field(), 0.1, 1)
            .is_err());
        assert!(EkfSolver::ekf1()
            .solve(None, &gaussian, &exponential_field(), 0.1, 1)
            .is_err());
    }

    #[test]
    fn test_singular_innovation_fails() {
        // zero covariance makes S = H·0·Hᵀ singular in both forms
        let m = DVector::zeros(2);
        let p = DMatrix::zeros(2, 2);
        let v = DVector::zeros(1);
        let h = DMatrix::from_row_slice(1, 2, &[0.0, 1.0]);

        assert!(update(&m, &p, &v, &h, "test").is_err());
        assert!(update_sqrt(&m, &p, &v, &h, "test").is_err());
    }

    #[test]
    fn test_predict_forms_agree() {
        let (a, q) = iwp_transition(1, 0.1);
        let m = DVector::from_row_slice(&[1.0, 2.0]);
        let p = DMatrix::from_row_slice(2, 2, &[0.5, 0.1, 0.1, 0.3]);

        let (m_full, p_full) = predict(&m, &p, &a, &q);
        let lp = psd_factor(&p).unwrap();
        let lq = psd_factor(&q).unwrap();
        let (m_sqrt, lp_new) = predict_sqrt(&m, &lp, &a, &lq);

        assert!((m_full.clone() - m_sqrt).norm() < 1e-12);
        assert!((&lp_new * lp_new.transpose() - p_full).norm() < 1e-12);
    }
}
