// src/ode_solvers/euler.rs
//! Explicit Euler Scheme for ODE Integration
//!
//! # Mathematical Framework
//!
//! First-order explicit stepping for `x' = f(x, t)`:
//! ```text
//! x_{k+1} = x_k + h·f(x_k, k·h)
//! ```
//!
//! Deterministic; the random key in the solver contract is ignored.
//!
//! # Convergence Properties
//!
//! - **Global order**: 1.0 in step size
//! - **Cost**: one vector-field evaluation per step

use super::{OdeSolver, State, StateKind, VectorField};
use crate::error::{validation::*, SdeError, SdeResult};
use crate::rng::SplitKey;

/// Explicit Euler integrator over bare-vector states
pub struct Euler;

impl Euler {
    pub fn new() -> Self {
        Euler {}
    }
}

impl Default for Euler {
    fn default() -> Self {
        Euler::new()
    }
}

impl OdeSolver for Euler {
    fn name(&self) -> &'static str {
        "euler"
    }

    fn expects(&self) -> StateKind {
        StateKind::Point
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

        let mut x = match init {
            State::Point(x) => x.clone(),
            other => {
                return Err(SdeError::UnsupportedState {
                    solver: self.name().to_string(),
                    expected: StateKind::Point.to_string(),
                    found: other.kind().to_string(),
                })
            }
        };

        let mut trajectory = Vec::with_capacity(n + 1);
        trajectory.push(State::Point(x.clone()));

        for k in 0..n {
            let t = k as f64 * h;
            x += vector_field.eval(&x, t) * h;
            trajectory.push(State::Point(x.clone()));
        }

        Ok(trajectory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ode_solvers::FnVectorField;
    use nalgebra::DVector;

    #[test]
    fn test_exponential_growth() {
        let vf = FnVectorField(|x: &DVector<f64>, _t: f64| x.clone());
        let init = State::Point(DVector::from_row_slice(&[1.0]));

        let traj = Euler.solve(None, &init, &vf, 1e-3, 1000).unwrap();
        assert_eq!(traj.len(), 1001);

        let terminal = traj.last().unwrap().mean()[0];
        assert!(
            (terminal - std::f64::consts::E).abs() < 5e-3,
            "Euler terminal {} should approximate e",
            terminal
        );
    }

    #[test]
    fn test_rejects_gaussian_state() {
        use nalgebra::DMatrix;
        let vf = FnVectorField(|x: &DVector<f64>, _t: f64| x.clone());
        let init = State::Gaussian {
            mean: DVector::zeros(1),
            cov: DMatrix::zeros(1, 1),
        };
        assert!(Euler.solve(None, &init, &vf, 0.1, 10).is_err());
    }

    #[test]
    fn test_rejects_bad_step() {
        let vf = FnVectorField(|x: &DVector<f64>, _t: f64| x.clone());
        let init = State::Point(DVector::zeros(1));
        assert!(Euler.solve(None, &init, &vf, 0.0, 10).is_err());
        assert!(Euler.solve(None, &init, &vf, 0.1, 0).is_err());
    }
}
