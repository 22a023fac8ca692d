// src/ode_solvers/mod.rs
//! Inner ODE/Filtering Solvers
//!
//! All inner solvers share one calling convention: given an optional random
//! key, an initial state, a vector field, a step size `h` and a step count
//! `n`, produce the full trajectory of `n + 1` states (initial state
//! prepended). The SDE driver only consumes the terminal state, but the full
//! trajectory is part of the contract for offline inspection.
//!
//! The state is a sum type over the two supported kinds: a bare vector for
//! ordinary ODE integration, or a mean/covariance pair when the solver is a
//! filter. Which kind a solver expects is part of its signature and is
//! checked at setup, not deep inside the step loop.

pub mod ekf;
pub mod euler;
pub mod prior;

use crate::error::{SdeError, SdeResult};
use crate::math_utils::numeric_jacobian;
use crate::rng::SplitKey;
use nalgebra::{DMatrix, DVector};
use std::fmt;

/// Solver state: bare vector, or Gaussian mean/covariance pair
///
/// Invariant: `cov`, when present, is symmetric positive semi-definite.
#[derive(Debug, Clone)]
pub enum State {
    Point(DVector<f64>),
    Gaussian {
        mean: DVector<f64>,
        cov: DMatrix<f64>,
    },
}

impl State {
    pub fn kind(&self) -> StateKind {
        match self {
            State::Point(_) => StateKind::Point,
            State::Gaussian { .. } => StateKind::Gaussian,
        }
    }

    pub fn mean(&self) -> &DVector<f64> {
        match self {
            State::Point(x) => x,
            State::Gaussian { mean, .. } => mean,
        }
    }

    pub fn dim(&self) -> usize {
        self.mean().len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKind {
    Point,
    Gaussian,
}

impl fmt::Display for StateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateKind::Point => write!(f, "bare vector"),
            StateKind::Gaussian => write!(f, "mean/covariance"),
        }
    }
}

/// A time-dependent vector field `(x, t) -> dx/dt`
pub trait VectorField {
    fn eval(&self, x: &DVector<f64>, t: f64) -> DVector<f64>;

    /// State Jacobian `∂f/∂x`, central differences unless overridden
    fn jacobian(&self, x: &DVector<f64>, t: f64) -> DMatrix<f64> {
        numeric_jacobian(|y| self.eval(y, t), x)
    }
}

/// Adapter turning a plain closure into a [`VectorField`]
pub struct FnVectorField<F>(pub F);

impl<F> VectorField for FnVectorField<F>
where
    F: Fn(&DVector<f64>, f64) -> DVector<f64>,
{
    fn eval(&self, x: &DVector<f64>, t: f64) -> DVector<f64> {
        (self.0)(x, t)
    }
}

/// Shared contract of the inner solvers
///
/// The key is unused by the deterministic solvers in this crate but is part
/// of the calling convention so sampling-based solvers fit the same slot.
/// Solvers are shared across rayon workers during Monte Carlo batches,
/// hence the `Sync` bound.
pub trait OdeSolver: Sync {
    fn name(&self) -> &'static str;

    /// Which state kind this solver accepts and produces
    fn expects(&self) -> StateKind;

    fn solve(
        &self,
        key: Option<&SplitKey>,
        init: &State,
        vector_field: &dyn VectorField,
        h: f64,
        n: usize,
    ) -> SdeResult<Vec<State>>;
}

/// An inner solver plus its substep count, as used by the SDE driver
///
/// One macro step of length `T` is integrated with `substeps` solver steps
/// of size `T / substeps`.
pub struct OdeIntegrator<'a> {
    solver: &'a dyn OdeSolver,
    substeps: usize,
}

impl<'a> OdeIntegrator<'a> {
    pub fn new(solver: &'a dyn OdeSolver, substeps: usize) -> Self {
        OdeIntegrator { solver, substeps }
    }

    pub fn expects(&self) -> StateKind {
        self.solver.expects()
    }

    pub fn solver_name(&self) -> &'static str {
        self.solver.name()
    }

    pub fn substeps(&self) -> usize {
        self.substeps
    }

    /// Integrate over `[0, t_span]` and return the terminal state
    pub fn integrate(
        &self,
        key: Option<&SplitKey>,
        init: &State,
        vector_field: &dyn VectorField,
        t_span: f64,
    ) -> SdeResult<State> {
        let h = t_span / self.substeps as f64;
        let mut trajectory = self
            .solver
            .solve(key, init, vector_field, h, self.substeps)?;
        trajectory.pop().ok_or_else(|| SdeError::NumericalInstability {
            method: self.solver.name().to_string(),
            reason: "solver returned an empty trajectory".to_string(),
        })
    }
}
