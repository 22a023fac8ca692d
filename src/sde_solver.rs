// src/sde_solver.rs
//! SDE Stepping Driver
//!
//! # Algorithm
//!
//! For each macro step `k = 0..N-1` over `[k·δ, (k+1)·δ]`:
//!
//! 1. Split the step key into a path-sampling key and an inner-solver key.
//! 2. Sample polynomial path coefficients for the interval.
//! 3. Build the corrected vector field
//!    ```text
//!    F(x, t) = a(x, t + kδ) + b(x, t + kδ) · w̃'(t)
//!    ```
//!    where `w̃'` is the time derivative of the local path approximation —
//!    the deterministic field whose solution tracks the SDE path under the
//!    local approximation.
//! 4. Advance the state with the inner ODE integrator over `[0, δ]`.
//! 5. Record the new state and the step's coefficients.
//!
//! The per-step field is an explicit context struct ([`StepVectorField`])
//! rather than a closure, so no hidden mutable state crosses step
//! boundaries.
//!
//! # Shared Randomness
//!
//! The per-step coefficients are part of the output: downstream reference
//! solvers must be drivable by *exactly* the same randomness, which is what
//! makes pathwise (not just distributional) convergence comparisons
//! possible. With [`SdeSolverOptions::RUN_REFERENCE`] and a fine-grained
//! approximation, a piecewise Euler-Maruyama reference path is advanced
//! inside the loop from the same increments, avoiding retention of the full
//! fine noise history.
//!
//! The driver integrates in Stratonovich form (the polynomial substitution
//! obeys the ordinary chain rule); Itô-specified models should be converted
//! with [`crate::calculus::to_stratonovich`] first. The in-loop reference
//! integrates the same drift/diffusion in Itô form, which coincides for
//! additive noise.

use crate::brownian::{BrownianApprox, BrownianCoeffs};
use crate::error::{validation::*, SdeError, SdeResult};
use crate::models::model::SDEModel;
use crate::ode_solvers::{OdeIntegrator, State, VectorField};
use crate::rng::SplitKey;
use crate::solvers::euler_maruyama::euler_maruyama_piecewise;
use bitflags::bitflags;
use nalgebra::{DMatrix, DVector};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct SdeSolverOptions: u32 {
        const NONE           = 0;
        /// Record the per-step path coefficients in the output
        const KEEP_COEFFS    = 1 << 0;
        /// Advance a fine Euler-Maruyama reference path from the same
        /// increments (requires an approximation that carries increments)
        const RUN_REFERENCE  = 1 << 1;
    }
}

#[derive(Debug, Clone)]
pub struct SdeSolverConfig {
    /// Macro step size δ
    pub delta: f64,
    /// Macro step count N
    pub steps: usize,
    pub options: SdeSolverOptions,
}

impl SdeSolverConfig {
    pub fn new(delta: f64, steps: usize) -> Self {
        SdeSolverConfig {
            delta,
            steps,
            options: SdeSolverOptions::KEEP_COEFFS,
        }
    }

    pub fn with_options(mut self, options: SdeSolverOptions) -> Self {
        self.options = options;
        self
    }

    pub fn validate(&self) -> SdeResult<()> {
        validate_positive("delta", self.delta)?;
        validate_finite("delta", self.delta)?;
        validate_steps("steps", self.steps)?;
        Ok(())
    }
}

/// The corrected vector field for one macro step
///
/// Closes over nothing: the model, the approximation scheme, one set of
/// coefficients and the time offset are all held by value or shared
/// reference, scoped to a single macro step.
pub struct StepVectorField<'a, M: SDEModel, B: BrownianApprox> {
    model: &'a M,
    bm: &'a B,
    coeffs: &'a BrownianCoeffs,
    t_offset: f64,
    delta: f64,
}

impl<'a, M: SDEModel, B: BrownianApprox> StepVectorField<'a, M, B> {
    pub fn new(
        model: &'a M,
        bm: &'a B,
        coeffs: &'a BrownianCoeffs,
        t_offset: f64,
        delta: f64,
    ) -> Self {
        StepVectorField {
            model,
            bm,
            coeffs,
            t_offset,
            delta,
        }
    }
}

impl<'a, M: SDEModel, B: BrownianApprox> VectorField for StepVectorField<'a, M, B> {
    fn eval(&self, x: &DVector<f64>, t: f64) -> DVector<f64> {
        let shifted = t + self.t_offset;
        self.model.drift(x, shifted)
            + self.model.diffusion(x, shifted) * self.bm.derivative(t, self.delta, self.coeffs)
    }
}

/// Output of one SDE solve
#[derive(Debug, Clone)]
pub struct SdePath {
    /// `0, δ, 2δ, ..., Nδ`
    pub times: Vec<f64>,
    /// `N + 1` states, `trajectory[0]` is the initial condition
    pub trajectory: Vec<State>,
    /// Per-step path coefficients (empty unless `KEEP_COEFFS`)
    pub coeffs: Vec<BrownianCoeffs>,
    /// Macro-grid reference trajectory (with `RUN_REFERENCE`)
    pub reference: Option<Vec<DVector<f64>>>,
}

/// Shape and configuration checks, before the stepping loop begins
fn validate_setup<M: SDEModel, B: BrownianApprox>(
    model: &M,
    x0: &State,
    bm: &B,
    cfg: &SdeSolverConfig,
    ode_int: &OdeIntegrator,
) -> SdeResult<()> {
    cfg.validate()?;
    validate_steps("substeps", ode_int.substeps())?;

    if x0.kind() != ode_int.expects() {
        return Err(SdeError::UnsupportedState {
            solver: ode_int.solver_name().to_string(),
            expected: ode_int.expects().to_string(),
            found: x0.kind().to_string(),
        });
    }

    let x = x0.mean();
    let d = x.len();
    let drift = model.drift(x, 0.0);
    if drift.len() != d {
        return Err(SdeError::DimensionMismatch {
            object: "drift output".to_string(),
            expected: format!("{}", d),
            found: format!("{}", drift.len()),
        });
    }
    let sigma = model.diffusion(x, 0.0);
    if sigma.nrows() != d || sigma.ncols() != bm.noise_dim() {
        return Err(SdeError::DimensionMismatch {
            object: "diffusion output".to_string(),
            expected: format!("{} x {}", d, bm.noise_dim()),
            found: format!("{} x {}", sigma.nrows(), sigma.ncols()),
        });
    }

    if cfg.options.contains(SdeSolverOptions::RUN_REFERENCE) && !bm.has_increments() {
        return Err(SdeError::InvalidConfiguration {
            field: "options".to_string(),
            reason: "RUN_REFERENCE requires a path approximation that carries increments"
                .to_string(),
        });
    }

    Ok(())
}

/// Solve an SDE over `[0, N·δ]` with a probabilistic inner integrator
pub fn sde_solver<M: SDEModel, B: BrownianApprox>(
    key: &SplitKey,
    model: &M,
    x0: &State,
    bm: &B,
    cfg: &SdeSolverConfig,
    ode_int: &OdeIntegrator,
) -> SdeResult<SdePath> {
    validate_setup(model, x0, bm, cfg, ode_int)?;

    let n = cfg.steps;
    let delta = cfg.delta;
    let keep_coeffs = cfg.options.contains(SdeSolverOptions::KEEP_COEFFS);
    let run_reference = cfg.options.contains(SdeSolverOptions::RUN_REFERENCE);

    let step_keys = key.split(n);

    let mut trajectory = Vec::with_capacity(n + 1);
    trajectory.push(x0.clone());
    let mut coeffs_out = Vec::with_capacity(if keep_coeffs { n } else { 0 });
    let mut reference = if run_reference {
        let mut r = Vec::with_capacity(n + 1);
        r.push(x0.mean().clone());
        Some(r)
    } else {
        None
    };

    let mut state = x0.clone();
    for (k, step_key) in step_keys.iter().enumerate() {
        let t_k = k as f64 * delta;
        let (bm_key, solver_key) = step_key.pair();

        let coeffs = bm.sample(&bm_key, delta)?;
        let field = StepVectorField::new(model, bm, &coeffs, t_k, delta);
        state = ode_int.integrate(Some(&solver_key), &state, &field, delta)?;
        trajectory.push(state.clone());

        if let Some(ref mut reference) = reference {
            let increments = coeffs.increments.as_ref().ok_or_else(|| {
                SdeError::InvalidConfiguration {
                    field: "options".to_string(),
                    reason: "sampled coefficients carry no increments".to_string(),
                }
            })?;
            let fine = increments.nrows();
            let h_fine = delta / fine as f64;
            let (_, ref_path) = euler_maruyama_piecewise(
                increments,
                reference.last().unwrap(),
                model,
                t_k,
                h_fine,
                fine,
            )?;
            reference.push(ref_path.last().unwrap().clone());
        }

        if keep_coeffs {
            coeffs_out.push(coeffs);
        }
    }

    let times = (0..=n).map(|k| k as f64 * delta).collect();

    Ok(SdePath {
        times,
        trajectory,
        coeffs: coeffs_out,
        reference,
    })
}

/// Reconstruct the concatenated fine increment matrix from recorded
/// coefficients, for driving an external reference solver
pub fn concat_increments(coeffs: &[BrownianCoeffs]) -> SdeResult<DMatrix<f64>> {
    let first = coeffs
        .first()
        .and_then(|c| c.increments.as_ref())
        .ok_or_else(|| SdeError::InvalidConfiguration {
            field: "coeffs".to_string(),
            reason: "no increments recorded".to_string(),
        })?;
    let fine = first.nrows();
    let dim = first.ncols();

    let mut all = DMatrix::zeros(fine * coeffs.len(), dim);
    for (k, c) in coeffs.iter().enumerate() {
        let inc = c.increments.as_ref().ok_or_else(|| SdeError::InvalidConfiguration {
            field: "coeffs".to_string(),
            reason: format!("step {} carries no increments", k),
        })?;
        all.slice_mut((k * fine, 0), (fine, dim)).copy_from(inc);
    }
    Ok(all)
}
