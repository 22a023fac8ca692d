// src/mc/engine.rs
use crate::brownian::BrownianApprox;
use crate::error::{validation::*, SdeResult};
use crate::models::model::SDEModel;
use crate::ode_solvers::{OdeIntegrator, OdeSolver, State};
use crate::rng::SplitKey;
use crate::sde_solver::{sde_solver, SdeSolverConfig, SdeSolverOptions};
use ndarray::{Array1, Array2, Axis};
use rayon::prelude::*;
use statrs::statistics::Statistics;

/// Monte Carlo batch configuration
///
/// One batch runs the full SDE pipeline over `samples` independent keys.
/// Each sample is an identical, fully sequential solve; the batch is an
/// embarrassingly parallel map over the derived child keys, with no
/// cross-sample communication.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    pub samples: usize,
    pub seed: u64,
    /// Macro step size δ
    pub delta: f64,
    /// Macro step count N
    pub steps: usize,
    /// Inner solver steps per macro step
    pub substeps: usize,
}

impl BatchConfig {
    /// Validate the batch configuration
    pub fn validate(&self) -> SdeResult<()> {
        validate_samples(self.samples)?;
        validate_positive("delta", self.delta)?;
        validate_finite("delta", self.delta)?;
        validate_steps("steps", self.steps)?;
        validate_steps("substeps", self.substeps)?;
        Ok(())
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        BatchConfig {
            samples: 10_000,
            seed: 1337,
            delta: 0.01,
            steps: 100,
            substeps: 1,
        }
    }
}

/// Terminal states of a Monte Carlo batch, one row per sample
///
/// The whole pipeline (key split, path sampling, inner solves) runs
/// independently per sample on a rayon worker; sample `i` always uses child
/// key `i` of the batch seed, so results are independent of the thread
/// count. Any sample failing aborts the batch with its error.
pub fn run_terminal_states<M, B>(
    cfg: &BatchConfig,
    model: &M,
    x0: &State,
    bm: &B,
    solver: &dyn OdeSolver,
) -> SdeResult<Array2<f64>>
where
    M: SDEModel + Sync,
    B: BrownianApprox + Sync,
{
    cfg.validate()?;
    let master = SplitKey::new(cfg.seed);
    let solver_cfg = SdeSolverConfig::new(cfg.delta, cfg.steps)
        .with_options(SdeSolverOptions::NONE);
    let ode_int = OdeIntegrator::new(solver, cfg.substeps);

    let rows: Vec<Vec<f64>> = (0..cfg.samples)
        .into_par_iter()
        .map(|i| {
            let key = master.child(i as u64);
            let path = sde_solver(&key, model, x0, bm, &solver_cfg, &ode_int)?;
            Ok(path
                .trajectory
                .last()
                .expect("trajectory is never empty")
                .mean()
                .iter()
                .copied()
                .collect())
        })
        .collect::<SdeResult<Vec<_>>>()?;

    let dim = x0.dim();
    let mut out = Array2::zeros((cfg.samples, dim));
    for (i, row) in rows.iter().enumerate() {
        for (j, &v) in row.iter().enumerate() {
            out[(i, j)] = v;
        }
    }
    Ok(out)
}

/// Componentwise empirical mean and sample standard deviation
pub fn terminal_moments(states: &Array2<f64>) -> (Array1<f64>, Array1<f64>) {
    let mean = states.mean_axis(Axis(0)).expect("non-empty batch");
    let std = states.std_axis(Axis(0), 1.0);
    (mean, std)
}

/// Mean and sample standard deviation of a single state component
pub fn component_stats(states: &Array2<f64>, component: usize) -> (f64, f64) {
    let column: Vec<f64> = states.column(component).iter().copied().collect();
    ((&column).mean(), (&column).std_dev())
}
