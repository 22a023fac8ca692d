// tests/solver_convergence_test.rs
//
// Pathwise convergence of the parabola-ODE method against a fine
// Euler-Maruyama reference driven by the same increments. The test SDE is
// the integrated Brownian motion system (linear drift, additive noise), for
// which the Stratonovich correction vanishes and the additive-noise
// reference is strong order 1 in its own step size, so the reference error
// is negligible at the chosen sub-partition.
use nalgebra::DVector;
use prob_sde::brownian::ParabolaFineApprox;
use prob_sde::math_utils::log_log_slope;
use prob_sde::models::linear::LinearSde;
use prob_sde::ode_solvers::ekf::EkfSolver;
use prob_sde::ode_solvers::euler::Euler;
use prob_sde::ode_solvers::{OdeIntegrator, OdeSolver, State};
use prob_sde::rng::SplitKey;
use prob_sde::sde_solver::{sde_solver, SdeSolverConfig, SdeSolverOptions};

/// Mean over sample paths of the maximal pathwise error on the macro grid
fn pathwise_errors(
    solver: &dyn OdeSolver,
    substeps_for: impl Fn(usize) -> usize,
    steps_list: &[usize],
    samples: usize,
) -> Vec<f64> {
    let model = LinearSde::integrated_bm();
    let x0 = State::Point(DVector::from_row_slice(&[1.0, 1.0]));
    let master = SplitKey::new(1337);

    steps_list
        .iter()
        .map(|&steps| {
            let delta = 1.0 / steps as f64;
            // reference micro-step delta/(4·steps) = δ²/4
            let bm = ParabolaFineApprox::new(1, 4 * steps);
            let ode_int = OdeIntegrator::new(solver, substeps_for(steps));
            let cfg = SdeSolverConfig::new(delta, steps)
                .with_options(SdeSolverOptions::KEEP_COEFFS | SdeSolverOptions::RUN_REFERENCE);

            let mut total = 0.0;
            for key in master.split(samples) {
                let path = sde_solver(&key, &model, &x0, &bm, &cfg, &ode_int).unwrap();
                let reference = path.reference.as_ref().unwrap();

                let mut max_err = 0.0f64;
                for (state, ref_state) in path.trajectory.iter().zip(reference.iter()) {
                    max_err = max_err.max((state.mean() - ref_state).norm());
                }
                total += max_err;
            }
            total / samples as f64
        })
        .collect()
}

#[test]
fn test_euler_inner_strong_convergence() {
    let steps_list = [8, 16, 32, 64];
    let deltas: Vec<f64> = steps_list.iter().map(|&n| 1.0 / n as f64).collect();

    // the explicit inner integrator needs ~1/δ substeps to resolve the
    // polynomial derivative without degrading the macro order
    let errors = pathwise_errors(&Euler::new(), |steps| steps, &steps_list, 100);

    println!("\nEuler inner pathwise errors: {:?}", errors);
    for i in 0..errors.len() - 1 {
        assert!(
            errors[i] > errors[i + 1],
            "pathwise error did not decrease at step {}: {:?}",
            i,
            errors
        );
    }

    let slope = log_log_slope(&deltas, &errors);
    assert!(
        slope > 0.7 && slope < 1.4,
        "strong convergence order should be ≈ 1, regression slope was {}",
        slope
    );
}

#[test]
fn test_ekf0_inner_strong_convergence() {
    let steps_list = [8, 16, 32, 64];
    let deltas: Vec<f64> = steps_list.iter().map(|&n| 1.0 / n as f64).collect();

    // the filter's endpoint update integrates the (linear-in-time)
    // polynomial derivative exactly, so a couple of substeps suffice
    let errors = pathwise_errors(&EkfSolver::ekf0(), |_| 2, &steps_list, 100);

    println!("\nEKF0 inner pathwise errors: {:?}", errors);
    for i in 0..errors.len() - 1 {
        assert!(
            errors[i] > errors[i + 1],
            "pathwise error did not decrease at step {}: {:?}",
            i,
            errors
        );
    }

    let slope = log_log_slope(&deltas, &errors);
    assert!(
        slope > 0.7 && slope < 1.4,
        "strong convergence order should be ≈ 1, regression slope was {}",
        slope
    );
}
