// tests/sqrt_form_test.rs
//
// The square-root (Cholesky-factor) filter form and the plain covariance
// form are claimed equivalent; verify it numerically across the full SDE
// pipeline rather than assuming it.
use nalgebra::{DMatrix, DVector};
use prob_sde::brownian::ParabolaApprox;
use prob_sde::calculus::to_stratonovich;
use prob_sde::models::gbm::Gbm;
use prob_sde::ode_solvers::ekf::EkfSolver;
use prob_sde::ode_solvers::{OdeIntegrator, State};
use prob_sde::rng::SplitKey;
use prob_sde::sde_solver::{sde_solver, SdeSolverConfig};

fn run_pipeline(sqrt_form: bool, linearize_first_order: bool) -> Vec<State> {
    let model = to_stratonovich(Gbm::new(0.5, 0.4, 2));
    let x0 = State::Gaussian {
        mean: DVector::from_row_slice(&[1.0, 2.0]),
        cov: DMatrix::zeros(2, 2),
    };
    let bm = ParabolaApprox::new(2);
    let solver = if linearize_first_order {
        EkfSolver::ekf1_2().with_sqrt(sqrt_form)
    } else {
        EkfSolver::ekf0_2().with_sqrt(sqrt_form)
    };
    let ode_int = OdeIntegrator::new(&solver, 4);
    let cfg = SdeSolverConfig::new(0.05, 20);

    sde_solver(&SplitKey::new(2024), &model, &x0, &bm, &cfg, &ode_int)
        .unwrap()
        .trajectory
}

fn assert_trajectories_agree(plain: &[State], sqrt: &[State]) {
    for (sp, ss) in plain.iter().zip(sqrt.iter()) {
        match (sp, ss) {
            (State::Gaussian { mean: mp, cov: pp }, State::Gaussian { mean: ms, cov: ps }) => {
                assert!(
                    (mp - ms).norm() < 1e-8,
                    "means diverged: {} vs {}",
                    mp,
                    ms
                );
                assert!(
                    (pp - ps).norm() < 1e-8,
                    "covariances diverged by {}",
                    (pp - ps).norm()
                );
                // the invariant both forms must preserve
                assert!(pp.clone().symmetric_eigen().eigenvalues.iter().all(|&l| l > -1e-10));
            }
            _ => panic!("expected Gaussian states"),
        }
    }
}

#[test]
fn test_sqrt_form_matches_plain_ekf1_2() {
    let plain = run_pipeline(false, true);
    let sqrt = run_pipeline(true, true);
    assert_eq!(plain.len(), sqrt.len());
    assert_trajectories_agree(&plain, &sqrt);
}

#[test]
fn test_sqrt_form_matches_plain_ekf0_2() {
    let plain = run_pipeline(false, false);
    let sqrt = run_pipeline(true, false);
    assert_trajectories_agree(&plain, &sqrt);
}
