// demos/demo.rs
//
// End-to-end demo: geometric Brownian motion solved with the EKF1 filtering
// pipeline, terminal moments compared against the closed-form lognormal
// values.
use nalgebra::DVector;
use prob_sde::analytics::moments::{gbm_terminal_mean, gbm_terminal_std};
use prob_sde::brownian::ParabolaApprox;
use prob_sde::calculus::to_stratonovich;
use prob_sde::mc::engine::{component_stats, run_terminal_states, BatchConfig};
use prob_sde::models::gbm::Gbm;
use prob_sde::ode_solvers::ekf::EkfSolver;
use prob_sde::ode_solvers::{OdeIntegrator, State};
use prob_sde::output::write_trajectory_to_csv;
use prob_sde::rng::SplitKey;
use prob_sde::sde_solver::{sde_solver, SdeSolverConfig};

fn main() {
    let mu = 1.0;
    let sigma = 1.0;
    let x0_val = 1.0;

    let model = to_stratonovich(Gbm::new(mu, sigma, 1));
    let x0 = State::Point(DVector::from_element(1, x0_val));
    let bm = ParabolaApprox::new(1);

    let cfg = BatchConfig {
        samples: 50_000,
        seed: 1337,
        delta: 0.01,
        steps: 100,
        substeps: 4,
    };

    println!("Solving GBM (mu = {}, sigma = {}) over [0, 1]", mu, sigma);
    println!(
        "{} sample paths, delta = {}, {} inner EKF1 steps per macro step",
        cfg.samples, cfg.delta, cfg.substeps
    );

    let states = run_terminal_states(&cfg, &model, &x0, &bm, &EkfSolver::ekf1())
        .expect("valid configuration");
    let (mean, std) = component_stats(&states, 0);

    let exact_mean = gbm_terminal_mean(x0_val, mu, 1.0);
    let exact_std = gbm_terminal_std(x0_val, mu, sigma, 1.0);

    println!();
    println!("                 empirical      closed form");
    println!("terminal mean    {:<12.6}   {:<12.6}", mean, exact_mean);
    println!("terminal std     {:<12.6}   {:<12.6}", std, exact_std);
    println!();
    println!(
        "relative errors: mean {:.3}%, std {:.3}%",
        100.0 * (mean - exact_mean).abs() / exact_mean,
        100.0 * (std - exact_std).abs() / exact_std
    );

    // export one sample path for plotting
    let solver = EkfSolver::ekf1();
    let ode_int = OdeIntegrator::new(&solver, cfg.substeps);
    let path_cfg = SdeSolverConfig::new(cfg.delta, cfg.steps);
    let path = sde_solver(&SplitKey::new(cfg.seed), &model, &x0, &bm, &path_cfg, &ode_int)
        .expect("valid configuration");
    match write_trajectory_to_csv("gbm_path.csv", &path.times, &path.trajectory) {
        Ok(()) => println!("Sample path written to gbm_path.csv"),
        Err(e) => eprintln!("Failed to write gbm_path.csv: {}", e),
    }
}
