// scripts/benchmark.rs
use nalgebra::DVector;
use prob_sde::brownian::ParabolaFineApprox;
use prob_sde::math_utils::{log_log_slope, Timer};
use prob_sde::models::linear::LinearSde;
use prob_sde::ode_solvers::ekf::EkfSolver;
use prob_sde::ode_solvers::{OdeIntegrator, State};
use prob_sde::output::write_convergence_to_csv;
use prob_sde::rng::SplitKey;
use prob_sde::sde_solver::{sde_solver, SdeSolverConfig, SdeSolverOptions};
use rayon::prelude::*;
use std::env;

struct SystemInfo {
    os: String,
    cpu_cores: usize,
    rayon_threads: usize,
}

impl SystemInfo {
    fn gather() -> Self {
        SystemInfo {
            os: env::consts::OS.to_string(),
            cpu_cores: num_cpus::get(),
            rayon_threads: rayon::current_num_threads(),
        }
    }

    fn print(&self) {
        println!("OS:            {}", self.os);
        println!("CPU cores:     {}", self.cpu_cores);
        println!("Rayon threads: {}", self.rayon_threads);
    }
}

/// Mean maximal pathwise error of the EKF0 pipeline against its own fine
/// Euler-Maruyama reference, for one macro step count
fn pathwise_error(steps: usize, samples: usize) -> f64 {
    let model = LinearSde::integrated_bm();
    let x0 = State::Point(DVector::from_row_slice(&[1.0, 1.0]));
    let delta = 1.0 / steps as f64;
    let bm = ParabolaFineApprox::new(1, 4 * steps);
    let solver = EkfSolver::ekf0();
    let ode_int = OdeIntegrator::new(&solver, 2);
    let cfg = SdeSolverConfig::new(delta, steps)
        .with_options(SdeSolverOptions::KEEP_COEFFS | SdeSolverOptions::RUN_REFERENCE);
    let master = SplitKey::new(1337);

    let total: f64 = (0..samples)
        .into_par_iter()
        .map(|i| {
            let key = master.child(i as u64);
            let path = sde_solver(&key, &model, &x0, &bm, &cfg, &ode_int)
                .expect("benchmark configuration is valid");
            let reference = path.reference.as_ref().unwrap();
            path.trajectory
                .iter()
                .zip(reference.iter())
                .map(|(s, r)| (s.mean() - r).norm())
                .fold(0.0f64, f64::max)
        })
        .sum();
    total / samples as f64
}

fn main() {
    let samples: usize = env::args()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(200);

    println!("prob-sde convergence benchmark");
    println!("==============================");
    SystemInfo::gather().print();
    println!("Samples per step size: {}", samples);
    println!();

    let steps_list = [32, 64, 128, 256];
    let mut rows = Vec::new();
    let timer = Timer::new();

    for &steps in &steps_list {
        let step_timer = Timer::new();
        let error = pathwise_error(steps, samples);
        let delta = 1.0 / steps as f64;
        println!(
            "delta = 1/{:<4}  error = {:.6e}  ({:.1} ms)",
            steps,
            error,
            step_timer.elapsed_ms()
        );
        rows.push((delta, error));
    }

    let deltas: Vec<f64> = rows.iter().map(|r| r.0).collect();
    let errors: Vec<f64> = rows.iter().map(|r| r.1).collect();
    println!();
    println!("Empirical strong order: {:.3}", log_log_slope(&deltas, &errors));
    println!("Total time: {:.1} ms", timer.elapsed_ms());

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let filename = format!("convergence_{}.csv", timestamp);
    match write_convergence_to_csv(&filename, &rows) {
        Ok(()) => println!("Results written to {}", filename),
        Err(e) => eprintln!("Failed to write {}: {}", filename, e),
    }
}
