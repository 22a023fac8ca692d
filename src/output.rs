// src/output.rs
use crate::ode_solvers::State;
use std::fs::File;
use std::io::{self, Write};

/// Write a trajectory to CSV, one row per macro step
///
/// Columns: time, then the state mean components.
pub fn write_trajectory_to_csv(filename: &str, times: &[f64], trajectory: &[State]) -> io::Result<()> {
    let mut file = File::create(filename)?;
    let dim = trajectory.first().map(|s| s.dim()).unwrap_or(0);
    let header: Vec<String> = (0..dim).map(|i| format!("x{}", i)).collect();
    writeln!(file, "t,{}", header.join(","))?;
    for (t, state) in times.iter().zip(trajectory.iter()) {
        let row: Vec<String> = state.mean().iter().map(|v| v.to_string()).collect();
        writeln!(file, "{},{}", t, row.join(","))?;
    }
    Ok(())
}

/// Write (step size, error) pairs from a convergence sweep
pub fn write_convergence_to_csv(filename: &str, rows: &[(f64, f64)]) -> io::Result<()> {
    let mut file = File::create(filename)?;
    writeln!(file, "delta,error")?;
    for (delta, error) in rows {
        writeln!(file, "{},{}", delta, error)?;
    }
    Ok(())
}
