// src/analytics/moments.rs
//! Closed-form moments used as ground truth in consistency checks
//!
//! # Mathematical Foundation
//!
//! Geometric Brownian motion `dX = μX dt + σX dW` has the lognormal solution
//! ```text
//! X_T = X_0 · exp((μ − σ²/2)T + σW_T)
//! ```
//! with terminal moments
//! ```text
//! E[X_T]   = X_0 · e^(μT)
//! Std[X_T] = X_0 · e^(μT) · √(e^(σ²T) − 1)
//! ```
//!
//! The Ornstein–Uhlenbeck process `dX = θ(μ − X) dt + σ dW` has
//! ```text
//! E[X_t]   = μ + (X_0 − μ)·e^(−θt)
//! Var[X_t] = σ²·(1 − e^(−2θt)) / (2θ)
//! ```

/// Terminal mean of geometric Brownian motion
pub fn gbm_terminal_mean(x0: f64, mu: f64, t: f64) -> f64 {
    x0 * (mu * t).exp()
}

/// Terminal standard deviation of geometric Brownian motion
pub fn gbm_terminal_std(x0: f64, mu: f64, sigma: f64, t: f64) -> f64 {
    x0 * (mu * t).exp() * ((sigma * sigma * t).exp() - 1.0).sqrt()
}

/// Mean of the Ornstein–Uhlenbeck process at time `t`
pub fn ou_mean(x0: f64, theta: f64, mu: f64, t: f64) -> f64 {
    mu + (x0 - mu) * (-theta * t).exp()
}

/// Variance of the Ornstein–Uhlenbeck process at time `t`
pub fn ou_variance(theta: f64, sigma: f64, t: f64) -> f64 {
    sigma * sigma * (1.0 - (-2.0 * theta * t).exp()) / (2.0 * theta)
}
