// src/error.rs
use std::fmt;

/// Custom error types for the prob-sde library
#[derive(Debug, Clone)]
pub enum SdeError {
    /// Invalid parameter values
    InvalidParameters {
        parameter: String,
        value: f64,
        constraint: String,
    },

    /// Numerical instability or convergence failure
    NumericalInstability { method: String, reason: String },

    /// Drift/diffusion output dimensions inconsistent with the state
    DimensionMismatch {
        object: String,
        expected: String,
        found: String,
    },

    /// Invalid configuration
    InvalidConfiguration { field: String, reason: String },

    /// Solver given a state kind it does not support
    UnsupportedState {
        solver: String,
        expected: String,
        found: String,
    },
}

impl fmt::Display for SdeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SdeError::InvalidParameters {
                parameter,
                value,
                constraint,
            } => {
                write!(
                    f,
                    "Invalid parameter '{}' = {}: {}",
                    parameter, value, constraint
                )
            }
            SdeError::NumericalInstability { method, reason } => {
                write!(f, "Numerical instability in {}: {}", method, reason)
            }
            SdeError::DimensionMismatch {
                object,
                expected,
                found,
            } => {
                write!(
                    f,
                    "Dimension mismatch for {}: expected {}, found {}",
                    object, expected, found
                )
            }
            SdeError::InvalidConfiguration { field, reason } => {
                write!(f, "Invalid configuration for '{}': {}", field, reason)
            }
            SdeError::UnsupportedState {
                solver,
                expected,
                found,
            } => {
                write!(
                    f,
                    "Solver '{}' expects a {} state, got {}",
                    solver, expected, found
                )
            }
        }
    }
}

impl std::error::Error for SdeError {}

/// Result type alias for prob-sde operations
pub type SdeResult<T> = Result<T, SdeError>;

/// Validation utilities
pub mod validation {
    use super::{SdeError, SdeResult};

    /// Validate that a parameter is positive
    pub fn validate_positive(name: &str, value: f64) -> SdeResult<()> {
        if value <= 0.0 {
            Err(SdeError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be positive (> 0)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate that a value is finite and not NaN
    pub fn validate_finite(name: &str, value: f64) -> SdeResult<()> {
        if !value.is_finite() {
            Err(SdeError::InvalidParameters {
                parameter: name.to_string(),
                value,
                constraint: "must be finite (not NaN or infinite)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate samples count
    pub fn validate_samples(samples: usize) -> SdeResult<()> {
        if samples == 0 {
            Err(SdeError::InvalidConfiguration {
                field: "samples".to_string(),
                reason: "must be greater than 0".to_string(),
            })
        } else if samples > 1_000_000_000 {
            Err(SdeError::InvalidConfiguration {
                field: "samples".to_string(),
                reason: "exceeds maximum allowed (1 billion)".to_string(),
            })
        } else {
            Ok(())
        }
    }

    /// Validate steps count
    pub fn validate_steps(field: &str, steps: usize) -> SdeResult<()> {
        if steps == 0 {
            Err(SdeError::InvalidConfiguration {
                field: field.to_string(),
                reason: "must be greater than 0".to_string(),
            })
        } else if steps > 100_000_000 {
            Err(SdeError::InvalidConfiguration {
                field: field.to_string(),
                reason: "exceeds maximum allowed (100 million)".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::validation::*;
    use super::*;

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive("delta", 0.2).is_ok());
        assert!(validate_positive("delta", 0.0).is_err());
        assert!(validate_positive("delta", -0.1).is_err());
    }

    #[test]
    fn test_validate_finite() {
        assert!(validate_finite("value", 1.0).is_ok());
        assert!(validate_finite("value", f64::NAN).is_err());
        assert!(validate_finite("value", f64::INFINITY).is_err());
        assert!(validate_finite("value", f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn test_validate_steps() {
        assert!(validate_steps("steps", 100).is_ok());
        assert!(validate_steps("steps", 0).is_err());
    }

    #[test]
    fn test_error_display() {
        let error = SdeError::DimensionMismatch {
            object: "drift output".to_string(),
            expected: "2".to_string(),
            found: "3".to_string(),
        };

        let display = format!("{}", error);
        assert!(display.contains("drift output"));
        assert!(display.contains("expected 2"));
        assert!(display.contains("found 3"));
    }

    #[test]
    fn test_unsupported_state_display() {
        let error = SdeError::UnsupportedState {
            solver: "ekf0_2".to_string(),
            expected: "mean/covariance".to_string(),
            found: "bare vector".to_string(),
        };

        let display = format!("{}", error);
        assert!(display.contains("ekf0_2"));
        assert!(display.contains("mean/covariance"));
    }
}
