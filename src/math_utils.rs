// src/math_utils.rs
//! Shared numerical kernels for the filtering solvers
//!
//! All linear algebra is dense double precision via nalgebra. Single
//! precision degrades the filters' covariance estimates enough to break
//! convergence-order tests, so nothing here is generic over the scalar.

use crate::error::{SdeError, SdeResult};
use nalgebra::{DMatrix, DVector, SymmetricEigen};

/// Lower triangularization: returns lower-triangular `L` with `L Lᵀ = A Aᵀ`
///
/// Computed as the transposed R factor of the QR decomposition of `Aᵀ`.
/// Requires `A` to have at least as many columns as rows.
pub fn tria(a: &DMatrix<f64>) -> DMatrix<f64> {
    debug_assert!(a.ncols() >= a.nrows());
    let qr = a.transpose().qr();
    qr.r().transpose()
}

/// Factor a symmetric positive semi-definite matrix: `L Lᵀ = m`
///
/// Cholesky when the matrix is positive definite; a symmetric
/// eigendecomposition with small negative eigenvalues clamped to zero when it
/// is only semi-definite (e.g. an exact-zero initial covariance). Eigenvalues
/// below `-1e-9 * scale` mean the input is indefinite and the factorization
/// fails with a numerical-instability error.
pub fn psd_factor(m: &DMatrix<f64>) -> SdeResult<DMatrix<f64>> {
    if m.iter().all(|&x| x == 0.0) {
        return Ok(DMatrix::zeros(m.nrows(), m.ncols()));
    }
    if let Some(chol) = m.clone().cholesky() {
        return Ok(chol.l());
    }

    let scale = m.iter().fold(0.0f64, |acc, &x| acc.max(x.abs())).max(1.0);
    let eig = SymmetricEigen::new(m.clone());
    let mut sqrt_vals = DVector::zeros(eig.eigenvalues.len());
    for (i, &lambda) in eig.eigenvalues.iter().enumerate() {
        if lambda < -1e-9 * scale {
            return Err(SdeError::NumericalInstability {
                method: "psd_factor".to_string(),
                reason: format!("matrix is indefinite (eigenvalue {})", lambda),
            });
        }
        sqrt_vals[i] = lambda.max(0.0).sqrt();
    }
    let factor = &eig.eigenvectors * DMatrix::from_diagonal(&sqrt_vals);
    // Re-triangularize so downstream block concatenations stay lower form
    Ok(tria(&factor))
}

/// Cholesky factor of a positive definite matrix, failing loudly otherwise
pub fn cholesky(
    m: &DMatrix<f64>,
    method: &str,
) -> SdeResult<nalgebra::linalg::Cholesky<f64, nalgebra::Dynamic>> {
    m.clone().cholesky().ok_or_else(|| SdeError::NumericalInstability {
        method: method.to_string(),
        reason: "matrix is not positive definite".to_string(),
    })
}

/// Numeric Jacobian of `f` at `x` by central differences
pub fn numeric_jacobian<F>(f: F, x: &DVector<f64>) -> DMatrix<f64>
where
    F: Fn(&DVector<f64>) -> DVector<f64>,
{
    let n = x.len();
    let f0 = f(x);
    let m = f0.len();
    let mut jac = DMatrix::zeros(m, n);

    for j in 0..n {
        let h = 1e-6 * (1.0 + x[j].abs());
        let mut x_plus = x.clone();
        let mut x_minus = x.clone();
        x_plus[j] += h;
        x_minus[j] -= h;
        let df = (f(&x_plus) - f(&x_minus)) / (2.0 * h);
        jac.set_column(j, &df);
    }
    jac
}

/// Least-squares slope of `log(y)` regressed on `log(x)`
///
/// Used to estimate empirical convergence orders from (step size, error)
/// pairs. All inputs must be strictly positive.
pub fn log_log_slope(xs: &[f64], ys: &[f64]) -> f64 {
    assert_eq!(xs.len(), ys.len());
    assert!(xs.len() >= 2);

    let n = xs.len() as f64;
    let lx: Vec<f64> = xs.iter().map(|&x| x.ln()).collect();
    let ly: Vec<f64> = ys.iter().map(|&y| y.ln()).collect();
    let mean_x = lx.iter().sum::<f64>() / n;
    let mean_y = ly.iter().sum::<f64>() / n;

    let mut num = 0.0;
    let mut den = 0.0;
    for i in 0..xs.len() {
        num += (lx[i] - mean_x) * (ly[i] - mean_y);
        den += (lx[i] - mean_x) * (lx[i] - mean_x);
    }
    num / den
}

pub struct Timer {
    start_time: std::time::Instant,
}

impl Timer {
    pub fn new() -> Timer {
        Timer {
            start_time: std::time::Instant::now(),
        }
    }

    pub fn start(&mut self) {
        self.start_time = std::time::Instant::now();
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tria_reproduces_gram() {
        let a = DMatrix::from_row_slice(2, 4, &[1.0, 2.0, 0.5, -1.0, 0.0, 3.0, 1.0, 2.0]);
        let l = tria(&a);

        assert_eq!(l.nrows(), 2);
        assert_eq!(l.ncols(), 2);
        // strictly upper part is zero
        assert!(l[(0, 1)].abs() < 1e-12);

        let gram = &a * a.transpose();
        let reconstructed = &l * l.transpose();
        assert!((gram - reconstructed).norm() < 1e-10);
    }

    #[test]
    fn test_psd_factor_positive_definite() {
        let m = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 3.0]);
        let l = psd_factor(&m).unwrap();
        assert!((&l * l.transpose() - m).norm() < 1e-10);
    }

    #[test]
    fn test_psd_factor_singular() {
        // rank-1 PSD matrix, Cholesky alone would fail
        let v = DVector::from_row_slice(&[1.0, 2.0]);
        let m = &v * v.transpose();
        let l = psd_factor(&m).unwrap();
        assert!((&l * l.transpose() - m).norm() < 1e-8);
    }

    #[test]
    fn test_psd_factor_zero() {
        let m = DMatrix::zeros(3, 3);
        let l = psd_factor(&m).unwrap();
        assert_eq!(l, DMatrix::zeros(3, 3));
    }

    #[test]
    fn test_psd_factor_indefinite_fails() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, -1.0]);
        assert!(psd_factor(&m).is_err());
    }

    #[test]
    fn test_numeric_jacobian_linear() {
        let a = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, -0.5, 3.0]);
        let a2 = a.clone();
        let jac = numeric_jacobian(move |x| &a2 * x, &DVector::from_row_slice(&[0.3, -1.2]));
        assert!((jac - a).norm() < 1e-6);
    }

    #[test]
    fn test_log_log_slope_exact() {
        // y = c * x^2 on a log-log line
        let xs = [0.25, 0.125, 0.0625, 0.03125];
        let ys: Vec<f64> = xs.iter().map(|&x| 3.0 * x * x).collect();
        let slope = log_log_slope(&xs, &ys);
        assert!((slope - 2.0).abs() < 1e-10);
    }
}
